//! Pure reducers, one module per entity slice.
//!
//! Every reducer takes the previous `Arc` of its slice and returns either the
//! very same `Arc` (nothing changed) or a freshly built one. Consumers rely on
//! `Arc::ptr_eq` for cheap change detection, so a reducer must never hand back
//! a new allocation for an unchanged slice.

pub mod channels;
pub mod emojis;
pub mod errors;
pub mod jobs;
pub mod posts;
pub mod requests;
pub mod roles;
pub mod search;
pub mod teams;
pub mod users;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tracing::debug;

use crate::action::Action;
use crate::state::{EntitiesState, GlobalState};

/// Root reducer.
pub fn reduce(state: &Arc<GlobalState>, action: &Action) -> Arc<GlobalState> {
    match action {
        Action::Batch(actions) => return reduce_all(state, actions),
        Action::Completed { op, seq, actions } => {
            if !state.requests.is_current(*op, *seq) {
                debug!(%op, seq, "dropping completion from before logout");
                return Arc::clone(state);
            }
            return reduce_all(state, actions);
        }
        _ => {}
    }

    let entities = reduce_entities(&state.entities, action);
    let errors = errors::reduce(&state.errors, action);
    let requests = requests::reduce(&state.requests, action);

    if Arc::ptr_eq(&entities, &state.entities)
        && Arc::ptr_eq(&errors, &state.errors)
        && Arc::ptr_eq(&requests, &state.requests)
    {
        return Arc::clone(state);
    }

    Arc::new(GlobalState {
        entities,
        errors,
        requests,
    })
}

fn reduce_all(state: &Arc<GlobalState>, actions: &[Action]) -> Arc<GlobalState> {
    actions
        .iter()
        .fold(Arc::clone(state), |acc, a| reduce(&acc, a))
}

fn reduce_entities(state: &Arc<EntitiesState>, action: &Action) -> Arc<EntitiesState> {
    let next = EntitiesState {
        users: users::reduce(&state.users, action),
        teams: teams::reduce(&state.teams, action),
        channels: channels::reduce(&state.channels, action),
        posts: posts::reduce(&state.posts, action),
        roles: roles::reduce(&state.roles, action),
        jobs: jobs::reduce(&state.jobs, action),
        emojis: emojis::reduce(&state.emojis, action),
        search: search::reduce(&state.search, action),
    };

    if Arc::ptr_eq(&next.users, &state.users)
        && Arc::ptr_eq(&next.teams, &state.teams)
        && Arc::ptr_eq(&next.channels, &state.channels)
        && Arc::ptr_eq(&next.posts, &state.posts)
        && Arc::ptr_eq(&next.roles, &state.roles)
        && Arc::ptr_eq(&next.jobs, &state.jobs)
        && Arc::ptr_eq(&next.emojis, &state.emojis)
        && Arc::ptr_eq(&next.search, &state.search)
    {
        return Arc::clone(state);
    }

    Arc::new(next)
}

// ---------------------------------------------------------------------------
// Copy-on-write map helpers
// ---------------------------------------------------------------------------

/// Copy of `map` with `key` set to `value`, or `map` itself when it already
/// holds an equal value under `key`.
pub(crate) fn with_entry<K, V>(map: &Arc<HashMap<K, V>>, key: K, value: V) -> Arc<HashMap<K, V>>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
{
    if map.get(&key) == Some(&value) {
        return Arc::clone(map);
    }
    let mut next = (**map).clone();
    next.insert(key, value);
    Arc::new(next)
}

/// Copy of `map` without `key`, or `map` itself when the key is absent.
pub(crate) fn without_entry<K, V>(map: &Arc<HashMap<K, V>>, key: &K) -> Arc<HashMap<K, V>>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    if !map.contains_key(key) {
        return Arc::clone(map);
    }
    let mut next = (**map).clone();
    next.remove(key);
    Arc::new(next)
}

/// Copy of `map` with every value in `values` inserted under `key_of(value)`.
/// Returns `map` itself when every value is already stored as is.
pub(crate) fn with_entries<K, V, I, F>(map: &Arc<HashMap<K, V>>, values: I, key_of: F) -> Arc<HashMap<K, V>>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
    I: IntoIterator<Item = V>,
    F: Fn(&V) -> K,
{
    let mut next: Option<HashMap<K, V>> = None;
    for value in values {
        let key = key_of(&value);
        let current = next.as_ref().map_or(&**map, |n| n);
        if current.get(&key) == Some(&value) {
            continue;
        }
        next.get_or_insert_with(|| (**map).clone()).insert(key, value);
    }
    next.map_or_else(|| Arc::clone(map), Arc::new)
}

/// Apply `f` to the entry under `key`. Returns `map` unchanged when the key is
/// missing or `f` leaves the value equal to what it was.
pub(crate) fn update_entry<K, V, F>(map: &Arc<HashMap<K, V>>, key: &K, f: F) -> Arc<HashMap<K, V>>
where
    K: Eq + Hash + Clone,
    V: Clone + PartialEq,
    F: FnOnce(&V) -> V,
{
    let Some(current) = map.get(key) else {
        return Arc::clone(map);
    };
    let updated = f(current);
    if &updated == current {
        return Arc::clone(map);
    }
    with_entry(map, key.clone(), updated)
}

/// Empty replacement for a slice on logout, reusing `current` when it is
/// already empty.
pub(crate) fn cleared<T: Default + PartialEq>(current: &Arc<T>) -> Arc<T> {
    if **current == T::default() {
        Arc::clone(current)
    } else {
        Arc::new(T::default())
    }
}
