//! User profiles and the channel membership mirrors used by member lists.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use huddle_shared::{ChannelId, UserId, UserProfile};

use crate::action::{Action, UserAction};
use crate::reducers::{cleared, with_entries, with_entry};

pub type ChannelUserSets = HashMap<ChannelId, HashSet<UserId>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsersState {
    pub current_user_id: Option<UserId>,
    pub profiles: Arc<HashMap<UserId, UserProfile>>,
    pub profiles_in_channel: Arc<ChannelUserSets>,
    pub profiles_not_in_channel: Arc<ChannelUserSets>,
}

impl UsersState {
    pub fn current_user(&self) -> Option<&UserProfile> {
        self.current_user_id
            .as_ref()
            .and_then(|id| self.profiles.get(id))
    }
}

fn add_to_set<'a>(
    state: &Arc<ChannelUserSets>,
    channel_id: &ChannelId,
    user_ids: impl IntoIterator<Item = &'a UserId>,
) -> Arc<ChannelUserSets> {
    let mut next: Option<ChannelUserSets> = None;
    for user_id in user_ids {
        if state.get(channel_id).is_some_and(|set| set.contains(user_id)) {
            continue;
        }
        next.get_or_insert_with(|| (**state).clone())
            .entry(channel_id.clone())
            .or_default()
            .insert(user_id.clone());
    }
    next.map_or_else(|| Arc::clone(state), Arc::new)
}

fn remove_from_set(
    state: &Arc<ChannelUserSets>,
    channel_id: &ChannelId,
    user_id: &UserId,
) -> Arc<ChannelUserSets> {
    if !state.get(channel_id).is_some_and(|set| set.contains(user_id)) {
        return Arc::clone(state);
    }
    let mut next = (**state).clone();
    if let Some(set) = next.get_mut(channel_id) {
        set.remove(user_id);
    }
    Arc::new(next)
}

fn profiles_in_channel(state: &Arc<ChannelUserSets>, action: &UserAction) -> Arc<ChannelUserSets> {
    match action {
        UserAction::ReceivedProfilesInChannel {
            channel_id,
            user_ids,
        } => add_to_set(state, channel_id, user_ids),
        UserAction::ReceivedProfileInChannel {
            channel_id,
            user_id,
        } => add_to_set(state, channel_id, [user_id]),
        UserAction::ReceivedProfileNotInChannel {
            channel_id,
            user_id,
        } => remove_from_set(state, channel_id, user_id),
        _ => Arc::clone(state),
    }
}

fn profiles_not_in_channel(
    state: &Arc<ChannelUserSets>,
    action: &UserAction,
) -> Arc<ChannelUserSets> {
    match action {
        UserAction::ReceivedProfilesNotInChannel {
            channel_id,
            user_ids,
        } => add_to_set(state, channel_id, user_ids),
        UserAction::ReceivedProfileNotInChannel {
            channel_id,
            user_id,
        } => add_to_set(state, channel_id, [user_id]),
        UserAction::ReceivedProfileInChannel {
            channel_id,
            user_id,
        } => remove_from_set(state, channel_id, user_id),
        _ => Arc::clone(state),
    }
}

pub fn reduce(state: &Arc<UsersState>, action: &Action) -> Arc<UsersState> {
    let action = match action {
        Action::LogoutSuccess => return cleared(state),
        Action::Users(a) => a,
        _ => return Arc::clone(state),
    };

    let current_user_id = match action {
        UserAction::ReceivedMe(me) => Some(me.id.clone()),
        _ => state.current_user_id.clone(),
    };
    let profiles = match action {
        UserAction::ReceivedMe(me) => with_entry(&state.profiles, me.id.clone(), me.clone()),
        UserAction::ReceivedProfiles(list) => {
            with_entries(&state.profiles, list.iter().cloned(), |p| p.id.clone())
        }
        _ => Arc::clone(&state.profiles),
    };
    let profiles_in_channel = profiles_in_channel(&state.profiles_in_channel, action);
    let profiles_not_in_channel = profiles_not_in_channel(&state.profiles_not_in_channel, action);

    if current_user_id == state.current_user_id
        && Arc::ptr_eq(&profiles, &state.profiles)
        && Arc::ptr_eq(&profiles_in_channel, &state.profiles_in_channel)
        && Arc::ptr_eq(&profiles_not_in_channel, &state.profiles_not_in_channel)
    {
        return Arc::clone(state);
    }

    Arc::new(UsersState {
        current_user_id,
        profiles,
        profiles_in_channel,
        profiles_not_in_channel,
    })
}
