//! The state container.
//!
//! A [`Store`] owns the current [`GlobalState`] and is the only place that
//! runs the root reducer. Subscribers are woken through a `tokio::sync::watch`
//! channel, and only when a dispatch actually produced a new state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::trace;

use crate::action::Action;
use crate::reducers;
use crate::state::GlobalState;

pub struct Store {
    tx: watch::Sender<Arc<GlobalState>>,
    seq: AtomicU64,
}

impl Store {
    pub fn new(initial: GlobalState) -> Self {
        let (tx, _rx) = watch::channel(Arc::new(initial));
        Self {
            tx,
            seq: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current state.
    pub fn get_state(&self) -> Arc<GlobalState> {
        Arc::clone(&self.tx.borrow())
    }

    /// Reduce `action` into the current state and return the result.
    ///
    /// Dispatches are serialised by the channel's lock, so each one sees the
    /// outcome of the previous.
    pub fn dispatch(&self, action: impl Into<Action>) -> Arc<GlobalState> {
        self.dispatch_with_previous(action).1
    }

    /// Like [`Store::dispatch`], also returning the state the action was
    /// reduced from. The pair is taken under one lock, so callers can tell
    /// exactly what their own action changed.
    pub fn dispatch_with_previous(&self, action: impl Into<Action>) -> (Arc<GlobalState>, Arc<GlobalState>) {
        let action = action.into();
        let mut reduced = None;

        let changed = self.tx.send_if_modified(|current| {
            let previous = Arc::clone(current);
            let next = reducers::reduce(current, &action);
            let changed = !Arc::ptr_eq(&next, current);
            *current = Arc::clone(&next);
            reduced = Some((previous, next));
            changed
        });

        trace!(changed, "dispatched action");
        reduced.unwrap_or_else(|| {
            let state = self.get_state();
            (Arc::clone(&state), state)
        })
    }

    /// Receiver that observes every state change from now on.
    pub fn subscribe(&self) -> watch::Receiver<Arc<GlobalState>> {
        self.tx.subscribe()
    }

    /// Sequence number for the next tracked request. Strictly increasing for
    /// the lifetime of the store.
    pub fn next_request_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(GlobalState::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ChannelAction;
    use huddle_shared::ChannelId;

    #[tokio::test]
    async fn test_subscribers_see_changes_only() {
        let store = Store::default();
        let mut rx = store.subscribe();

        store.dispatch(ChannelAction::UpdateChannelHeader {
            channel_id: ChannelId::from("missing"),
            header: "h".into(),
        });
        assert!(!rx.has_changed().unwrap());

        let state = store.dispatch(ChannelAction::SelectChannel(ChannelId::from("c1")));
        assert!(rx.has_changed().unwrap());
        rx.changed().await.unwrap();
        assert!(Arc::ptr_eq(&state, &rx.borrow_and_update()));
        assert!(Arc::ptr_eq(&state, &store.get_state()));
    }

    #[test]
    fn test_request_seq_is_monotonic() {
        let store = Store::default();
        let a = store.next_request_seq();
        let b = store.next_request_seq();
        assert!(b > a);
        assert!(a > 0);
    }

    #[test]
    fn test_dispatch_with_previous() {
        let store = Store::default();
        let (before, after) = store.dispatch_with_previous(ChannelAction::SelectChannel(ChannelId::from("c1")));
        assert!(before.entities.channels.current_channel_id.is_none());
        assert!(Arc::ptr_eq(&after, &store.get_state()));

        let (before, after) = store.dispatch_with_previous(ChannelAction::SelectChannel(ChannelId::from("c1")));
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_dispatch_without_subscribers_still_updates() {
        let store = Store::default();
        store.dispatch(ChannelAction::SelectChannel(ChannelId::from("c1")));
        assert_eq!(
            store.get_state().entities.channels.current_channel_id,
            Some(ChannelId::from("c1"))
        );
    }
}
