//! Async actions: one REST call each, with its lifecycle recorded in the
//! store's request table and its payload reduced into the entities.

pub mod admin;
pub mod channels;
pub mod emojis;
pub mod files;
pub mod jobs;
pub mod posts;
pub mod roles;
pub mod search;
pub mod teams;
pub mod users;

use std::future::Future;

use huddle_store::{Action, ErrorAction, LoggedError, RequestOp, RequestPhase, Store, StoredError};

use crate::client::Client;
use crate::error::{ClientError, Result};

/// Run `fut` as tracked operation `op`.
///
/// `Request` is dispatched before awaiting. On success the actions built by
/// `on_success` and the `Success` phase go out as one completion, so
/// observers never see the new status without its data. A failure records
/// the error against `op` and in the error log; a cancellation only records
/// the `Cancel` phase. If the user logged out while the call was in flight
/// the store drops its completion, and the result only reaches the caller.
pub async fn bind_request<T, F, S>(
    client: &Client,
    store: &Store,
    op: RequestOp,
    fut: F,
    on_success: S,
) -> Result<T>
where
    F: Future<Output = Result<T>>,
    S: FnOnce(&T) -> Vec<Action>,
{
    let seq = store.next_request_seq();
    store.dispatch(Action::request(op, RequestPhase::Request, seq));

    match fut.await {
        Ok(data) => {
            let mut actions = on_success(&data);
            actions.push(Action::request(op, RequestPhase::Success, seq));
            store.dispatch(Action::Completed { op, seq, actions });
            Ok(data)
        }
        Err(err) => {
            dispatch_failure(client, store, op, seq, &err);
            Err(err)
        }
    }
}

fn dispatch_failure(client: &Client, store: &Store, op: RequestOp, seq: u64, err: &ClientError) {
    if matches!(err, ClientError::Cancelled) {
        store.dispatch(Action::request(op, RequestPhase::Cancel, seq));
        return;
    }

    tracing::warn!(%op, error = %err, "request failed");
    let stored = err.to_stored();
    store.dispatch(Action::Completed {
        op,
        seq,
        actions: vec![
            Action::request(op, RequestPhase::Failure(stored.clone()), seq),
            log_error(stored),
        ],
    });
    force_logout_if_necessary(client, store, err);
}

pub(crate) fn log_error(error: StoredError) -> Action {
    Action::Errors(ErrorAction::LogError(LoggedError::now(error, false)))
}

/// A 401 outside of login means the session is gone: drop the token and
/// clear every entity.
pub fn force_logout_if_necessary(client: &Client, store: &Store, err: &ClientError) {
    let ClientError::Server(server_err) = err else {
        return;
    };
    if server_err.status_code != 401 || server_err.url.contains("/users/login") {
        return;
    }
    if store.get_state().entities.users.current_user_id.is_none() {
        return;
    }

    tracing::warn!(url = %server_err.url, "session expired, logging out");
    client.set_token(None);
    store.dispatch(Action::LogoutSuccess);
}
