//! Lifecycle of tracked REST calls.
//!
//! Every tracked call moves its operation through `Request` and then one of
//! `Success`, `Failure` or `Cancel`. Each `Request` carries a sequence number
//! issued by the store. A completion older than the latest request for the
//! same operation belongs to a superseded call and is dropped, so a slow
//! first response can never overwrite the outcome of a later retry.
//!
//! Logout clears the table but remembers the highest seq issued so far.
//! Anything that completes afterwards with a seq at or below that mark was
//! started in the previous session and is dropped as well.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use huddle_shared::{IntlMessage, ServerError};

use crate::action::{Action, RequestAction, SearchAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOp {
    Login,
    Logout,
    GetMe,
    GetProfiles,
    MyTeamMembers,
    MyChannels,
    MyChannelMembers,
    ViewChannel,
    UpdateChannelNotifyProps,
    GetChannelStats,
    GetPosts,
    GetPostsSince,
    GetPostThread,
    CreatePost,
    DeletePost,
    SearchPosts,
    FlaggedPosts,
    GetFilesForPost,
    UploadFiles,
    GetRoles,
    CreateJob,
    GetJob,
    GetJobs,
    GetJobsByType,
    CancelJob,
    GetConfig,
    UpdateConfig,
    ReloadConfig,
    GetLogs,
    GetAudits,
    GetCustomEmojis,
    CreateCustomEmoji,
    DeleteCustomEmoji,
    Ping,
}

impl fmt::Display for RequestOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    NotStarted,
    Started,
    Success,
    Failure,
    Cancelled,
}

/// A failure flattened to something that can be cloned, compared and
/// persisted. Localisable errors keep their id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum StoredError {
    Message(String),
    Server(ServerError),
    Intl(IntlMessage),
}

impl fmt::Display for StoredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoredError::Message(message) => f.write_str(message),
            StoredError::Server(err) => write!(f, "{err}"),
            StoredError::Intl(msg) => f.write_str(&msg.default_message),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestPhase {
    Request,
    Success,
    Failure(StoredError),
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestState {
    pub status: RequestStatus,
    pub error: Option<StoredError>,
    /// Sequence number of the latest `Request` for this operation.
    pub seq: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RequestsState {
    pub ops: Arc<HashMap<RequestOp, RequestState>>,
    /// Highest `Request` seq seen. Survives logout.
    pub latest_seq: u64,
    /// `latest_seq` as it was at the last logout.
    pub logout_seq: u64,
}

impl RequestsState {
    /// Whether a call of `op` numbered `seq` belongs to the current session.
    /// The logout call itself always does, since its completion is what ends
    /// the previous one.
    pub fn is_current(&self, op: RequestOp, seq: u64) -> bool {
        op == RequestOp::Logout || seq > self.logout_seq
    }

    /// Current state of `op`, `NotStarted` when never issued.
    pub fn get(&self, op: RequestOp) -> RequestState {
        self.ops.get(&op).cloned().unwrap_or_default()
    }

    pub fn status(&self, op: RequestOp) -> RequestStatus {
        self.ops.get(&op).map(|r| r.status).unwrap_or_default()
    }
}

fn handle_request(current: &RequestState, action: &RequestAction) -> Option<RequestState> {
    let (status, error) = match &action.phase {
        RequestPhase::Request => {
            return Some(RequestState {
                status: RequestStatus::Started,
                error: current.error.clone(),
                seq: action.seq,
            });
        }
        _ if action.seq < current.seq => {
            debug!(op = %action.op, seq = action.seq, latest = current.seq, "ignoring stale completion");
            return None;
        }
        RequestPhase::Success => (RequestStatus::Success, None),
        RequestPhase::Failure(err) => (RequestStatus::Failure, Some(err.clone())),
        RequestPhase::Cancel => (RequestStatus::Cancelled, None),
    };

    Some(RequestState {
        status,
        error,
        seq: current.seq,
    })
}

pub fn reduce(state: &Arc<RequestsState>, action: &Action) -> Arc<RequestsState> {
    match action {
        Action::Request(request) => {
            if !state.is_current(request.op, request.seq) {
                debug!(op = %request.op, seq = request.seq, "ignoring request from before logout");
                return Arc::clone(state);
            }
            let current = state.get(request.op);
            let Some(next) = handle_request(&current, request) else {
                return Arc::clone(state);
            };
            let latest_seq = state.latest_seq.max(request.seq);
            if state.ops.get(&request.op) == Some(&next) && latest_seq == state.latest_seq {
                return Arc::clone(state);
            }
            let mut ops = (*state.ops).clone();
            ops.insert(request.op, next);
            Arc::new(RequestsState {
                ops: Arc::new(ops),
                latest_seq,
                logout_seq: state.logout_seq,
            })
        }
        Action::Search(SearchAction::RemoveSearchPosts) => {
            let tracked = [RequestOp::SearchPosts, RequestOp::FlaggedPosts];
            if !tracked.iter().any(|op| state.ops.contains_key(op)) {
                return Arc::clone(state);
            }
            let mut ops = (*state.ops).clone();
            for op in tracked {
                ops.remove(&op);
            }
            Arc::new(RequestsState {
                ops: Arc::new(ops),
                latest_seq: state.latest_seq,
                logout_seq: state.logout_seq,
            })
        }
        Action::LogoutSuccess => {
            if state.ops.is_empty() && state.logout_seq == state.latest_seq {
                return Arc::clone(state);
            }
            Arc::new(RequestsState {
                ops: Arc::default(),
                latest_seq: state.latest_seq,
                logout_seq: state.latest_seq,
            })
        }
        _ => Arc::clone(state),
    }
}
