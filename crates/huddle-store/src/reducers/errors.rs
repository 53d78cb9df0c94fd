use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ErrorAction};
use crate::reducers::requests::StoredError;

/// An error surfaced to the user, newest last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggedError {
    pub error: StoredError,
    /// Whether the UI should show a banner for it.
    pub displayable: bool,
    /// Milliseconds since the Unix epoch.
    pub date: i64,
}

impl LoggedError {
    pub fn now(error: StoredError, displayable: bool) -> Self {
        Self {
            error,
            displayable,
            date: chrono::Utc::now().timestamp_millis(),
        }
    }
}

pub fn reduce(state: &Arc<Vec<LoggedError>>, action: &Action) -> Arc<Vec<LoggedError>> {
    match action {
        Action::Errors(ErrorAction::LogError(error)) => {
            let mut next = (**state).clone();
            next.push(error.clone());
            Arc::new(next)
        }
        Action::Errors(ErrorAction::DismissError(index)) if *index < state.len() => {
            let mut next = (**state).clone();
            next.remove(*index);
            Arc::new(next)
        }
        Action::Errors(ErrorAction::ClearErrors) | Action::LogoutSuccess if !state.is_empty() => {
            Arc::new(Vec::new())
        }
        _ => Arc::clone(state),
    }
}
