//! The global state tree.
//!
//! Every node is held behind an `Arc` and replaced wholesale on change; nothing
//! in the tree is ever mutated in place once published.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::reducers::channels::ChannelsState;
use crate::reducers::emojis::EmojisState;
use crate::reducers::errors::LoggedError;
use crate::reducers::jobs::JobsState;
use crate::reducers::posts::PostsState;
use crate::reducers::requests::RequestsState;
use crate::reducers::roles::RolesState;
use crate::reducers::search::SearchState;
use crate::reducers::teams::TeamsState;
use crate::reducers::users::UsersState;

/// Mirror of the server's entities.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitiesState {
    pub users: Arc<UsersState>,
    pub teams: Arc<TeamsState>,
    pub channels: Arc<ChannelsState>,
    pub posts: Arc<PostsState>,
    pub roles: Arc<RolesState>,
    pub jobs: Arc<JobsState>,
    pub emojis: Arc<EmojisState>,
    pub search: Arc<SearchState>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalState {
    pub entities: Arc<EntitiesState>,
    pub errors: Arc<Vec<LoggedError>>,
    /// Per-operation request lifecycle; never persisted.
    pub requests: Arc<RequestsState>,
}

impl GlobalState {
    /// Fresh state around rehydrated entities.
    pub fn with_entities(entities: EntitiesState) -> Self {
        Self {
            entities: Arc::new(entities),
            ..Default::default()
        }
    }
}
