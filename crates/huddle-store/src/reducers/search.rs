//! Search result ids. The posts themselves are merged into the post cache by
//! the posts reducer.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use huddle_shared::{PostId, PostList};

use crate::action::{Action, SearchAction};
use crate::reducers::cleared;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchState {
    /// Post ids of the last search, in server order.
    pub results: Arc<Vec<PostId>>,
    pub flagged: Arc<Vec<PostId>>,
}

fn ids_of(list: &PostList) -> Vec<PostId> {
    list.order
        .iter()
        .filter(|id| list.posts.contains_key(*id))
        .cloned()
        .collect()
}

pub fn reduce(state: &Arc<SearchState>, action: &Action) -> Arc<SearchState> {
    let action = match action {
        Action::LogoutSuccess => return cleared(state),
        Action::Search(a) => a,
        _ => return Arc::clone(state),
    };

    match action {
        SearchAction::ReceivedSearchPosts(list) => {
            let results = ids_of(list);
            if results == *state.results {
                return Arc::clone(state);
            }
            Arc::new(SearchState {
                results: Arc::new(results),
                flagged: Arc::clone(&state.flagged),
            })
        }
        SearchAction::ReceivedSearchFlaggedPosts(list) => {
            let flagged = ids_of(list);
            if flagged == *state.flagged {
                return Arc::clone(state);
            }
            Arc::new(SearchState {
                results: Arc::clone(&state.results),
                flagged: Arc::new(flagged),
            })
        }
        SearchAction::RemoveSearchPosts => cleared(state),
    }
}
