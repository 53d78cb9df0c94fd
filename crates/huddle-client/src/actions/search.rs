use huddle_shared::{PostList, TeamId, UserId};
use huddle_shared::constants::PAGE_SIZE_DEFAULT;
use huddle_store::{RequestOp, SearchAction, Store};

use crate::actions::bind_request;
use crate::client::Client;
use crate::error::Result;

/// Search posts in a team. Results can span several channels; each one is
/// merged into that channel's cache.
pub async fn search_posts(
    client: &Client,
    store: &Store,
    team_id: &TeamId,
    terms: &str,
    is_or_search: bool,
) -> Result<PostList> {
    bind_request(
        client,
        store,
        RequestOp::SearchPosts,
        client.search_posts(team_id, terms, is_or_search),
        |list| vec![SearchAction::ReceivedSearchPosts(list.clone()).into()],
    )
    .await
}

pub async fn get_flagged_posts(client: &Client, store: &Store, user_id: &UserId) -> Result<PostList> {
    bind_request(
        client,
        store,
        RequestOp::FlaggedPosts,
        client.get_flagged_posts(user_id, 0, PAGE_SIZE_DEFAULT),
        |list| vec![SearchAction::ReceivedSearchFlaggedPosts(list.clone()).into()],
    )
    .await
}

pub fn clear_search(store: &Store) {
    store.dispatch(SearchAction::RemoveSearchPosts);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::testing::spawn_server;
    use huddle_shared::{ChannelId, PostId};
    use huddle_store::{selectors, RequestStatus};

    #[tokio::test]
    async fn test_search_results_span_channels() {
        let server = spawn_server().await;
        let client = Client::new(ClientConfig::new(server.url.clone())).unwrap();
        let store = Store::default();

        search_posts(&client, &store, &TeamId::from("t1"), "message", false)
            .await
            .unwrap();
        get_flagged_posts(&client, &store, &UserId::from("me")).await.unwrap();

        let state = store.get_state();
        assert_eq!(*state.entities.search.results, vec![PostId::from("s1"), PostId::from("s2")]);
        assert_eq!(*state.entities.search.flagged, vec![PostId::from("f1")]);
        assert_eq!(selectors::posts_in_channel(&state, &ChannelId::from("c1")).len(), 1);
        assert_eq!(selectors::posts_in_channel(&state, &ChannelId::from("c2")).len(), 2);

        clear_search(&store);
        let state = store.get_state();
        assert!(state.entities.search.results.is_empty());
        assert_eq!(state.requests.status(RequestOp::SearchPosts), RequestStatus::NotStarted);
    }
}
