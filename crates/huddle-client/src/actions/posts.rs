use huddle_shared::{ChannelId, FileInfo, Post, PostId, PostList};
use huddle_store::{Action, ChannelAction, PostAction, RequestOp, Store};

use crate::actions::{bind_request, log_error};
use crate::client::Client;
use crate::error::Result;

/// Posts of a list in server order.
pub fn posts_of(list: &PostList) -> Vec<Post> {
    list.order
        .iter()
        .filter_map(|id| list.posts.get(id))
        .cloned()
        .collect()
}

fn received_posts(channel_id: &ChannelId, list: &PostList, skip_add_to_channel: bool) -> Action {
    PostAction::ReceivedPosts {
        channel_id: channel_id.clone(),
        posts: posts_of(list),
        skip_add_to_channel,
    }
    .into()
}

pub async fn get_posts(
    client: &Client,
    store: &Store,
    channel_id: &ChannelId,
    page: u32,
    per_page: u32,
) -> Result<PostList> {
    bind_request(
        client,
        store,
        RequestOp::GetPosts,
        client.get_posts(channel_id, page, per_page),
        |list| vec![received_posts(channel_id, list, false)],
    )
    .await
}

/// Changes to `channel_id` since `since`, deletions included.
pub async fn get_posts_since(client: &Client, store: &Store, channel_id: &ChannelId, since: i64) -> Result<PostList> {
    bind_request(
        client,
        store,
        RequestOp::GetPostsSince,
        client.get_posts_since(channel_id, since),
        |list| vec![received_posts(channel_id, list, false)],
    )
    .await
}

/// Load a whole thread. Its posts are cached without changing the order of
/// the channel they live in.
pub async fn get_post_thread(client: &Client, store: &Store, post_id: &PostId) -> Result<PostList> {
    bind_request(
        client,
        store,
        RequestOp::GetPostThread,
        client.get_post_thread(post_id),
        |list| {
            let channel_id = list
                .posts
                .get(post_id)
                .or_else(|| list.posts.values().next())
                .map(|p| p.channel_id.clone());
            match channel_id {
                Some(channel_id) => vec![received_posts(&channel_id, list, true)],
                None => Vec::new(),
            }
        },
    )
    .await
}

/// Send `post`, showing it immediately as pending.
///
/// The confirmed post replaces the pending one through the batch receive
/// path. If the server rejects it the pending copy stays in the channel,
/// marked failed, so the user can retry or discard it.
pub async fn create_post(client: &Client, store: &Store, post: Post) -> Result<Post> {
    let pending_id = PostId::pending();
    let now = chrono::Utc::now().timestamp_millis();
    let pending = Post {
        id: pending_id.clone(),
        pending_post_id: Some(pending_id),
        create_at: now,
        update_at: now,
        failed: false,
        ..post
    };
    store.dispatch(PostAction::ReceivedNewPost(pending.clone()));

    let channel_id = pending.channel_id.clone();
    let result = bind_request(
        client,
        store,
        RequestOp::CreatePost,
        client.create_post(&pending),
        |created| {
            vec![
                PostAction::ReceivedPosts {
                    channel_id: channel_id.clone(),
                    posts: vec![created.clone()],
                    skip_add_to_channel: false,
                }
                .into(),
                // The author has read their own message.
                ChannelAction::IncrementTotalMsgCount {
                    channel_id: channel_id.clone(),
                    amount: 1,
                }
                .into(),
                ChannelAction::IncrementUnreadMsgCount {
                    channel_id: channel_id.clone(),
                    amount: 1,
                    only_mentions: true,
                }
                .into(),
            ]
        },
    )
    .await;

    // The pending copy is gone if the session ended meanwhile.
    let still_pending = store.get_state().entities.posts.posts.contains_key(&pending.id);
    if result.is_err() && still_pending {
        tracing::debug!(post = %pending.id, "marking pending post failed");
        store.dispatch(PostAction::ReceivedPost(Post {
            failed: true,
            ..pending
        }));
    }
    result
}

/// Drop a post that never reached the server.
pub fn remove_pending_post(store: &Store, post: &Post) {
    store.dispatch(PostAction::RemovePendingPost {
        id: post.id.clone(),
        channel_id: post.channel_id.clone(),
    });
}

pub async fn delete_post(client: &Client, store: &Store, post: &Post) -> Result<()> {
    bind_request(
        client,
        store,
        RequestOp::DeletePost,
        client.delete_post(&post.id),
        |_| vec![PostAction::PostDeleted(post.clone()).into()],
    )
    .await
}

pub async fn get_files_for_post(client: &Client, store: &Store, post_id: &PostId) -> Result<Vec<FileInfo>> {
    bind_request(
        client,
        store,
        RequestOp::GetFilesForPost,
        client.get_file_infos_for_post(post_id),
        |_| Vec::new(),
    )
    .await
}

/// Link preview for `url`. Untracked: a failure only lands in the error log.
pub async fn get_open_graph_metadata(client: &Client, store: &Store, url: &str) -> Option<serde_json::Value> {
    match client.get_open_graph_metadata(url).await {
        Ok(data) => {
            store.dispatch(PostAction::ReceivedOpenGraphMetadata {
                url: url.to_string(),
                data: data.clone(),
            });
            Some(data)
        }
        Err(e) => {
            store.dispatch(log_error(e.to_stored()));
            None
        }
    }
}
