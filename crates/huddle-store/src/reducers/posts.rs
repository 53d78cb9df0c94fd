//! Post cache: the flat post map, per-channel display order, thread index,
//! pending-post bookkeeping and the small per-post side tables.
//!
//! Channel lists are kept newest first with pending and failed posts ahead of
//! confirmed ones (see [`compare_posts`]). Thread lists carry no ordering
//! guarantee and are kept in insertion order.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use huddle_shared::constants::MAX_PREV_MSGS;
use huddle_shared::{ChannelId, Post, PostId, PostList, Reaction};

use crate::action::{Action, PostAction, SearchAction};
use crate::reducers::cleared;

pub type PostMap = HashMap<PostId, Post>;
pub type ChannelOrder = HashMap<ChannelId, Vec<PostId>>;
pub type ThreadIndex = HashMap<PostId, Vec<PostId>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostsState {
    pub posts: Arc<PostMap>,
    /// Ids of posts created locally and not yet confirmed by the server.
    pub pending_post_ids: Arc<Vec<PostId>>,
    /// Channel id to post ids, most recent first.
    pub posts_in_channel: Arc<ChannelOrder>,
    /// Root post id to reply ids.
    pub posts_in_thread: Arc<ThreadIndex>,
    pub selected_post_id: Option<PostId>,
    /// Post opened through a permalink.
    pub current_focused_post_id: Option<PostId>,
    /// Post id to reactions keyed by `"{user_id}-{emoji_name}"`.
    pub reactions: Arc<HashMap<PostId, HashMap<String, Reaction>>>,
    /// URL to link-preview metadata.
    pub open_graph: Arc<HashMap<String, serde_json::Value>>,
    pub messages_history: Arc<MessagesHistory>,
}

impl Default for PostsState {
    fn default() -> Self {
        Self {
            posts: Arc::default(),
            pending_post_ids: Arc::default(),
            posts_in_channel: Arc::default(),
            posts_in_thread: Arc::default(),
            selected_post_id: None,
            current_focused_post_id: None,
            reactions: Arc::default(),
            open_graph: Arc::default(),
            messages_history: Arc::default(),
        }
    }
}

impl PostsState {
    /// Resolve a channel's ordered ids to posts, skipping dangling ids.
    pub fn posts_for_channel(&self, channel_id: &ChannelId) -> Vec<&Post> {
        self.posts_in_channel
            .get(channel_id)
            .map(|ids| ids.iter().filter_map(|id| self.posts.get(id)).collect())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Message history
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Post,
    Comment,
}

/// Recently sent messages with one recall cursor per input box. A cursor
/// equal to `messages.len()` means "not browsing history".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagesHistory {
    pub messages: Vec<String>,
    pub post_index: i64,
    pub comment_index: i64,
}

impl Default for MessagesHistory {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            post_index: -1,
            comment_index: -1,
        }
    }
}

impl MessagesHistory {
    pub fn index(&self, kind: MessageType) -> i64 {
        match kind {
            MessageType::Post => self.post_index,
            MessageType::Comment => self.comment_index,
        }
    }

    fn index_mut(&mut self, kind: MessageType) -> &mut i64 {
        match kind {
            MessageType::Post => &mut self.post_index,
            MessageType::Comment => &mut self.comment_index,
        }
    }

    /// Message the cursor for `kind` currently points at, if any.
    pub fn current(&self, kind: MessageType) -> Option<&str> {
        let index = usize::try_from(self.index(kind)).ok()?;
        self.messages.get(index).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Display order for posts within one channel: pending and failed posts come
/// before confirmed ones; within each class the most recent `create_at`
/// comes first.
pub fn compare_posts(a: &Post, b: &Post) -> Ordering {
    match (a.is_pending_or_failed(), b.is_pending_or_failed()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.create_at.cmp(&a.create_at),
    }
}

/// Ids whose post is missing from the map sort last.
fn sort_channel_order(ids: &mut [PostId], posts: &PostMap) {
    ids.sort_by(|a, b| match (posts.get(a), posts.get(b)) {
        (Some(a), Some(b)) => compare_posts(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

// ---------------------------------------------------------------------------
// posts / postsInChannel / postsInThread
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct PostTables {
    posts: Arc<PostMap>,
    posts_in_channel: Arc<ChannelOrder>,
    posts_in_thread: Arc<ThreadIndex>,
}

impl PostTables {
    fn of(state: &PostsState) -> Self {
        Self {
            posts: Arc::clone(&state.posts),
            posts_in_channel: Arc::clone(&state.posts_in_channel),
            posts_in_thread: Arc::clone(&state.posts_in_thread),
        }
    }
}

fn handle_received_post(tables: PostTables, post: &Post) -> PostTables {
    let mut posts = (*tables.posts).clone();
    posts.insert(post.id.clone(), post.clone());

    let mut posts_in_channel = tables.posts_in_channel;
    let known_in_channel = posts_in_channel
        .get(&post.channel_id)
        .is_some_and(|ids| ids.contains(&post.id));
    if !known_in_channel {
        // A post we have not seen yet is assumed to be the newest one.
        let mut next = (*posts_in_channel).clone();
        next.entry(post.channel_id.clone())
            .or_default()
            .insert(0, post.id.clone());
        posts_in_channel = Arc::new(next);
    }

    let mut posts_in_thread = tables.posts_in_thread;
    if let Some(root_id) = &post.root_id {
        let known_in_thread = posts_in_thread
            .get(root_id)
            .is_some_and(|ids| ids.contains(&post.id));
        if !known_in_thread {
            let mut next = (*posts_in_thread).clone();
            next.entry(root_id.clone())
                .or_default()
                .insert(0, post.id.clone());
            posts_in_thread = Arc::new(next);
        }
    }

    PostTables {
        posts: Arc::new(posts),
        posts_in_channel,
        posts_in_thread,
    }
}

fn handle_remove_pending_post(tables: PostTables, id: &PostId, channel_id: &ChannelId) -> PostTables {
    let root_id = tables.posts.get(id).and_then(|p| p.root_id.clone());
    let in_channel = tables
        .posts_in_channel
        .get(channel_id)
        .is_some_and(|ids| ids.contains(id));

    if !tables.posts.contains_key(id) && !in_channel {
        return tables;
    }

    let mut posts = (*tables.posts).clone();
    posts.remove(id);

    let mut posts_in_channel = tables.posts_in_channel;
    if in_channel {
        let mut next = (*posts_in_channel).clone();
        if let Some(ids) = next.get_mut(channel_id) {
            ids.retain(|p| p != id);
        }
        posts_in_channel = Arc::new(next);
    }

    let mut posts_in_thread = tables.posts_in_thread;
    if let Some(root_id) = root_id {
        if posts_in_thread.get(&root_id).is_some_and(|ids| ids.contains(id)) {
            let mut next = (*posts_in_thread).clone();
            if let Some(ids) = next.get_mut(&root_id) {
                ids.retain(|p| p != id);
            }
            posts_in_thread = Arc::new(next);
        }
    }

    PostTables {
        posts: Arc::new(posts),
        posts_in_channel,
        posts_in_thread,
    }
}

fn handle_received_posts(
    tables: PostTables,
    channel_id: &ChannelId,
    new_posts: &[Post],
    skip_add_to_channel: bool,
) -> PostTables {
    if new_posts.is_empty() {
        return tables;
    }

    let mut posts = (*tables.posts).clone();
    let mut posts_in_thread = (*tables.posts_in_thread).clone();
    let had_channel_list = tables.posts_in_channel.contains_key(channel_id);
    let mut channel_ids = tables
        .posts_in_channel
        .get(channel_id)
        .cloned()
        .unwrap_or_default();

    let mut posts_changed = false;
    let mut thread_changed = false;
    let mut channel_changed = false;

    for new_post in new_posts {
        let id = &new_post.id;

        if new_post.delete_at > 0 {
            if !posts.contains_key(id) {
                // Never seen it, nothing to tombstone.
                continue;
            }
            let tombstone = new_post.clone().into_tombstone();
            if posts.get(id) != Some(&tombstone) {
                posts.insert(id.clone(), tombstone);
                posts_changed = true;
            }
        } else if posts
            .get(id)
            .map_or(true, |stored| stored.update_at < new_post.update_at)
        {
            posts.insert(id.clone(), new_post.clone());
            posts_changed = true;
        }

        if !skip_add_to_channel && !channel_ids.contains(id) {
            // Appended for now, the full sort below places it.
            channel_ids.push(id.clone());
            channel_changed = true;
        }

        let pending_id = new_post.pending_post_id.as_ref().filter(|p| *p != id);
        if let Some(pending_id) = pending_id {
            if posts.remove(pending_id).is_some() {
                debug!(pending = %pending_id, confirmed = %id, "reconciled pending post");
                posts_changed = true;
            }
            if channel_ids.contains(pending_id) {
                channel_ids.retain(|p| p != pending_id);
                channel_changed = true;
            }
        }

        let Some(root_id) = &new_post.root_id else {
            continue;
        };

        let thread = posts_in_thread.entry(root_id.clone()).or_default();
        if !thread.contains(id) {
            thread.push(id.clone());
            thread_changed = true;
        }
        if let Some(pending_id) = pending_id {
            if thread.contains(pending_id) {
                thread.retain(|p| p != pending_id);
                thread_changed = true;
            }
        }
    }

    // An edit can move a post (a failed post confirmed in place), so the
    // order is re-checked whenever a post or the id list changed.
    let mut posts_in_channel = tables.posts_in_channel;
    if (had_channel_list || !skip_add_to_channel) && (posts_changed || channel_changed) {
        sort_channel_order(&mut channel_ids, &posts);
        if posts_in_channel.get(channel_id) != Some(&channel_ids) {
            let mut next = (*posts_in_channel).clone();
            next.insert(channel_id.clone(), channel_ids);
            posts_in_channel = Arc::new(next);
        }
    }

    PostTables {
        posts: if posts_changed { Arc::new(posts) } else { tables.posts },
        posts_in_channel,
        posts_in_thread: if thread_changed {
            Arc::new(posts_in_thread)
        } else {
            tables.posts_in_thread
        },
    }
}

/// Search results may span channels; each channel's share goes through the
/// batch path so ordering and pending reconciliation stay channel scoped.
fn handle_posts_from_search(tables: PostTables, list: &PostList) -> PostTables {
    let mut buckets: Vec<(ChannelId, Vec<Post>)> = Vec::new();

    let ordered = list.order.iter().filter_map(|id| list.posts.get(id));
    let unordered = list.posts.values().filter(|p| !list.order.contains(&p.id));

    for post in ordered.chain(unordered) {
        match buckets.iter_mut().find(|(c, _)| *c == post.channel_id) {
            Some((_, bucket)) => bucket.push(post.clone()),
            None => buckets.push((post.channel_id.clone(), vec![post.clone()])),
        }
    }

    buckets
        .iter()
        .fold(tables, |acc, (channel_id, posts)| {
            handle_received_posts(acc, channel_id, posts, false)
        })
}

/// Ids of `root`'s replies known either through the channel order or the
/// thread index.
fn reply_ids(posts: &PostMap, channel_ids: &[PostId], thread_ids: &[PostId], root: &PostId) -> Vec<PostId> {
    let mut replies: Vec<PostId> = channel_ids
        .iter()
        .filter(|id| {
            posts
                .get(*id)
                .is_some_and(|p| p.root_id.as_ref() == Some(root))
        })
        .cloned()
        .collect();
    for id in thread_ids {
        if !replies.contains(id) {
            replies.push(id.clone());
        }
    }
    replies
}

fn handle_post_deleted(tables: PostTables, post: &Post) -> PostTables {
    let Some(stored) = tables.posts.get(&post.id) else {
        return tables;
    };

    let mut posts = (*tables.posts).clone();
    posts.insert(post.id.clone(), stored.clone().into_tombstone());

    let channel_ids = tables
        .posts_in_channel
        .get(&post.channel_id)
        .cloned()
        .unwrap_or_default();
    let thread_ids = tables
        .posts_in_thread
        .get(&post.id)
        .cloned()
        .unwrap_or_default();

    let replies = reply_ids(&posts, &channel_ids, &thread_ids, &post.id);
    for reply in &replies {
        posts.remove(reply);
    }
    if !replies.is_empty() {
        debug!(post = %post.id, count = replies.len(), "dropped replies of deleted post");
    }

    let mut posts_in_channel = (*tables.posts_in_channel).clone();
    posts_in_channel.insert(
        post.channel_id.clone(),
        channel_ids
            .into_iter()
            .filter(|id| !replies.contains(id))
            .collect(),
    );

    let mut posts_in_thread = tables.posts_in_thread;
    if posts_in_thread.contains_key(&post.id) {
        let mut next = (*posts_in_thread).clone();
        next.remove(&post.id);
        posts_in_thread = Arc::new(next);
    }

    PostTables {
        posts: Arc::new(posts),
        posts_in_channel: Arc::new(posts_in_channel),
        posts_in_thread,
    }
}

fn handle_remove_post(tables: PostTables, post: &Post) -> PostTables {
    let Some(stored) = tables.posts.get(&post.id) else {
        return tables;
    };
    let root_id = stored.root_id.clone().or_else(|| post.root_id.clone());

    let mut posts = (*tables.posts).clone();
    posts.remove(&post.id);

    let channel_ids = tables
        .posts_in_channel
        .get(&post.channel_id)
        .cloned()
        .unwrap_or_default();
    let thread_ids = tables
        .posts_in_thread
        .get(&post.id)
        .cloned()
        .unwrap_or_default();

    let replies = reply_ids(&posts, &channel_ids, &thread_ids, &post.id);
    for reply in &replies {
        posts.remove(reply);
    }

    let mut posts_in_channel = (*tables.posts_in_channel).clone();
    posts_in_channel.insert(
        post.channel_id.clone(),
        channel_ids
            .into_iter()
            .filter(|id| *id != post.id && !replies.contains(id))
            .collect(),
    );

    let mut posts_in_thread = tables.posts_in_thread;
    let in_parent_thread = root_id
        .as_ref()
        .and_then(|root| posts_in_thread.get(root))
        .is_some_and(|ids| ids.contains(&post.id));
    if posts_in_thread.contains_key(&post.id) || in_parent_thread {
        let mut next = (*posts_in_thread).clone();
        next.remove(&post.id);
        if let Some(ids) = root_id.as_ref().and_then(|root| next.get_mut(root)) {
            ids.retain(|id| *id != post.id);
        }
        posts_in_thread = Arc::new(next);
    }

    PostTables {
        posts: Arc::new(posts),
        posts_in_channel: Arc::new(posts_in_channel),
        posts_in_thread,
    }
}

fn handle_posts(tables: PostTables, action: &Action) -> PostTables {
    match action {
        Action::Posts(post_action) => match post_action {
            PostAction::ReceivedPost(post) => PostTables {
                posts: crate::reducers::with_entry(&tables.posts, post.id.clone(), post.clone()),
                ..tables
            },
            PostAction::ReceivedNewPost(post) => handle_received_post(tables, post),
            PostAction::RemovePendingPost { id, channel_id } => {
                handle_remove_pending_post(tables, id, channel_id)
            }
            PostAction::ReceivedPosts {
                channel_id,
                posts,
                skip_add_to_channel,
            } => handle_received_posts(tables, channel_id, posts, *skip_add_to_channel),
            PostAction::PostDeleted(post) => handle_post_deleted(tables, post),
            PostAction::RemovePost(post) => handle_remove_post(tables, post),
            PostAction::ReceivedPostSelected(_)
            | PostAction::ReceivedFocusedPost(_)
            | PostAction::ReceivedReactions { .. }
            | PostAction::ReceivedReaction(_)
            | PostAction::ReactionDeleted(_)
            | PostAction::ReceivedOpenGraphMetadata { .. }
            | PostAction::AddMessageIntoHistory(_)
            | PostAction::ResetHistoryIndex(_)
            | PostAction::MoveHistoryIndexBack(_)
            | PostAction::MoveHistoryIndexForward(_) => tables,
        },
        Action::Search(SearchAction::ReceivedSearchPosts(list))
        | Action::Search(SearchAction::ReceivedSearchFlaggedPosts(list)) => {
            handle_posts_from_search(tables, list)
        }
        _ => tables,
    }
}

// ---------------------------------------------------------------------------
// Side tables
// ---------------------------------------------------------------------------

fn pending_post_ids(state: &Arc<Vec<PostId>>, action: &Action) -> Arc<Vec<PostId>> {
    match action {
        Action::Posts(PostAction::ReceivedNewPost(post)) => match &post.pending_post_id {
            Some(pending) if !state.contains(pending) => {
                let mut next = (**state).clone();
                next.push(pending.clone());
                Arc::new(next)
            }
            _ => Arc::clone(state),
        },
        Action::Posts(PostAction::RemovePendingPost { id, .. }) => {
            if !state.contains(id) {
                return Arc::clone(state);
            }
            Arc::new(state.iter().filter(|p| *p != id).cloned().collect())
        }
        Action::Posts(PostAction::ReceivedPosts { posts, .. }) => {
            let confirmed: Vec<&PostId> = posts
                .iter()
                .filter_map(|p| p.pending_post_id.as_ref())
                .filter(|pending| state.contains(pending))
                .collect();
            if confirmed.is_empty() {
                return Arc::clone(state);
            }
            Arc::new(
                state
                    .iter()
                    .filter(|p| !confirmed.contains(p))
                    .cloned()
                    .collect(),
            )
        }
        _ => Arc::clone(state),
    }
}

fn selected_post_id(state: &Option<PostId>, action: &Action) -> Option<PostId> {
    match action {
        Action::Posts(PostAction::ReceivedPostSelected(id)) => id.clone(),
        _ => state.clone(),
    }
}

fn current_focused_post_id(state: &Option<PostId>, action: &Action) -> Option<PostId> {
    match action {
        Action::Posts(PostAction::ReceivedFocusedPost(id)) => id.clone(),
        _ => state.clone(),
    }
}

type ReactionTable = HashMap<PostId, HashMap<String, Reaction>>;

fn reactions(state: &Arc<ReactionTable>, action: &Action) -> Arc<ReactionTable> {
    match action {
        Action::Posts(PostAction::ReceivedReactions { post_id, reactions }) => {
            let set = reactions.iter().map(|r| (r.key(), r.clone())).collect();
            let mut next = (**state).clone();
            next.insert(post_id.clone(), set);
            Arc::new(next)
        }
        Action::Posts(PostAction::ReceivedReaction(reaction)) => {
            let mut next = (**state).clone();
            next.entry(reaction.post_id.clone())
                .or_default()
                .insert(reaction.key(), reaction.clone());
            Arc::new(next)
        }
        Action::Posts(PostAction::ReactionDeleted(reaction)) => {
            let key = reaction.key();
            let known = state
                .get(&reaction.post_id)
                .is_some_and(|set| set.contains_key(&key));
            if !known {
                return Arc::clone(state);
            }
            let mut next = (**state).clone();
            if let Some(set) = next.get_mut(&reaction.post_id) {
                set.remove(&key);
            }
            Arc::new(next)
        }
        Action::Posts(PostAction::PostDeleted(post)) | Action::Posts(PostAction::RemovePost(post)) => {
            crate::reducers::without_entry(state, &post.id)
        }
        _ => Arc::clone(state),
    }
}

fn open_graph(
    state: &Arc<HashMap<String, serde_json::Value>>,
    action: &Action,
) -> Arc<HashMap<String, serde_json::Value>> {
    match action {
        Action::Posts(PostAction::ReceivedOpenGraphMetadata { url, data }) => {
            crate::reducers::with_entry(state, url.clone(), data.clone())
        }
        _ => Arc::clone(state),
    }
}

fn messages_history(state: &Arc<MessagesHistory>, action: &Action) -> Arc<MessagesHistory> {
    match action {
        Action::Posts(PostAction::AddMessageIntoHistory(message)) => {
            let mut messages = state.messages.clone();
            messages.push(message.clone());
            if messages.len() > MAX_PREV_MSGS {
                messages.drain(..messages.len() - MAX_PREV_MSGS);
            }
            let len = messages.len() as i64;
            Arc::new(MessagesHistory {
                messages,
                post_index: len,
                comment_index: len,
            })
        }
        Action::Posts(PostAction::ResetHistoryIndex(kind)) => {
            let len = state.messages.len() as i64;
            if state.index(*kind) == len {
                return Arc::clone(state);
            }
            let mut next = (**state).clone();
            *next.index_mut(*kind) = len;
            Arc::new(next)
        }
        Action::Posts(PostAction::MoveHistoryIndexBack(kind)) => {
            if state.index(*kind) <= 0 {
                return Arc::clone(state);
            }
            let mut next = (**state).clone();
            *next.index_mut(*kind) -= 1;
            Arc::new(next)
        }
        Action::Posts(PostAction::MoveHistoryIndexForward(kind)) => {
            if state.index(*kind) >= state.messages.len() as i64 {
                return Arc::clone(state);
            }
            let mut next = (**state).clone();
            *next.index_mut(*kind) += 1;
            Arc::new(next)
        }
        _ => Arc::clone(state),
    }
}

// ---------------------------------------------------------------------------
// Slice reducer
// ---------------------------------------------------------------------------

pub fn reduce(state: &Arc<PostsState>, action: &Action) -> Arc<PostsState> {
    if let Action::LogoutSuccess = action {
        return cleared(state);
    }

    let tables = handle_posts(PostTables::of(state), action);

    let next = PostsState {
        posts: tables.posts,
        pending_post_ids: pending_post_ids(&state.pending_post_ids, action),
        posts_in_channel: tables.posts_in_channel,
        posts_in_thread: tables.posts_in_thread,
        selected_post_id: selected_post_id(&state.selected_post_id, action),
        current_focused_post_id: current_focused_post_id(&state.current_focused_post_id, action),
        reactions: reactions(&state.reactions, action),
        open_graph: open_graph(&state.open_graph, action),
        messages_history: messages_history(&state.messages_history, action),
    };

    // None of the sub-slices changed: hand back the previous snapshot so
    // consumers can compare by pointer.
    if Arc::ptr_eq(&next.posts, &state.posts)
        && Arc::ptr_eq(&next.pending_post_ids, &state.pending_post_ids)
        && Arc::ptr_eq(&next.posts_in_channel, &state.posts_in_channel)
        && Arc::ptr_eq(&next.posts_in_thread, &state.posts_in_thread)
        && next.selected_post_id == state.selected_post_id
        && next.current_focused_post_id == state.current_focused_post_id
        && Arc::ptr_eq(&next.reactions, &state.reactions)
        && Arc::ptr_eq(&next.open_graph, &state.open_graph)
        && Arc::ptr_eq(&next.messages_history, &state.messages_history)
    {
        return Arc::clone(state);
    }

    Arc::new(next)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: &str, channel: &str, create_at: i64) -> Post {
        Post {
            id: PostId::from(id),
            channel_id: ChannelId::from(channel),
            create_at,
            update_at: create_at,
            message: format!("message {id}"),
            ..Default::default()
        }
    }

    fn reply(id: &str, channel: &str, root: &str, create_at: i64) -> Post {
        Post {
            root_id: Some(PostId::from(root)),
            ..post(id, channel, create_at)
        }
    }

    fn pending(id: &str, channel: &str, create_at: i64) -> Post {
        Post {
            pending_post_id: Some(PostId::from(id)),
            ..post(id, channel, create_at)
        }
    }

    fn apply(state: &Arc<PostsState>, action: PostAction) -> Arc<PostsState> {
        reduce(state, &Action::Posts(action))
    }

    fn receive(state: &Arc<PostsState>, channel: &str, posts: Vec<Post>) -> Arc<PostsState> {
        apply(
            state,
            PostAction::ReceivedPosts {
                channel_id: ChannelId::from(channel),
                posts,
                skip_add_to_channel: false,
            },
        )
    }

    fn order<'a>(state: &'a PostsState, channel: &str) -> Vec<&'a str> {
        state.posts_in_channel[&ChannelId::from(channel)]
            .iter()
            .map(PostId::as_str)
            .collect()
    }

    fn thread<'a>(state: &'a PostsState, root: &str) -> Vec<&'a str> {
        state
            .posts_in_thread
            .get(&PostId::from(root))
            .map(|ids| ids.iter().map(PostId::as_str).collect())
            .unwrap_or_default()
    }

    fn ids(list: &[&str]) -> Vec<PostId> {
        list.iter().map(|id| PostId::from(*id)).collect()
    }

    #[test]
    fn test_identical_batch_keeps_state() {
        let state = Arc::new(PostsState::default());
        let batch = vec![post("a", "c1", 1), reply("b", "c1", "a", 2)];

        let once = receive(&state, "c1", batch.clone());
        let twice = receive(&once, "c1", batch);
        assert!(Arc::ptr_eq(&once, &twice));

        let stale = receive(&once, "c1", vec![post("a", "c1", 0)]);
        assert!(Arc::ptr_eq(&once, &stale));

        let same = apply(&once, PostAction::ReceivedPost(once.posts[&PostId::from("a")].clone()));
        assert!(Arc::ptr_eq(&once, &same));
    }

    #[test]
    fn test_newer_copy_replaces_only_post_map() {
        let state = receive(&Arc::new(PostsState::default()), "c1", vec![post("a", "c1", 1)]);
        let edited = Post {
            update_at: 5,
            message: "edited".into(),
            ..post("a", "c1", 1)
        };
        let next = receive(&state, "c1", vec![edited]);

        assert!(!Arc::ptr_eq(&state.posts, &next.posts));
        assert!(Arc::ptr_eq(&state.posts_in_channel, &next.posts_in_channel));
        assert!(Arc::ptr_eq(&state.posts_in_thread, &next.posts_in_thread));
        assert_eq!(next.posts[&PostId::from("a")].message, "edited");
    }

    #[test]
    fn test_compare_posts_pending_first_then_newest() {
        let old = post("a", "c", 1);
        let new = post("b", "c", 2);
        let pend = pending("p", "c", 0);
        let mut failed = post("f", "c", 0);
        failed.failed = true;

        assert_eq!(compare_posts(&new, &old), Ordering::Less);
        assert_eq!(compare_posts(&old, &new), Ordering::Greater);
        assert_eq!(compare_posts(&pend, &new), Ordering::Less);
        assert_eq!(compare_posts(&new, &pend), Ordering::Greater);
        assert_eq!(compare_posts(&failed, &new), Ordering::Less);
        assert_eq!(compare_posts(&new, &new.clone()), Ordering::Equal);
    }

    #[test]
    fn test_received_new_post_prepends_once() {
        let state = Arc::new(PostsState::default());
        let state = receive(&state, "c1", vec![post("a", "c1", 1)]);

        let state = apply(&state, PostAction::ReceivedNewPost(post("b", "c1", 2)));
        assert_eq!(order(&state, "c1"), vec!["b", "a"]);

        let again = apply(&state, PostAction::ReceivedNewPost(post("b", "c1", 2)));
        assert_eq!(order(&again, "c1"), vec!["b", "a"]);
        assert!(Arc::ptr_eq(&state.posts_in_channel, &again.posts_in_channel));
    }

    #[test]
    fn test_received_new_post_mirrors_into_thread() {
        let state = Arc::new(PostsState::default());
        let state = apply(&state, PostAction::ReceivedNewPost(post("root", "c1", 1)));
        let state = apply(&state, PostAction::ReceivedNewPost(reply("r1", "c1", "root", 2)));
        let state = apply(&state, PostAction::ReceivedNewPost(reply("r2", "c1", "root", 3)));

        assert_eq!(thread(&state, "root"), vec!["r2", "r1"]);
        assert_eq!(order(&state, "c1"), vec!["r2", "r1", "root"]);
    }

    #[test]
    fn test_received_new_pending_post_tracks_pending_id() {
        let state = Arc::new(PostsState::default());
        let state = apply(&state, PostAction::ReceivedNewPost(pending("tmp", "c1", 5)));
        assert_eq!(*state.pending_post_ids, ids(&["tmp"]));

        let state = apply(&state, PostAction::ReceivedNewPost(pending("tmp", "c1", 5)));
        assert_eq!(*state.pending_post_ids, ids(&["tmp"]));
    }

    #[test]
    fn test_received_posts_sorts_newest_first() {
        let state = Arc::new(PostsState::default());
        let state = receive(
            &state,
            "c1",
            vec![post("a", "c1", 1), post("c", "c1", 3), post("b", "c1", 2)],
        );
        assert_eq!(order(&state, "c1"), vec!["c", "b", "a"]);

        let state = receive(&state, "c1", vec![post("d", "c1", 0)]);
        assert_eq!(order(&state, "c1"), vec!["c", "b", "a", "d"]);
    }

    #[test]
    fn test_received_posts_keeps_pending_first() {
        let state = Arc::new(PostsState::default());
        let state = apply(&state, PostAction::ReceivedNewPost(pending("tmp", "c1", 1)));
        let state = receive(&state, "c1", vec![post("a", "c1", 100), post("b", "c1", 200)]);
        assert_eq!(order(&state, "c1"), vec!["tmp", "b", "a"]);
    }

    #[test]
    fn test_received_posts_last_write_wins_by_update_at() {
        let state = Arc::new(PostsState::default());
        let mut v1 = post("a", "c1", 1);
        v1.update_at = 10;
        v1.message = "new".into();
        let mut stale = v1.clone();
        stale.update_at = 5;
        stale.message = "stale".into();

        let state = receive(&state, "c1", vec![v1]);
        let state = receive(&state, "c1", vec![stale]);
        assert_eq!(state.posts[&PostId::from("a")].message, "new");
    }

    #[test]
    fn test_received_posts_empty_batch_is_noop() {
        let state = Arc::new(PostsState::default());
        let next = receive(&state, "c1", vec![]);
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_received_posts_unknown_deleted_post_is_dropped() {
        let state = Arc::new(PostsState::default());
        let mut gone = post("x", "c1", 1);
        gone.delete_at = 5;

        let state = receive(&state, "c1", vec![gone, post("a", "c1", 2)]);
        assert!(!state.posts.contains_key(&PostId::from("x")));
        assert_eq!(order(&state, "c1"), vec!["a"]);
    }

    #[test]
    fn test_received_posts_known_deleted_post_is_tombstoned() {
        let state = Arc::new(PostsState::default());
        let mut original = post("x", "c1", 1);
        original.file_ids = vec!["f1".into()];
        original.has_reactions = true;
        let state = receive(&state, "c1", vec![original.clone()]);

        let mut deleted = original;
        deleted.delete_at = 9;
        deleted.update_at = 9;
        let state = receive(&state, "c1", vec![deleted]);

        let stored = &state.posts[&PostId::from("x")];
        assert!(stored.is_deleted());
        assert!(stored.file_ids.is_empty());
        assert!(!stored.has_reactions);
        assert_eq!(order(&state, "c1"), vec!["x"]);
    }

    #[test]
    fn test_received_posts_reconciles_pending_post() {
        let state = Arc::new(PostsState::default());
        let state = receive(&state, "c1", vec![post("old", "c1", 1)]);
        let state = apply(&state, PostAction::ReceivedNewPost(pending("tmp", "c1", 5)));
        assert_eq!(order(&state, "c1"), vec!["tmp", "old"]);

        let mut confirmed = post("real", "c1", 5);
        confirmed.pending_post_id = Some(PostId::from("tmp"));
        let state = receive(&state, "c1", vec![confirmed]);

        assert_eq!(order(&state, "c1"), vec!["real", "old"]);
        assert!(!state.posts.contains_key(&PostId::from("tmp")));
        assert!(state.posts.contains_key(&PostId::from("real")));
        assert!(state.pending_post_ids.is_empty());
    }

    #[test]
    fn test_received_posts_reconciles_pending_reply_in_thread() {
        let state = Arc::new(PostsState::default());
        let state = receive(&state, "c1", vec![post("root", "c1", 1)]);
        let mut tmp = reply("tmp", "c1", "root", 5);
        tmp.pending_post_id = Some(PostId::from("tmp"));
        let state = apply(&state, PostAction::ReceivedNewPost(tmp));
        assert_eq!(thread(&state, "root"), vec!["tmp"]);

        let mut confirmed = reply("real", "c1", "root", 5);
        confirmed.pending_post_id = Some(PostId::from("tmp"));
        let state = receive(&state, "c1", vec![confirmed]);

        assert_eq!(thread(&state, "root"), vec!["real"]);
        assert_eq!(order(&state, "c1"), vec!["real", "root"]);
    }

    #[test]
    fn test_received_posts_skip_add_to_channel() {
        let state = Arc::new(PostsState::default());
        let state = receive(&state, "c1", vec![post("a", "c1", 1)]);
        let state = apply(
            &state,
            PostAction::ReceivedPosts {
                channel_id: ChannelId::from("c1"),
                posts: vec![post("root", "c1", 0), reply("r1", "c1", "root", 2)],
                skip_add_to_channel: true,
            },
        );

        assert_eq!(order(&state, "c1"), vec!["a"]);
        assert!(state.posts.contains_key(&PostId::from("r1")));
        assert_eq!(thread(&state, "root"), vec!["r1"]);
    }

    #[test]
    fn test_skip_add_to_unknown_channel_creates_no_list() {
        let state = Arc::new(PostsState::default());
        let state = apply(
            &state,
            PostAction::ReceivedPosts {
                channel_id: ChannelId::from("c9"),
                posts: vec![post("a", "c9", 1)],
                skip_add_to_channel: true,
            },
        );
        assert!(!state.posts_in_channel.contains_key(&ChannelId::from("c9")));
    }

    #[test]
    fn test_remove_pending_post() {
        let state = Arc::new(PostsState::default());
        let state = receive(&state, "c1", vec![post("root", "c1", 1)]);
        let mut tmp = reply("tmp", "c1", "root", 5);
        tmp.pending_post_id = Some(PostId::from("tmp"));
        let state = apply(&state, PostAction::ReceivedNewPost(tmp));

        let state = apply(
            &state,
            PostAction::RemovePendingPost {
                id: PostId::from("tmp"),
                channel_id: ChannelId::from("c1"),
            },
        );

        assert!(!state.posts.contains_key(&PostId::from("tmp")));
        assert_eq!(order(&state, "c1"), vec!["root"]);
        assert!(thread(&state, "root").is_empty());
        assert!(state.pending_post_ids.is_empty());
    }

    #[test]
    fn test_remove_unknown_pending_post_is_noop() {
        let state = Arc::new(PostsState::default());
        let state = receive(&state, "c1", vec![post("a", "c1", 1)]);
        let next = apply(
            &state,
            PostAction::RemovePendingPost {
                id: PostId::from("nope"),
                channel_id: ChannelId::from("c1"),
            },
        );
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_post_deleted_tombstones_root_and_drops_replies() {
        let state = Arc::new(PostsState::default());
        let state = receive(
            &state,
            "c1",
            vec![
                post("root", "c1", 1),
                reply("r1", "c1", "root", 2),
                reply("r2", "c1", "root", 3),
                post("other", "c1", 4),
            ],
        );

        let state = apply(&state, PostAction::PostDeleted(post("root", "c1", 1)));

        assert!(state.posts[&PostId::from("root")].is_deleted());
        assert!(!state.posts.contains_key(&PostId::from("r1")));
        assert!(!state.posts.contains_key(&PostId::from("r2")));
        assert_eq!(order(&state, "c1"), vec!["other", "root"]);
        assert!(!state.posts_in_thread.contains_key(&PostId::from("root")));
    }

    #[test]
    fn test_post_deleted_drops_replies_known_only_by_thread() {
        let state = Arc::new(PostsState::default());
        let state = receive(&state, "c1", vec![post("root", "c1", 1)]);
        let state = apply(
            &state,
            PostAction::ReceivedPosts {
                channel_id: ChannelId::from("c1"),
                posts: vec![reply("r1", "c1", "root", 2)],
                skip_add_to_channel: true,
            },
        );

        let state = apply(&state, PostAction::PostDeleted(post("root", "c1", 1)));
        assert!(!state.posts.contains_key(&PostId::from("r1")));
    }

    #[test]
    fn test_deleting_reply_keeps_parent() {
        let state = Arc::new(PostsState::default());
        let state = receive(
            &state,
            "c1",
            vec![post("root", "c1", 1), reply("r1", "c1", "root", 2)],
        );

        let state = apply(&state, PostAction::PostDeleted(reply("r1", "c1", "root", 2)));
        assert!(state.posts.contains_key(&PostId::from("root")));
        assert!(!state.posts[&PostId::from("root")].is_deleted());
        assert_eq!(order(&state, "c1"), vec!["r1", "root"]);

        let state = apply(&state, PostAction::RemovePost(reply("r1", "c1", "root", 2)));
        assert!(state.posts.contains_key(&PostId::from("root")));
        assert_eq!(order(&state, "c1"), vec!["root"]);
        assert!(thread(&state, "root").is_empty());
    }

    #[test]
    fn test_remove_post_purges_post_and_replies() {
        let state = Arc::new(PostsState::default());
        let state = receive(
            &state,
            "c1",
            vec![
                post("root", "c1", 1),
                reply("r1", "c1", "root", 2),
                post("other", "c1", 3),
            ],
        );

        let state = apply(&state, PostAction::RemovePost(post("root", "c1", 1)));

        assert!(!state.posts.contains_key(&PostId::from("root")));
        assert!(!state.posts.contains_key(&PostId::from("r1")));
        assert_eq!(order(&state, "c1"), vec!["other"]);
        assert!(!state.posts_in_thread.contains_key(&PostId::from("root")));
    }

    #[test]
    fn test_post_deleted_unknown_is_noop() {
        let state = Arc::new(PostsState::default());
        let next = apply(&state, PostAction::PostDeleted(post("x", "c1", 1)));
        assert!(Arc::ptr_eq(&state, &next));
        let next = apply(&state, PostAction::RemovePost(post("x", "c1", 1)));
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_search_results_are_bucketed_per_channel() {
        let state = Arc::new(PostsState::default());
        let state = receive(&state, "c1", vec![post("a", "c1", 1)]);

        let results = vec![post("b", "c1", 5), post("x", "c2", 3), post("y", "c2", 4)];
        let list = PostList {
            order: results.iter().map(|p| p.id.clone()).collect(),
            posts: results.into_iter().map(|p| (p.id.clone(), p)).collect(),
        };
        let state = reduce(
            &state,
            &Action::Search(SearchAction::ReceivedSearchPosts(list)),
        );

        assert_eq!(order(&state, "c1"), vec!["b", "a"]);
        assert_eq!(order(&state, "c2"), vec!["y", "x"]);
    }

    #[test]
    fn test_reactions() {
        let state = Arc::new(PostsState::default());
        let smile = Reaction {
            user_id: "u1".into(),
            post_id: PostId::from("p1"),
            emoji_name: "smile".into(),
            create_at: 1,
        };

        let state = apply(&state, PostAction::ReceivedReaction(smile.clone()));
        assert!(state.reactions[&PostId::from("p1")].contains_key("u1-smile"));

        let state = apply(&state, PostAction::ReactionDeleted(smile.clone()));
        assert!(state.reactions[&PostId::from("p1")].is_empty());

        let next = apply(&state, PostAction::ReactionDeleted(smile));
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_messages_history_cursor() {
        let state = Arc::new(PostsState::default());
        let state = apply(&state, PostAction::AddMessageIntoHistory("one".into()));
        let state = apply(&state, PostAction::AddMessageIntoHistory("two".into()));
        assert_eq!(state.messages_history.index(MessageType::Post), 2);

        let state = apply(&state, PostAction::MoveHistoryIndexBack(MessageType::Post));
        assert_eq!(state.messages_history.current(MessageType::Post), Some("two"));
        let state = apply(&state, PostAction::MoveHistoryIndexBack(MessageType::Post));
        let state = apply(&state, PostAction::MoveHistoryIndexBack(MessageType::Post));
        assert_eq!(state.messages_history.current(MessageType::Post), Some("one"));
        assert_eq!(state.messages_history.index(MessageType::Comment), 2);

        let state = apply(&state, PostAction::MoveHistoryIndexForward(MessageType::Post));
        let state = apply(&state, PostAction::MoveHistoryIndexForward(MessageType::Post));
        let next = apply(&state, PostAction::MoveHistoryIndexForward(MessageType::Post));
        assert!(Arc::ptr_eq(&state, &next));
        assert_eq!(state.messages_history.current(MessageType::Post), None);
    }

    #[test]
    fn test_messages_history_is_bounded() {
        let mut state = Arc::new(PostsState::default());
        for i in 0..(MAX_PREV_MSGS + 5) {
            state = apply(&state, PostAction::AddMessageIntoHistory(format!("m{i}")));
        }
        assert_eq!(state.messages_history.messages.len(), MAX_PREV_MSGS);
        assert_eq!(state.messages_history.messages[0], "m5");
    }

    #[test]
    fn test_logout_clears_everything() {
        let state = Arc::new(PostsState::default());
        let state = receive(&state, "c1", vec![post("a", "c1", 1), reply("r", "c1", "a", 2)]);
        let state = apply(&state, PostAction::ReceivedPostSelected(Some(PostId::from("a"))));

        let state = reduce(&state, &Action::LogoutSuccess);
        assert_eq!(*state, PostsState::default());
    }

    #[test]
    fn test_selection_unchanged_returns_same_state() {
        let state = Arc::new(PostsState::default());
        let state = apply(&state, PostAction::ReceivedPostSelected(Some(PostId::from("a"))));
        let next = apply(&state, PostAction::ReceivedPostSelected(Some(PostId::from("a"))));
        assert!(Arc::ptr_eq(&state, &next));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn last_write_wins_regardless_of_arrival(mut versions in proptest::collection::vec(1i64..1_000, 1..20)) {
                versions.sort_unstable();
                versions.dedup();
                let newest = *versions.last().unwrap();

                let mut shuffled = versions.clone();
                shuffled.reverse();
                let half = shuffled.len() / 2;
                shuffled.rotate_left(half);

                let mut state = Arc::new(PostsState::default());
                for update_at in shuffled {
                    let mut p = post("a", "c1", 1);
                    p.update_at = update_at;
                    p.message = format!("v{update_at}");
                    state = receive(&state, "c1", vec![p]);
                }

                prop_assert_eq!(&state.posts[&PostId::from("a")].message, &format!("v{newest}"));
                prop_assert_eq!(state.posts_in_channel[&ChannelId::from("c1")].len(), 1);
            }

            #[test]
            fn channel_order_has_no_duplicates(create_ats in proptest::collection::vec(0i64..50, 1..30)) {
                let mut state = Arc::new(PostsState::default());
                for (i, create_at) in create_ats.iter().enumerate() {
                    let p = post(&format!("p{}", i % 7), "c1", *create_at);
                    state = receive(&state, "c1", vec![p]);
                }

                let list = &state.posts_in_channel[&ChannelId::from("c1")];
                let mut unique = list.clone();
                unique.sort();
                unique.dedup();
                prop_assert_eq!(unique.len(), list.len());

                let times: Vec<i64> = list.iter().map(|id| state.posts[id].create_at).collect();
                prop_assert!(times.windows(2).all(|w| w[0] >= w[1]));
            }
        }
    }
}
