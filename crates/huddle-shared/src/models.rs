//! Entity structs mirrored from the server.
//!
//! Field names follow the REST API's JSON so every struct can be decoded
//! straight from a response body. Unknown fields are ignored and missing
//! ones fall back to their defaults, since the server omits empty values.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::{empty_as_none, ChannelId, PostId, TeamId, UserId};

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

/// Display state stamped on a post by the client.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PostState {
    #[serde(rename = "DELETED")]
    Deleted,
}

/// A single message in a channel or thread.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Post {
    pub id: PostId,
    pub channel_id: ChannelId,
    pub user_id: UserId,
    /// Thread parent, `None` for top-level posts.
    #[serde(with = "empty_as_none")]
    pub root_id: Option<PostId>,
    /// Client-generated correlation id, echoed back by the server.
    #[serde(with = "empty_as_none")]
    pub pending_post_id: Option<PostId>,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
    pub message: String,
    #[serde(rename = "type")]
    pub post_type: String,
    pub props: serde_json::Map<String, serde_json::Value>,
    pub file_ids: Vec<String>,
    pub has_reactions: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PostState>,
    /// Set locally when creating the post failed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failed: bool,
}

impl Post {
    /// A post is pending while its id is still the client correlation id.
    pub fn is_pending(&self) -> bool {
        self.pending_post_id.as_ref() == Some(&self.id)
    }

    pub fn is_pending_or_failed(&self) -> bool {
        self.failed || self.is_pending()
    }

    pub fn is_deleted(&self) -> bool {
        self.state == Some(PostState::Deleted) || self.delete_at > 0
    }

    /// Neuter a post in place: it stays in the cache as a tombstone but loses
    /// its attachments and reactions.
    pub fn into_tombstone(self) -> Self {
        Self {
            state: Some(PostState::Deleted),
            file_ids: Vec::new(),
            has_reactions: false,
            ..self
        }
    }
}

/// Paged post response: ids in display order plus the post bodies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PostList {
    pub order: Vec<PostId>,
    pub posts: HashMap<PostId, Post>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Reaction {
    pub user_id: UserId,
    pub post_id: PostId,
    pub emoji_name: String,
    pub create_at: i64,
}

impl Reaction {
    /// Key under which a reaction is stored for its post.
    pub fn key(&self) -> String {
        format!("{}-{}", self.user_id, self.emoji_name)
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ChannelType {
    #[default]
    #[serde(rename = "O")]
    Open,
    #[serde(rename = "P")]
    Private,
    #[serde(rename = "D")]
    Direct,
    #[serde(rename = "G")]
    Group,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Channel {
    pub id: ChannelId,
    /// Empty for direct and group channels.
    pub team_id: TeamId,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub name: String,
    pub display_name: String,
    pub header: String,
    pub purpose: String,
    pub total_msg_count: u64,
    pub last_post_at: i64,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
}

/// When a channel counts as unread for the member.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MarkUnread {
    #[default]
    All,
    Mention,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ChannelNotifyProps {
    pub desktop: String,
    pub email: String,
    pub push: String,
    pub mark_unread: MarkUnread,
}

/// The current user's membership in one channel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ChannelMember {
    pub channel_id: ChannelId,
    pub user_id: UserId,
    pub roles: String,
    pub msg_count: u64,
    pub mention_count: u64,
    pub last_viewed_at: i64,
    pub notify_props: ChannelNotifyProps,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ChannelStats {
    pub channel_id: ChannelId,
    pub member_count: u64,
}

// ---------------------------------------------------------------------------
// Team
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
}

/// The current user's membership in a team, carrying the team-wide unread
/// aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct TeamMember {
    pub team_id: TeamId,
    pub user_id: UserId,
    pub roles: String,
    pub msg_count: u64,
    pub mention_count: u64,
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub nickname: String,
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub roles: String,
    pub locale: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
}

impl UserProfile {
    /// Role names assigned to the user, space separated on the wire.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.split_whitespace()
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub permissions: Vec<String>,
    pub scheme_managed: bool,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    DataRetention,
    ElasticsearchPostIndexing,
    LdapSync,
    MessageExport,
}

impl JobType {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::DataRetention => "data_retention",
            JobType::ElasticsearchPostIndexing => "elasticsearch_post_indexing",
            JobType::LdapSync => "ldap_sync",
            JobType::MessageExport => "message_export",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    #[default]
    Pending,
    InProgress,
    Success,
    Error,
    CancelRequested,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub create_at: i64,
    #[serde(default)]
    pub start_at: i64,
    #[serde(default)]
    pub last_activity_at: i64,
    #[serde(default)]
    pub status: JobStatus,
    #[serde(default)]
    pub progress: i64,
    #[serde(default)]
    pub data: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Emoji
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct CustomEmoji {
    pub id: String,
    pub creator_id: UserId,
    pub name: String,
    pub create_at: i64,
    pub update_at: i64,
    pub delete_at: i64,
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Metadata of an uploaded attachment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FileInfo {
    pub id: String,
    pub user_id: UserId,
    #[serde(with = "empty_as_none")]
    pub post_id: Option<PostId>,
    pub name: String,
    pub extension: String,
    pub size: u64,
    pub mime_type: String,
    pub create_at: i64,
}

/// Result of a multipart upload. `client_ids` echo the correlation ids sent
/// with each file, in the same order as `file_infos`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct FileUploadResponse {
    pub file_infos: Vec<FileInfo>,
    pub client_ids: Vec<String>,
}
