//! Every state transition the store understands.
//!
//! Actions are grouped per entity domain. Each slice reducer matches its own
//! sub-enum exhaustively, so adding a variant forces every handler that owns
//! it to be updated.

use std::collections::HashSet;

use huddle_shared::{
    Channel, ChannelId, ChannelMember, ChannelNotifyProps, ChannelStats, ChannelType, CustomEmoji,
    Job, JobType, Post, PostId, PostList, Reaction, Role, Team, TeamId, TeamMember, UserId,
    UserProfile,
};

use crate::reducers::errors::LoggedError;
use crate::reducers::posts::MessageType;
use crate::reducers::requests::{RequestOp, RequestPhase};

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Posts(PostAction),
    Channels(ChannelAction),
    Teams(TeamAction),
    Users(UserAction),
    Roles(RoleAction),
    Jobs(JobAction),
    Emojis(EmojiAction),
    Search(SearchAction),
    Errors(ErrorAction),
    Request(RequestAction),
    /// Process-wide reset: every entity slice is cleared.
    LogoutSuccess,
    /// Applied left to right within one dispatch.
    Batch(Vec<Action>),
    /// Outcome of tracked call `seq`: its data actions followed by its final
    /// phase. Applied like a batch, or dropped whole when the call was started
    /// before the last logout.
    Completed {
        op: RequestOp,
        seq: u64,
        actions: Vec<Action>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum PostAction {
    /// An edited post; replaces the stored copy without touching ordering.
    ReceivedPost(Post),
    /// A freshly created post (optimistic or from the event stream).
    ReceivedNewPost(Post),
    /// A page or sync batch for one channel.
    ReceivedPosts {
        channel_id: ChannelId,
        posts: Vec<Post>,
        /// Store the posts without touching the channel's order, used when
        /// loading thread context.
        skip_add_to_channel: bool,
    },
    RemovePendingPost {
        id: PostId,
        channel_id: ChannelId,
    },
    PostDeleted(Post),
    RemovePost(Post),
    ReceivedPostSelected(Option<PostId>),
    ReceivedFocusedPost(Option<PostId>),
    ReceivedReactions {
        post_id: PostId,
        reactions: Vec<Reaction>,
    },
    ReceivedReaction(Reaction),
    ReactionDeleted(Reaction),
    ReceivedOpenGraphMetadata {
        url: String,
        data: serde_json::Value,
    },
    AddMessageIntoHistory(String),
    ResetHistoryIndex(MessageType),
    MoveHistoryIndexBack(MessageType),
    MoveHistoryIndexForward(MessageType),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChannelAction {
    SelectChannel(ChannelId),
    ReceivedChannel(Channel),
    ReceivedChannels(Vec<Channel>),
    ReceivedChannelDeleted {
        id: ChannelId,
        team_id: TeamId,
    },
    UpdateChannelHeader {
        channel_id: ChannelId,
        header: String,
    },
    UpdateChannelPurpose {
        channel_id: ChannelId,
        purpose: String,
    },
    LeaveChannel {
        id: ChannelId,
        team_id: TeamId,
        channel_type: ChannelType,
        user_id: UserId,
    },
    IncrementTotalMsgCount {
        channel_id: ChannelId,
        amount: u64,
    },
    ReceivedMyChannelMember(ChannelMember),
    ReceivedMyChannelMembers {
        members: Vec<ChannelMember>,
        /// Channels the current user is no longer a member of.
        remove: Vec<ChannelId>,
        current_user_id: Option<UserId>,
    },
    ReceivedChannelMember(ChannelMember),
    ReceivedChannelMembers(Vec<ChannelMember>),
    ReceivedChannelProps {
        channel_id: ChannelId,
        notify_props: ChannelNotifyProps,
    },
    /// New messages arrived. With `only_mentions` the member's own
    /// `msg_count` follows the channel total so plain messages do not mark
    /// the channel unread.
    IncrementUnreadMsgCount {
        channel_id: ChannelId,
        amount: u64,
        only_mentions: bool,
    },
    /// Some messages were read without a full catch-up.
    DecrementUnreadMsgCount {
        channel_id: ChannelId,
        amount: u64,
    },
    /// The member caught up: `msg_count` is set to the given channel total.
    ResetUnreadMsgCount {
        channel_id: ChannelId,
        msg_count: u64,
    },
    IncrementUnreadMentionCount {
        channel_id: ChannelId,
        amount: u64,
    },
    DecrementUnreadMentionCount {
        channel_id: ChannelId,
        amount: u64,
    },
    ReceivedLastViewedAt {
        channel_id: ChannelId,
        last_viewed_at: i64,
    },
    ReceivedChannelStats(ChannelStats),
    AddChannelMemberSuccess {
        channel_id: ChannelId,
    },
    RemoveChannelMemberSuccess {
        channel_id: ChannelId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TeamAction {
    SelectTeam(TeamId),
    ReceivedTeams(Vec<Team>),
    ReceivedMyTeamMembers(Vec<TeamMember>),
    IncrementTeamUnreads {
        team_id: TeamId,
        msg_amount: u64,
        mention_amount: u64,
    },
    DecrementTeamUnreads {
        team_id: TeamId,
        msg_amount: u64,
        mention_amount: u64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum UserAction {
    ReceivedMe(UserProfile),
    ReceivedProfiles(Vec<UserProfile>),
    ReceivedProfilesInChannel {
        channel_id: ChannelId,
        user_ids: Vec<UserId>,
    },
    ReceivedProfilesNotInChannel {
        channel_id: ChannelId,
        user_ids: Vec<UserId>,
    },
    ReceivedProfileInChannel {
        channel_id: ChannelId,
        user_id: UserId,
    },
    ReceivedProfileNotInChannel {
        channel_id: ChannelId,
        user_id: UserId,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum RoleAction {
    ReceivedRoles(Vec<Role>),
    ReceivedRole(Role),
    RoleDeleted { name: String },
    /// Replaces the set of role names currently being fetched.
    SetPendingRoles(HashSet<String>),
    /// Marks names as being fetched. Names already loaded are skipped.
    AddPendingRoles(HashSet<String>),
    /// Releases names once their fetch finished, successfully or not.
    RemovePendingRoles(HashSet<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum JobAction {
    ReceivedJob(Job),
    ReceivedJobs(Vec<Job>),
    ReceivedJobsByType { job_type: JobType, jobs: Vec<Job> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmojiAction {
    ReceivedCustomEmoji(CustomEmoji),
    ReceivedCustomEmojis(Vec<CustomEmoji>),
    DeletedCustomEmoji { id: String },
    CustomEmojiDoesNotExist(String),
    ClearCustomEmojis,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchAction {
    ReceivedSearchPosts(PostList),
    ReceivedSearchFlaggedPosts(PostList),
    RemoveSearchPosts,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ErrorAction {
    LogError(LoggedError),
    DismissError(usize),
    ClearErrors,
}

/// One step of a tracked REST call. `seq` is issued by the store when the
/// request starts and carried by its completion.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestAction {
    pub op: RequestOp,
    pub phase: RequestPhase,
    pub seq: u64,
}

impl Action {
    pub fn request(op: RequestOp, phase: RequestPhase, seq: u64) -> Self {
        Action::Request(RequestAction { op, phase, seq })
    }
}

impl From<PostAction> for Action {
    fn from(a: PostAction) -> Self {
        Action::Posts(a)
    }
}

impl From<ChannelAction> for Action {
    fn from(a: ChannelAction) -> Self {
        Action::Channels(a)
    }
}

impl From<TeamAction> for Action {
    fn from(a: TeamAction) -> Self {
        Action::Teams(a)
    }
}

impl From<UserAction> for Action {
    fn from(a: UserAction) -> Self {
        Action::Users(a)
    }
}

impl From<RoleAction> for Action {
    fn from(a: RoleAction) -> Self {
        Action::Roles(a)
    }
}

impl From<JobAction> for Action {
    fn from(a: JobAction) -> Self {
        Action::Jobs(a)
    }
}

impl From<EmojiAction> for Action {
    fn from(a: EmojiAction) -> Self {
        Action::Emojis(a)
    }
}

impl From<SearchAction> for Action {
    fn from(a: SearchAction) -> Self {
        Action::Search(a)
    }
}
