//! Read-only views over a [`GlobalState`] snapshot.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use huddle_shared::{ChannelId, ChannelMember, Job, JobType, Post, PostId, TeamId, UserId, UserProfile};

use crate::reducers::jobs::JobsState;
use crate::reducers::requests::{RequestOp, RequestStatus};
use crate::state::GlobalState;

pub fn current_channel_id(state: &GlobalState) -> Option<&ChannelId> {
    state.entities.channels.current_channel_id.as_ref()
}

pub fn current_team_id(state: &GlobalState) -> Option<&TeamId> {
    state.entities.teams.current_team_id.as_ref()
}

pub fn current_user_id(state: &GlobalState) -> Option<&UserId> {
    state.entities.users.current_user_id.as_ref()
}

pub fn current_user(state: &GlobalState) -> Option<&UserProfile> {
    state.entities.users.current_user()
}

pub fn my_channel_memberships(state: &GlobalState) -> &HashMap<ChannelId, ChannelMember> {
    &state.entities.channels.my_members
}

pub fn my_current_channel_membership(state: &GlobalState) -> Option<&ChannelMember> {
    current_channel_id(state).and_then(|id| state.entities.channels.my_members.get(id))
}

/// Posts of a channel in display order.
pub fn posts_in_channel<'a>(state: &'a GlobalState, channel_id: &ChannelId) -> Vec<&'a Post> {
    state.entities.posts.posts_for_channel(channel_id)
}

/// Replies of `root_id` known to the cache, oldest first.
pub fn posts_in_thread<'a>(state: &'a GlobalState, root_id: &PostId) -> Vec<&'a Post> {
    let posts = &state.entities.posts;
    let mut replies: Vec<&Post> = posts
        .posts_in_thread
        .get(root_id)
        .map(|ids| ids.iter().filter_map(|id| posts.posts.get(id)).collect())
        .unwrap_or_default();
    replies.sort_by_key(|p| p.create_at);
    replies
}

/// Messages and mentions the current user has not seen in a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Unread {
    pub msg_count: u64,
    pub mention_count: u64,
}

impl Unread {
    pub fn is_unread(&self) -> bool {
        self.msg_count > 0 || self.mention_count > 0
    }
}

pub fn channel_unread(state: &GlobalState, channel_id: &ChannelId) -> Option<Unread> {
    let channels = &state.entities.channels;
    let channel = channels.channels.get(channel_id)?;
    let member = channels.my_members.get(channel_id)?;
    Some(Unread {
        msg_count: channel.total_msg_count.saturating_sub(member.msg_count),
        mention_count: member.mention_count,
    })
}

pub fn team_unreads(state: &GlobalState, team_id: &TeamId) -> Option<Unread> {
    let member = state.entities.teams.my_members.get(team_id)?;
    Some(Unread {
        msg_count: member.msg_count,
        mention_count: member.mention_count,
    })
}

pub fn jobs_by_type<'a>(state: &'a GlobalState, job_type: JobType) -> &'a [Job] {
    state
        .entities
        .jobs
        .jobs_by_type_list
        .get(&job_type)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

pub fn request_status(state: &GlobalState, op: RequestOp) -> RequestStatus {
    state.requests.status(op)
}

/// Whether any of the current user's roles grants `permission`.
pub fn have_permission(state: &GlobalState, permission: &str) -> bool {
    let Some(user) = current_user(state) else {
        return false;
    };
    let names: Vec<&str> = user.role_names().collect();
    state.entities.roles.has_permission(&names, permission)
}

/// Memoised [`jobs_by_type`] that only rebuilds its output when the jobs
/// slice was replaced.
#[derive(Debug)]
pub struct JobsByTypeSelector {
    job_type: JobType,
    cache: Mutex<Option<(Arc<JobsState>, Arc<Vec<Job>>)>>,
}

impl JobsByTypeSelector {
    pub fn new(job_type: JobType) -> Self {
        Self {
            job_type,
            cache: Mutex::new(None),
        }
    }

    pub fn select(&self, state: &GlobalState) -> Arc<Vec<Job>> {
        let jobs = &state.entities.jobs;
        let mut cache = self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some((input, output)) = cache.as_ref() {
            if Arc::ptr_eq(input, jobs) {
                return Arc::clone(output);
            }
        }
        let output = Arc::new(jobs.jobs_by_type_list.get(&self.job_type).cloned().unwrap_or_default());
        *cache = Some((Arc::clone(jobs), Arc::clone(&output)));
        output
    }
}
