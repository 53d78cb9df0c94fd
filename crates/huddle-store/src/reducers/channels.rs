//! Channels, the current user's memberships and per-channel member tables.
//!
//! Counter updates for a channel or member we have not loaded yet are
//! dropped: the next full fetch brings authoritative numbers anyway.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use huddle_shared::{Channel, ChannelId, ChannelMember, ChannelStats, ChannelType, TeamId, UserId};

use crate::action::{Action, ChannelAction, UserAction};
use crate::reducers::{cleared, update_entry, with_entries, with_entry, without_entry};

pub type MembersByUser = HashMap<UserId, ChannelMember>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelsState {
    pub current_channel_id: Option<ChannelId>,
    pub channels: Arc<HashMap<ChannelId, Channel>>,
    pub channels_in_team: Arc<HashMap<TeamId, HashSet<ChannelId>>>,
    /// Current user's membership keyed by channel.
    pub my_members: Arc<HashMap<ChannelId, ChannelMember>>,
    pub members_in_channel: Arc<HashMap<ChannelId, MembersByUser>>,
    pub stats: Arc<HashMap<ChannelId, ChannelStats>>,
}

fn current_channel_id(state: &Option<ChannelId>, action: &ChannelAction) -> Option<ChannelId> {
    match action {
        ChannelAction::SelectChannel(id) => Some(id.clone()),
        _ => state.clone(),
    }
}

fn channels(
    state: &Arc<HashMap<ChannelId, Channel>>,
    action: &ChannelAction,
) -> Arc<HashMap<ChannelId, Channel>> {
    match action {
        ChannelAction::ReceivedChannel(channel) => {
            with_entry(state, channel.id.clone(), channel.clone())
        }
        ChannelAction::ReceivedChannels(list) => {
            with_entries(state, list.iter().cloned(), |c| c.id.clone())
        }
        ChannelAction::ReceivedChannelDeleted { id, .. } => without_entry(state, id),
        ChannelAction::UpdateChannelHeader { channel_id, header } => {
            update_entry(state, channel_id, |c| Channel {
                header: header.clone(),
                ..c.clone()
            })
        }
        ChannelAction::UpdateChannelPurpose {
            channel_id,
            purpose,
        } => update_entry(state, channel_id, |c| Channel {
            purpose: purpose.clone(),
            ..c.clone()
        }),
        ChannelAction::LeaveChannel {
            id, channel_type, ..
        } if *channel_type == ChannelType::Private => without_entry(state, id),
        ChannelAction::IncrementTotalMsgCount { channel_id, amount } => {
            update_entry(state, channel_id, |c| Channel {
                total_msg_count: c.total_msg_count + amount,
                ..c.clone()
            })
        }
        _ => Arc::clone(state),
    }
}

fn with_channel_in_team<'a>(
    state: &Arc<HashMap<TeamId, HashSet<ChannelId>>>,
    channels: impl IntoIterator<Item = &'a Channel>,
) -> Arc<HashMap<TeamId, HashSet<ChannelId>>> {
    let mut next: Option<HashMap<TeamId, HashSet<ChannelId>>> = None;
    for channel in channels {
        let known = state
            .get(&channel.team_id)
            .is_some_and(|set| set.contains(&channel.id));
        if known {
            continue;
        }
        next.get_or_insert_with(|| (**state).clone())
            .entry(channel.team_id.clone())
            .or_default()
            .insert(channel.id.clone());
    }
    next.map_or_else(|| Arc::clone(state), Arc::new)
}

fn without_channel_in_team(
    state: &Arc<HashMap<TeamId, HashSet<ChannelId>>>,
    team_id: &TeamId,
    channel_id: &ChannelId,
) -> Arc<HashMap<TeamId, HashSet<ChannelId>>> {
    if !state.get(team_id).is_some_and(|set| set.contains(channel_id)) {
        return Arc::clone(state);
    }
    let mut next = (**state).clone();
    if let Some(set) = next.get_mut(team_id) {
        set.remove(channel_id);
    }
    Arc::new(next)
}

fn channels_in_team(
    state: &Arc<HashMap<TeamId, HashSet<ChannelId>>>,
    action: &ChannelAction,
) -> Arc<HashMap<TeamId, HashSet<ChannelId>>> {
    match action {
        ChannelAction::ReceivedChannel(channel) => with_channel_in_team(state, [channel]),
        ChannelAction::ReceivedChannels(list) => with_channel_in_team(state, list),
        ChannelAction::ReceivedChannelDeleted { id, team_id } => {
            without_channel_in_team(state, team_id, id)
        }
        ChannelAction::LeaveChannel {
            id,
            team_id,
            channel_type,
            ..
        } if *channel_type == ChannelType::Private => without_channel_in_team(state, team_id, id),
        _ => Arc::clone(state),
    }
}

fn my_members(
    state: &Arc<HashMap<ChannelId, ChannelMember>>,
    action: &ChannelAction,
) -> Arc<HashMap<ChannelId, ChannelMember>> {
    match action {
        ChannelAction::ReceivedMyChannelMember(member) => {
            with_entry(state, member.channel_id.clone(), member.clone())
        }
        ChannelAction::ReceivedMyChannelMembers {
            members, remove, ..
        } => {
            if members.is_empty() && !remove.iter().any(|id| state.contains_key(id)) {
                return Arc::clone(state);
            }
            let mut next = (**state).clone();
            for id in remove {
                next.remove(id);
            }
            for member in members {
                next.insert(member.channel_id.clone(), member.clone());
            }
            if next == **state {
                return Arc::clone(state);
            }
            Arc::new(next)
        }
        ChannelAction::ReceivedChannelProps {
            channel_id,
            notify_props,
        } => update_entry(state, channel_id, |m| ChannelMember {
            notify_props: notify_props.clone(),
            ..m.clone()
        }),
        ChannelAction::IncrementUnreadMsgCount {
            channel_id,
            amount,
            only_mentions,
        } => {
            // Raising msg_count marks messages as read, which is only wanted
            // when plain messages must not make the channel unread.
            if !only_mentions {
                return Arc::clone(state);
            }
            update_entry(state, channel_id, |m| ChannelMember {
                msg_count: m.msg_count + amount,
                ..m.clone()
            })
        }
        ChannelAction::DecrementUnreadMsgCount { channel_id, amount } => {
            update_entry(state, channel_id, |m| ChannelMember {
                msg_count: m.msg_count + amount,
                ..m.clone()
            })
        }
        ChannelAction::ResetUnreadMsgCount {
            channel_id,
            msg_count,
        } => update_entry(state, channel_id, |m| ChannelMember {
            msg_count: *msg_count,
            ..m.clone()
        }),
        ChannelAction::IncrementUnreadMentionCount { channel_id, amount } => {
            update_entry(state, channel_id, |m| ChannelMember {
                mention_count: m.mention_count + amount,
                ..m.clone()
            })
        }
        ChannelAction::DecrementUnreadMentionCount { channel_id, amount } => {
            update_entry(state, channel_id, |m| ChannelMember {
                mention_count: m.mention_count.saturating_sub(*amount),
                ..m.clone()
            })
        }
        ChannelAction::ReceivedLastViewedAt {
            channel_id,
            last_viewed_at,
        } => update_entry(state, channel_id, |m| ChannelMember {
            last_viewed_at: *last_viewed_at,
            ..m.clone()
        }),
        ChannelAction::LeaveChannel { id, .. } | ChannelAction::ReceivedChannelDeleted { id, .. } => {
            without_entry(state, id)
        }
        _ => Arc::clone(state),
    }
}

fn without_member(
    state: &Arc<HashMap<ChannelId, MembersByUser>>,
    channel_id: &ChannelId,
    user_id: &UserId,
) -> Arc<HashMap<ChannelId, MembersByUser>> {
    if !state
        .get(channel_id)
        .is_some_and(|members| members.contains_key(user_id))
    {
        return Arc::clone(state);
    }
    let mut next = (**state).clone();
    if let Some(members) = next.get_mut(channel_id) {
        members.remove(user_id);
    }
    Arc::new(next)
}

fn is_stored(state: &HashMap<ChannelId, MembersByUser>, member: &ChannelMember) -> bool {
    state
        .get(&member.channel_id)
        .and_then(|members| members.get(&member.user_id))
        == Some(member)
}

/// Copy of `state` with `members` filed under their channel, or `state`
/// itself when every member is already stored as is.
fn with_members(
    state: &Arc<HashMap<ChannelId, MembersByUser>>,
    members: &[ChannelMember],
) -> Arc<HashMap<ChannelId, MembersByUser>> {
    if members.iter().all(|m| is_stored(state, m)) {
        return Arc::clone(state);
    }
    let mut next = (**state).clone();
    for member in members {
        next.entry(member.channel_id.clone())
            .or_default()
            .insert(member.user_id.clone(), member.clone());
    }
    Arc::new(next)
}

fn members_in_channel(
    state: &Arc<HashMap<ChannelId, MembersByUser>>,
    action: &Action,
) -> Arc<HashMap<ChannelId, MembersByUser>> {
    match action {
        Action::Channels(ChannelAction::ReceivedMyChannelMember(member))
        | Action::Channels(ChannelAction::ReceivedChannelMember(member)) => {
            with_members(state, std::slice::from_ref(member))
        }
        Action::Channels(ChannelAction::ReceivedMyChannelMembers {
            members,
            remove,
            current_user_id,
        }) => {
            let mut next = (**state).clone();
            if let Some(user_id) = current_user_id {
                for channel_id in remove {
                    if let Some(channel_members) = next.get_mut(channel_id) {
                        channel_members.remove(user_id);
                    }
                }
            }
            for member in members {
                next.entry(member.channel_id.clone())
                    .or_default()
                    .insert(member.user_id.clone(), member.clone());
            }
            if next == **state {
                return Arc::clone(state);
            }
            Arc::new(next)
        }
        Action::Channels(ChannelAction::ReceivedChannelMembers(members)) => with_members(state, members),
        Action::Channels(ChannelAction::LeaveChannel { id, user_id, .. }) => {
            without_member(state, id, user_id)
        }
        Action::Users(UserAction::ReceivedProfileNotInChannel {
            channel_id,
            user_id,
        }) => without_member(state, channel_id, user_id),
        _ => Arc::clone(state),
    }
}

fn stats(
    state: &Arc<HashMap<ChannelId, ChannelStats>>,
    action: &ChannelAction,
) -> Arc<HashMap<ChannelId, ChannelStats>> {
    match action {
        ChannelAction::ReceivedChannelStats(stat) => {
            with_entry(state, stat.channel_id.clone(), stat.clone())
        }
        ChannelAction::AddChannelMemberSuccess { channel_id } => {
            update_entry(state, channel_id, |s| ChannelStats {
                member_count: s.member_count + 1,
                ..s.clone()
            })
        }
        // Someone is still in the channel after a removal: the viewer.
        ChannelAction::RemoveChannelMemberSuccess { channel_id } => {
            update_entry(state, channel_id, |s| ChannelStats {
                member_count: s.member_count.saturating_sub(1).max(1),
                ..s.clone()
            })
        }
        _ => Arc::clone(state),
    }
}

pub fn reduce(state: &Arc<ChannelsState>, action: &Action) -> Arc<ChannelsState> {
    let channel_action = match action {
        Action::LogoutSuccess => return cleared(state),
        Action::Channels(a) => Some(a),
        Action::Users(UserAction::ReceivedProfileNotInChannel { .. }) => None,
        _ => return Arc::clone(state),
    };

    let members_in_channel = members_in_channel(&state.members_in_channel, action);
    let Some(channel_action) = channel_action else {
        if Arc::ptr_eq(&members_in_channel, &state.members_in_channel) {
            return Arc::clone(state);
        }
        return Arc::new(ChannelsState {
            members_in_channel,
            ..(**state).clone()
        });
    };

    if let ChannelAction::LeaveChannel { id, channel_type, .. } = channel_action {
        debug!(channel = %id, ?channel_type, "leaving channel");
    }

    let next = ChannelsState {
        current_channel_id: current_channel_id(&state.current_channel_id, channel_action),
        channels: channels(&state.channels, channel_action),
        channels_in_team: channels_in_team(&state.channels_in_team, channel_action),
        my_members: my_members(&state.my_members, channel_action),
        members_in_channel,
        stats: stats(&state.stats, channel_action),
    };

    if next.current_channel_id == state.current_channel_id
        && Arc::ptr_eq(&next.channels, &state.channels)
        && Arc::ptr_eq(&next.channels_in_team, &state.channels_in_team)
        && Arc::ptr_eq(&next.my_members, &state.my_members)
        && Arc::ptr_eq(&next.members_in_channel, &state.members_in_channel)
        && Arc::ptr_eq(&next.stats, &state.stats)
    {
        return Arc::clone(state);
    }

    Arc::new(next)
}
