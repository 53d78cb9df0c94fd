//! Optimistic unread bookkeeping.
//!
//! Both entry points read one [`GlobalState`] snapshot and return a single
//! [`Action::Batch`] describing every counter change, so the channel, member
//! and team numbers move together in one dispatch. The server stays the
//! source of truth; the next full member fetch overwrites whatever these
//! produce.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use huddle_shared::{ChannelId, MarkUnread, TeamId, UserId};

use crate::action::{Action, ChannelAction, TeamAction};
use crate::state::GlobalState;

/// A new message arrived in `channel_id` that the current user has not seen.
pub fn mark_channel_as_unread(
    state: &GlobalState,
    team_id: &TeamId,
    channel_id: &ChannelId,
    mentions: &[UserId],
) -> Action {
    mark_channel_as_unread_by(state, team_id, channel_id, mentions, 1)
}

/// Same as [`mark_channel_as_unread`] for `amount` messages at once.
pub fn mark_channel_as_unread_by(
    state: &GlobalState,
    team_id: &TeamId,
    channel_id: &ChannelId,
    mentions: &[UserId],
    amount: u64,
) -> Action {
    let entities = &state.entities;
    let mentioned = entities
        .users
        .current_user_id
        .as_ref()
        .is_some_and(|me| mentions.contains(me));

    // In mention mode a plain message keeps the member caught up and never
    // reaches the team aggregate.
    let only_mentions = !mentioned
        && entities
            .channels
            .my_members
            .get(channel_id)
            .is_some_and(|m| m.notify_props.mark_unread == MarkUnread::Mention);

    let mut actions: Vec<Action> = vec![
        ChannelAction::IncrementTotalMsgCount {
            channel_id: channel_id.clone(),
            amount,
        }
        .into(),
        ChannelAction::IncrementUnreadMsgCount {
            channel_id: channel_id.clone(),
            amount,
            only_mentions,
        }
        .into(),
    ];

    if mentioned {
        actions.push(
            ChannelAction::IncrementUnreadMentionCount {
                channel_id: channel_id.clone(),
                amount,
            }
            .into(),
        );
    }

    let msg_amount = if only_mentions { 0 } else { amount };
    let mention_amount = if mentioned { amount } else { 0 };
    if msg_amount > 0 || mention_amount > 0 {
        actions.push(
            TeamAction::IncrementTeamUnreads {
                team_id: team_id.clone(),
                msg_amount,
                mention_amount,
            }
            .into(),
        );
    }

    debug!(channel = %channel_id, amount, mentioned, only_mentions, "marking channel unread");
    Action::Batch(actions)
}

/// The user viewed `channel_ids`: members catch up to their channel totals
/// and the team aggregates drop by what was unread.
///
/// Every number is taken from `state` up front and per-team deltas are
/// summed before anything is emitted, so the result does not depend on the
/// order of `channel_ids`.
pub fn mark_channels_as_read(state: &GlobalState, channel_ids: &[ChannelId]) -> Action {
    let channels = &state.entities.channels;
    let mut seen: HashSet<&ChannelId> = HashSet::new();
    let mut team_deltas: BTreeMap<&TeamId, (u64, u64)> = BTreeMap::new();
    let mut actions: Vec<Action> = Vec::new();

    for channel_id in channel_ids {
        if !seen.insert(channel_id) {
            continue;
        }
        let (Some(channel), Some(member)) = (
            channels.channels.get(channel_id),
            channels.my_members.get(channel_id),
        ) else {
            continue;
        };

        let msg_delta = channel.total_msg_count.saturating_sub(member.msg_count);
        let mention_delta = member.mention_count;

        actions.push(
            ChannelAction::ResetUnreadMsgCount {
                channel_id: channel_id.clone(),
                msg_count: channel.total_msg_count,
            }
            .into(),
        );
        actions.push(
            ChannelAction::DecrementUnreadMentionCount {
                channel_id: channel_id.clone(),
                amount: mention_delta,
            }
            .into(),
        );

        let entry = team_deltas.entry(&channel.team_id).or_default();
        entry.0 += msg_delta;
        entry.1 += mention_delta;
    }

    for (team_id, (msg_amount, mention_amount)) in team_deltas {
        if msg_amount == 0 && mention_amount == 0 {
            continue;
        }
        actions.push(
            TeamAction::DecrementTeamUnreads {
                team_id: team_id.clone(),
                msg_amount,
                mention_amount,
            }
            .into(),
        );
    }

    Action::Batch(actions)
}
