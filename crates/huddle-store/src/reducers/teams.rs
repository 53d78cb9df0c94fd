//! Teams and the current user's team memberships, which carry the team-wide
//! unread aggregates.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use huddle_shared::{Team, TeamId, TeamMember};

use crate::action::{Action, TeamAction};
use crate::reducers::{cleared, update_entry, with_entries};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamsState {
    pub current_team_id: Option<TeamId>,
    pub teams: Arc<HashMap<TeamId, Team>>,
    pub my_members: Arc<HashMap<TeamId, TeamMember>>,
}

fn my_members(
    state: &Arc<HashMap<TeamId, TeamMember>>,
    action: &TeamAction,
) -> Arc<HashMap<TeamId, TeamMember>> {
    match action {
        TeamAction::ReceivedMyTeamMembers(members) => {
            with_entries(state, members.iter().cloned(), |m| m.team_id.clone())
        }
        TeamAction::IncrementTeamUnreads {
            team_id,
            msg_amount,
            mention_amount,
        } => update_entry(state, team_id, |m| TeamMember {
            msg_count: m.msg_count + msg_amount,
            mention_count: m.mention_count + mention_amount,
            ..m.clone()
        }),
        TeamAction::DecrementTeamUnreads {
            team_id,
            msg_amount,
            mention_amount,
        } => update_entry(state, team_id, |m| TeamMember {
            msg_count: m.msg_count.saturating_sub(*msg_amount),
            mention_count: m.mention_count.saturating_sub(*mention_amount),
            ..m.clone()
        }),
        _ => Arc::clone(state),
    }
}

pub fn reduce(state: &Arc<TeamsState>, action: &Action) -> Arc<TeamsState> {
    let action = match action {
        Action::LogoutSuccess => return cleared(state),
        Action::Teams(a) => a,
        _ => return Arc::clone(state),
    };

    let current_team_id = match action {
        TeamAction::SelectTeam(id) => Some(id.clone()),
        _ => state.current_team_id.clone(),
    };
    let teams = match action {
        TeamAction::ReceivedTeams(list) => {
            with_entries(&state.teams, list.iter().cloned(), |t| t.id.clone())
        }
        _ => Arc::clone(&state.teams),
    };
    let my_members = my_members(&state.my_members, action);

    if current_team_id == state.current_team_id
        && Arc::ptr_eq(&teams, &state.teams)
        && Arc::ptr_eq(&my_members, &state.my_members)
    {
        return Arc::clone(state);
    }

    Arc::new(TeamsState {
        current_team_id,
        teams,
        my_members,
    })
}
