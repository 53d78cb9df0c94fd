use huddle_shared::{Team, TeamMember};
use huddle_store::{RequestOp, Store, TeamAction};

use crate::actions::bind_request;
use crate::client::Client;
use crate::error::Result;

/// Teams of the current user together with the memberships carrying their
/// unread aggregates.
pub async fn fetch_my_teams_and_members(client: &Client, store: &Store) -> Result<(Vec<Team>, Vec<TeamMember>)> {
    bind_request(
        client,
        store,
        RequestOp::MyTeamMembers,
        async { futures::try_join!(client.get_my_teams(), client.get_my_team_members()) },
        |(teams, members)| {
            vec![
                TeamAction::ReceivedTeams(teams.clone()).into(),
                TeamAction::ReceivedMyTeamMembers(members.clone()).into(),
            ]
        },
    )
    .await
}

pub async fn fetch_my_team_members(client: &Client, store: &Store) -> Result<Vec<TeamMember>> {
    bind_request(
        client,
        store,
        RequestOp::MyTeamMembers,
        client.get_my_team_members(),
        |members| vec![TeamAction::ReceivedMyTeamMembers(members.clone()).into()],
    )
    .await
}

pub fn select_team(store: &Store, team: &Team) {
    store.dispatch(TeamAction::SelectTeam(team.id.clone()));
}
