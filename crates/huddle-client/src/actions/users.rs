use huddle_shared::{ChannelId, TeamId, UserProfile};
use huddle_store::{Action, RequestOp, Store, UserAction};

use crate::actions::bind_request;
use crate::client::Client;
use crate::error::Result;

pub async fn login(client: &Client, store: &Store, login_id: &str, password: &str) -> Result<UserProfile> {
    bind_request(
        client,
        store,
        RequestOp::Login,
        client.login(login_id, password),
        |me| vec![UserAction::ReceivedMe(me.clone()).into()],
    )
    .await
}

/// Log out and clear every entity. The local session ends even when the
/// server could not be told.
pub async fn logout(client: &Client, store: &Store) -> Result<()> {
    let result = bind_request(client, store, RequestOp::Logout, client.logout(), |_| {
        vec![Action::LogoutSuccess]
    })
    .await;

    if let Err(e) = &result {
        tracing::warn!(error = %e, "server logout failed, clearing local session anyway");
        client.set_token(None);
        store.dispatch(Action::LogoutSuccess);
    }
    result
}

pub async fn load_me(client: &Client, store: &Store) -> Result<UserProfile> {
    bind_request(client, store, RequestOp::GetMe, client.get_me(), |me| {
        vec![UserAction::ReceivedMe(me.clone()).into()]
    })
    .await
}

pub async fn get_profiles(client: &Client, store: &Store, page: u32, per_page: u32) -> Result<Vec<UserProfile>> {
    bind_request(
        client,
        store,
        RequestOp::GetProfiles,
        client.get_profiles(page, per_page),
        |profiles| vec![UserAction::ReceivedProfiles(profiles.clone()).into()],
    )
    .await
}

pub async fn get_profiles_in_channel(
    client: &Client,
    store: &Store,
    channel_id: &ChannelId,
    page: u32,
    per_page: u32,
) -> Result<Vec<UserProfile>> {
    bind_request(
        client,
        store,
        RequestOp::GetProfiles,
        client.get_profiles_in_channel(channel_id, page, per_page),
        |profiles| {
            vec![
                UserAction::ReceivedProfiles(profiles.clone()).into(),
                UserAction::ReceivedProfilesInChannel {
                    channel_id: channel_id.clone(),
                    user_ids: profiles.iter().map(|p| p.id.clone()).collect(),
                }
                .into(),
            ]
        },
    )
    .await
}

pub async fn get_profiles_not_in_channel(
    client: &Client,
    store: &Store,
    team_id: &TeamId,
    channel_id: &ChannelId,
    page: u32,
    per_page: u32,
) -> Result<Vec<UserProfile>> {
    bind_request(
        client,
        store,
        RequestOp::GetProfiles,
        client.get_profiles_not_in_channel(team_id, channel_id, page, per_page),
        |profiles| {
            vec![
                UserAction::ReceivedProfiles(profiles.clone()).into(),
                UserAction::ReceivedProfilesNotInChannel {
                    channel_id: channel_id.clone(),
                    user_ids: profiles.iter().map(|p| p.id.clone()).collect(),
                }
                .into(),
            ]
        },
    )
    .await
}
