use std::collections::HashSet;

use huddle_shared::{Channel, ChannelId, ChannelMember, ChannelNotifyProps, ChannelStats, TeamId, UserId};
use huddle_store::{unreads, Action, ChannelAction, RequestOp, Store};

use crate::actions::bind_request;
use crate::client::Client;
use crate::error::Result;

/// Channels of `team_id` the current user belongs to, plus their
/// memberships. Memberships of this team missing from the response are
/// dropped.
pub async fn fetch_my_channels_and_members(
    client: &Client,
    store: &Store,
    team_id: &TeamId,
) -> Result<(Vec<Channel>, Vec<ChannelMember>)> {
    bind_request(
        client,
        store,
        RequestOp::MyChannels,
        async {
            futures::try_join!(
                client.get_my_channels(team_id),
                client.get_my_channel_members(team_id)
            )
        },
        |(channels, members)| {
            let state = store.get_state();
            let returned: HashSet<&ChannelId> = members.iter().map(|m| &m.channel_id).collect();
            let known = &state.entities.channels;
            let remove: Vec<ChannelId> = known
                .my_members
                .keys()
                .filter(|id| !returned.contains(id))
                .filter(|id| known.channels.get(*id).is_some_and(|c| &c.team_id == team_id))
                .cloned()
                .collect();
            if !remove.is_empty() {
                tracing::debug!(team = %team_id, removed = remove.len(), "dropping stale channel memberships");
            }

            vec![
                ChannelAction::ReceivedChannels(channels.clone()).into(),
                ChannelAction::ReceivedMyChannelMembers {
                    members: members.clone(),
                    remove,
                    current_user_id: state.entities.users.current_user_id.clone(),
                }
                .into(),
            ]
        },
    )
    .await
}

pub fn select_channel(store: &Store, channel_id: &ChannelId) {
    store.dispatch(ChannelAction::SelectChannel(channel_id.clone()));
}

/// Switch to `channel_id`: the server marks it (and the channel being left)
/// read, and the local counters catch up the same way.
pub async fn view_channel(
    client: &Client,
    store: &Store,
    channel_id: &ChannelId,
    prev_channel_id: Option<&ChannelId>,
) -> Result<()> {
    bind_request(
        client,
        store,
        RequestOp::ViewChannel,
        client.view_channel(channel_id, prev_channel_id),
        |_| {
            let mut read: Vec<ChannelId> = vec![channel_id.clone()];
            read.extend(prev_channel_id.filter(|id| !id.is_empty()).cloned());

            let now = chrono::Utc::now().timestamp_millis();
            let mut actions = vec![unreads::mark_channels_as_read(&store.get_state(), &read)];
            actions.extend(read.into_iter().map(|id| {
                Action::from(ChannelAction::ReceivedLastViewedAt {
                    channel_id: id,
                    last_viewed_at: now,
                })
            }));
            actions
        },
    )
    .await
}

pub async fn update_channel_notify_props(
    client: &Client,
    store: &Store,
    user_id: &UserId,
    channel_id: &ChannelId,
    props: ChannelNotifyProps,
) -> Result<()> {
    bind_request(
        client,
        store,
        RequestOp::UpdateChannelNotifyProps,
        client.update_channel_notify_props(channel_id, user_id, &props),
        |_| {
            vec![ChannelAction::ReceivedChannelProps {
                channel_id: channel_id.clone(),
                notify_props: props.clone(),
            }
            .into()]
        },
    )
    .await
}

pub async fn get_channel_stats(client: &Client, store: &Store, channel_id: &ChannelId) -> Result<ChannelStats> {
    bind_request(
        client,
        store,
        RequestOp::GetChannelStats,
        client.get_channel_stats(channel_id),
        |stats| vec![ChannelAction::ReceivedChannelStats(stats.clone()).into()],
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::{teams, users};
    use crate::config::ClientConfig;
    use crate::testing::spawn_server;
    use huddle_store::{selectors, RequestStatus};

    #[tokio::test]
    async fn test_fetch_then_view_marks_read() {
        let server = spawn_server().await;
        let client = Client::new(ClientConfig::new(server.url.clone())).unwrap();
        let store = Store::default();
        let t1 = TeamId::from("t1");
        let c1 = ChannelId::from("c1");

        users::login(&client, &store, "alice", "secret").await.unwrap();
        teams::fetch_my_teams_and_members(&client, &store).await.unwrap();
        fetch_my_channels_and_members(&client, &store, &t1).await.unwrap();

        let state = store.get_state();
        let unread = selectors::channel_unread(&state, &c1).unwrap();
        assert_eq!((unread.msg_count, unread.mention_count), (2, 1));

        view_channel(&client, &store, &c1, None).await.unwrap();

        let state = store.get_state();
        assert_eq!(state.requests.status(RequestOp::ViewChannel), RequestStatus::Success);
        assert!(!selectors::channel_unread(&state, &c1).unwrap().is_unread());
        let team = selectors::team_unreads(&state, &t1).unwrap();
        assert_eq!((team.msg_count, team.mention_count), (0, 0));
        assert!(state.entities.channels.my_members[&c1].last_viewed_at > 0);
    }

    #[tokio::test]
    async fn test_refetch_drops_memberships_no_longer_returned() {
        let server = spawn_server().await;
        let client = Client::new(ClientConfig::new(server.url.clone())).unwrap();
        let store = Store::default();
        let t1 = TeamId::from("t1");

        store.dispatch(Action::Batch(vec![
            ChannelAction::ReceivedChannel(Channel {
                id: ChannelId::from("gone"),
                team_id: t1.clone(),
                ..Default::default()
            })
            .into(),
            ChannelAction::ReceivedMyChannelMember(ChannelMember {
                channel_id: ChannelId::from("gone"),
                ..Default::default()
            })
            .into(),
        ]));

        fetch_my_channels_and_members(&client, &store, &t1).await.unwrap();

        let state = store.get_state();
        assert!(!state.entities.channels.my_members.contains_key(&ChannelId::from("gone")));
        assert_eq!(state.entities.channels.my_members.len(), 2);
    }
}
