//! `huddle-sync`: bring the offline snapshot up to date with the server.
//!
//! Loads the last snapshot, logs in (or reuses `HUDDLE_TOKEN`), refreshes
//! teams, channels, memberships and recent posts, then saves the result.

use anyhow::{Context, Result};

use huddle_client::actions::{channels, posts, roles, teams, users};
use huddle_client::{logging, Client, ClientConfig, ClientEvent};
use huddle_shared::constants::{APP_NAME, POST_CHUNK_SIZE};
use huddle_store::{selectors, SnapshotStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();
    tracing::info!("Starting {APP_NAME} sync");

    let config = ClientConfig::from_env();
    let client = Client::new(config.clone()).context("failed to build HTTP client")?;

    let mut events = client.subscribe();
    tokio::spawn(async move {
        while let Ok(ClientEvent::ServerVersionChanged { version }) = events.recv().await {
            tracing::info!(%version, "server version");
        }
    });

    let mut snapshots = SnapshotStore::new().context("failed to open snapshot database")?;
    let store = match snapshots.load()? {
        Some(state) => Store::new(state),
        None => Store::default(),
    };

    let me = match config.token {
        Some(_) => users::load_me(&client, &store).await?,
        None => {
            let login_id = std::env::var("HUDDLE_LOGIN_ID").context("HUDDLE_LOGIN_ID is not set")?;
            let password = std::env::var("HUDDLE_PASSWORD").context("HUDDLE_PASSWORD is not set")?;
            users::login(&client, &store, &login_id, &password).await?
        }
    };
    tracing::info!(user = %me.username, "signed in");

    let role_names: Vec<String> = me.role_names().map(str::to_string).collect();
    roles::load_roles_if_needed(&client, &store, &role_names).await?;

    let (my_teams, _) = teams::fetch_my_teams_and_members(&client, &store).await?;
    for team in &my_teams {
        let (my_channels, _) = channels::fetch_my_channels_and_members(&client, &store, &team.id).await?;
        for channel in &my_channels {
            if let Err(e) = posts::get_posts(&client, &store, &channel.id, 0, POST_CHUNK_SIZE).await {
                tracing::warn!(channel = %channel.id, error = %e, "skipping channel");
            }
        }
    }

    let state = store.get_state();
    for team in &my_teams {
        if let Some(unread) = selectors::team_unreads(&state, &team.id) {
            tracing::info!(
                team = %team.name,
                messages = unread.msg_count,
                mentions = unread.mention_count,
                "unread"
            );
        }
    }

    snapshots.save(&state).context("failed to save snapshot")?;
    tracing::info!(path = ?snapshots.path(), "snapshot saved");
    Ok(())
}
