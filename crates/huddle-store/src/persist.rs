//! Offline snapshot of the entity tree.
//!
//! Entity slices are stored as JSON, one row each, in a small SQLite file.
//! Request statuses and logged errors describe the running process and are
//! never persisted.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use directories::ProjectDirs;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::reducers::roles::RolesState;
use crate::state::{EntitiesState, GlobalState};

const SLICE_USERS: &str = "users";
const SLICE_TEAMS: &str = "teams";
const SLICE_CHANNELS: &str = "channels";
const SLICE_POSTS: &str = "posts";
const SLICE_ROLES: &str = "roles";
const SLICE_JOBS: &str = "jobs";
const SLICE_EMOJIS: &str = "emojis";
const SLICE_SEARCH: &str = "search";

pub struct SnapshotStore {
    conn: Connection,
}

impl SnapshotStore {
    /// Open (or create) the snapshot database in the platform data directory:
    /// - Linux:   `~/.local/share/huddle/huddle.db`
    /// - macOS:   `~/Library/Application Support/com.huddle.huddle/huddle.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\huddle\huddle\data\huddle.db`
    pub fn new() -> Result<Self> {
        let project_dirs =
            ProjectDirs::from("com", "huddle", "huddle").ok_or(StoreError::NoDataDir)?;

        let data_dir = project_dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        let db_path = data_dir.join("huddle.db");
        tracing::info!(path = %db_path.display(), "opening snapshot database");

        Self::open_at(&db_path)
    }

    /// Open (or create) a snapshot database at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().map(PathBuf::from)
    }

    /// Persist every entity slice in one transaction.
    pub fn save(&mut self, state: &GlobalState) -> Result<()> {
        let entities = &state.entities;
        // In-flight role loads do not survive a restart.
        let roles = RolesState {
            pending: Arc::default(),
            ..(*entities.roles).clone()
        };

        let rows = [
            (SLICE_USERS, encode(&entities.users)?),
            (SLICE_TEAMS, encode(&entities.teams)?),
            (SLICE_CHANNELS, encode(&entities.channels)?),
            (SLICE_POSTS, encode(&entities.posts)?),
            (SLICE_ROLES, encode(&roles)?),
            (SLICE_JOBS, encode(&entities.jobs)?),
            (SLICE_EMOJIS, encode(&entities.emojis)?),
            (SLICE_SEARCH, encode(&entities.search)?),
        ];

        let saved_at = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO snapshots (slice, json, saved_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(slice) DO UPDATE SET json = excluded.json, saved_at = excluded.saved_at",
            )?;
            for (slice, json) in &rows {
                stmt.execute(params![slice, json, saved_at])?;
            }
        }
        tx.commit()?;

        tracing::debug!(slices = rows.len(), "saved snapshot");
        Ok(())
    }

    /// Rehydrate the last saved snapshot, or `None` when nothing was saved.
    ///
    /// A slice that no longer decodes is replaced by its empty default; the
    /// next sync refills it.
    pub fn load(&self) -> Result<Option<GlobalState>> {
        let mut stmt = self.conn.prepare("SELECT slice, json FROM snapshots")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;

        if rows.is_empty() {
            return Ok(None);
        }

        let entities = EntitiesState {
            users: decode(&rows, SLICE_USERS),
            teams: decode(&rows, SLICE_TEAMS),
            channels: decode(&rows, SLICE_CHANNELS),
            posts: decode(&rows, SLICE_POSTS),
            roles: decode(&rows, SLICE_ROLES),
            jobs: decode(&rows, SLICE_JOBS),
            emojis: decode(&rows, SLICE_EMOJIS),
            search: decode(&rows, SLICE_SEARCH),
        };

        tracing::info!(slices = rows.len(), "loaded snapshot");
        Ok(Some(GlobalState::with_entities(entities)))
    }

    /// Drop the saved snapshot, used on logout.
    pub fn clear(&self) -> Result<()> {
        let removed = self.conn.execute("DELETE FROM snapshots", [])?;
        tracing::info!(removed, "cleared snapshot");
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned + Default>(rows: &HashMap<String, String>, slice: &str) -> Arc<T> {
    let Some(json) = rows.get(slice) else {
        return Arc::default();
    };
    match serde_json::from_str(json) {
        Ok(value) => Arc::new(value),
        Err(e) => {
            tracing::warn!(slice, error = %e, "discarding undecodable snapshot slice");
            Arc::default()
        }
    }
}
