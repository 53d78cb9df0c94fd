//! Schema of the offline snapshot file.
//!
//! The snapshot only caches server data, so a file written by an older build
//! is upgraded in place step by step. `user_version` records the last step
//! applied to the file.

pub mod v001_initial;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// Upgrade steps, oldest first. A file at `user_version` N has had the first
/// N steps applied.
const STEPS: [(&str, Step); 1] = [("v001_initial", v001_initial::up as Step)];

/// Bring the snapshot schema of `conn` up to the newest step.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let applied: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    tracing::debug!(applied, latest = STEPS.len(), "checking snapshot schema");

    for (version, (name, up)) in STEPS.iter().enumerate().skip(applied as usize) {
        tracing::info!(step = *name, "upgrading snapshot schema");
        up(conn).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        conn.pragma_update(None, "user_version", version as u32 + 1)?;
    }

    Ok(())
}
