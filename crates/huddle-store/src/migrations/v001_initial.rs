//! v001 -- Initial schema: one row per persisted entity slice.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS snapshots (
    slice    TEXT PRIMARY KEY NOT NULL,   -- entity slice name, e.g. "posts"
    json     TEXT NOT NULL,               -- serde_json encoding of the slice
    saved_at TEXT NOT NULL                -- RFC-3339
);
"#;

pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(UP_SQL)
}
