use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    // Checkpoint every ~400KB instead of the default ~4MB — keeps WAL files small
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // Force-checkpoint any stale WAL data into the main DB on startup.
    // Errors are non-fatal — in-memory DBs and fresh files legitimately fail this.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::debug!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS runs (
            id                 TEXT PRIMARY KEY,
            video_id           TEXT NOT NULL DEFAULT '',
            created_at         TEXT NOT NULL DEFAULT (datetime('now')),
            window_secs        REAL NOT NULL,
            slide_secs         REAL NOT NULL,
            decay              TEXT NOT NULL DEFAULT 'none',
            max_moments        INTEGER NOT NULL,
            min_score          REAL NOT NULL DEFAULT 0.0,
            skipped_visual     INTEGER NOT NULL DEFAULT 0,
            skipped_speech     INTEGER NOT NULL DEFAULT 0,
            skipped_comment    INTEGER NOT NULL DEFAULT 0,
            skipped_engagement INTEGER NOT NULL DEFAULT 0,
            windows_scanned    INTEGER NOT NULL DEFAULT 0,
            events_indexed     INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS moments (
            id             TEXT PRIMARY KEY,
            run_id         TEXT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
            rank           INTEGER NOT NULL,
            start_secs     REAL NOT NULL,
            end_secs       REAL NOT NULL,
            score          REAL NOT NULL,
            sources        TEXT NOT NULL DEFAULT '',
            mag_visual     REAL NOT NULL DEFAULT 0.0,
            mag_speech     REAL NOT NULL DEFAULT 0.0,
            mag_comment    REAL NOT NULL DEFAULT 0.0,
            mag_engagement REAL NOT NULL DEFAULT 0.0
        );

        CREATE INDEX IF NOT EXISTS idx_runs_video ON runs(video_id);
        CREATE INDEX IF NOT EXISTS idx_moments_run ON moments(run_id);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<Option<i64>> {
    let mut stmt = conn.prepare("SELECT value FROM metadata WHERE key = 'schema_version'")?;
    let version = stmt
        .query_row([], |row| {
            let v: String = row.get(0)?;
            Ok(v.parse::<i64>().unwrap_or(0))
        })
        .ok();
    Ok(version)
}
