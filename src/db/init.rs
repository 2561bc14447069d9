use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

pub fn init_db(db_path: &Path) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(db_path).context("Failed to open database connection")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS calls (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'active',
            start_time TEXT NOT NULL,
            end_time TEXT,
            audio_filename TEXT NOT NULL DEFAULT '',
            transcript TEXT NOT NULL DEFAULT '',
            entities TEXT NOT NULL DEFAULT '{}',
            outcome TEXT NOT NULL DEFAULT 'Pending',
            sentiment REAL NOT NULL DEFAULT 0.5,
            customer TEXT NOT NULL DEFAULT 'Unknown',
            phone TEXT NOT NULL DEFAULT 'N/A',
            duration TEXT NOT NULL DEFAULT 'N/A'
        )",
        [],
    )
    .context("Failed to create calls table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_calls_start_time ON calls(start_time)",
        [],
    )
    .context("Failed to create index on start_time")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_calls_status ON calls(status)",
        [],
    )
    .context("Failed to create calls status index")?;

    Ok(())
}
