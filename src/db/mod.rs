pub mod calls;
pub mod init;
pub mod schemas;


pub use calls::{CallFilter, CallRepository};
pub use init::{init_db, migrate};
pub use schemas::{CallRecord, CallStatus, Outcome, DURATION_UNKNOWN, TIMESTAMP_FORMAT};

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Opens the database at `db_path` on the blocking pool and runs `f` with it.
pub async fn with_connection<F, T>(db_path: &Path, f: F) -> Result<T>
where
    F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db_path = db_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let conn = init_db(&db_path)?;
        f(&conn)
    })
    .await
    .context("Database task failed")?
}
