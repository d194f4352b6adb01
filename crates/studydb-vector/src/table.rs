//! LanceDB connection helpers.
use anyhow::{anyhow, Context, Result};
use lancedb::{connect, Connection, Table};
use std::path::Path;

pub async fn open_db(uri: &str) -> Result<Connection> {
    Ok(connect(uri).execute().await?)
}

/// Open an existing table; a missing directory or table is an error, never
/// created on the fly.
pub async fn open_table(db_dir: &Path, name: &str) -> Result<Table> {
    if !db_dir.exists() {
        return Err(anyhow!("lancedb directory {} does not exist", db_dir.display()));
    }
    let conn = open_db(db_dir.to_string_lossy().as_ref()).await?;
    let names = conn.table_names().execute().await?;
    if !names.iter().any(|n| n == name) {
        return Err(anyhow!("table '{}' not found in {}", name, db_dir.display()));
    }
    conn.open_table(name).execute().await.with_context(|| format!("open table '{name}'"))
}
