use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::load_catalog;
use crate::dataset::DB_FILENAME;

pub fn run(args: StatusArgs) -> Result<()> {
    info!(cache_root = %args.cache_root.display(), "status requested");

    let catalog = load_catalog(&args.cache_root, args.catalog_path.as_deref())?;
    info!(entries = catalog.datasets.len(), "preloaded catalog loaded");
    for entry in &catalog.datasets {
        let race_path = entry.directory.join(&entry.race_file);
        info!(
            name = %entry.name,
            display_name = %entry.display_name,
            race_file_present = race_path.exists(),
            "catalog entry"
        );
    }

    let db_path = args.cache_root.join(DB_FILENAME);
    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let datasets_count = query_count(&conn, "SELECT COUNT(*) FROM datasets").unwrap_or(0);
        let files_count = query_count(&conn, "SELECT COUNT(*) FROM dataset_files").unwrap_or(0);
        let schema_version: String = conn
            .query_row(
                "SELECT value FROM metadata WHERE key = 'db_schema_version'",
                [],
                |row| row.get(0),
            )
            .unwrap_or_default();

        info!(
            path = %db_path.display(),
            datasets = datasets_count,
            files = files_count,
            schema_version = %schema_version,
            "dataset store status"
        );
    } else {
        warn!(path = %db_path.display(), "dataset store missing");
    }

    Ok(())
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
