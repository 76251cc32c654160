use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::load::{default_db_path, table_counts};
use crate::model::{ReportInventoryManifest, RunManifest};
use crate::util::read_json;

const RUN_COMMANDS: [&str; 4] = ["accidents", "etl", "dates", "load"];

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.data_root.join("manifests");
    let inventory_path = manifest_dir.join("report_inventory.json");
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.data_root));

    info!(data_root = %args.data_root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: ReportInventoryManifest = read_json(&inventory_path)?;
        info!(
            generated_at = %inventory.generated_at,
            source = %inventory.source_directory,
            reports = inventory.report_count,
            skipped_files = inventory.skipped_files.len(),
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    for command in RUN_COMMANDS {
        let Some(path) = latest_run_manifest(&manifest_dir, command)? else {
            warn!(command, "no run manifest found");
            continue;
        };
        let manifest: RunManifest = read_json(&path)?;
        info!(
            command,
            run_id = %manifest.run_id,
            status = %manifest.status,
            updated_at = %manifest.updated_at,
            processed = manifest.counts.processed,
            skipped = manifest.counts.skipped,
            errored = manifest.counts.errored,
            needs_review = manifest.counts.needs_review,
            rows = manifest.counts.rows_written,
            warnings = manifest.warnings.len(),
            "latest run"
        );
    }

    if db_path.exists() {
        let conn = Connection::open_with_flags(&db_path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let schema_version = metadata_value(&conn, "db_schema_version").unwrap_or_default();
        let views_updated_at = metadata_value(&conn, "views_updated_at").unwrap_or_default();
        info!(
            path = %db_path.display(),
            schema_version = %schema_version,
            views_updated_at = %views_updated_at,
            "database status"
        );
        for count in table_counts(&conn)? {
            info!(table = %count.table, rows = count.rows, "table");
        }
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Newest `<command>_run_<timestamp>.json`; compact timestamps sort by name.
fn latest_run_manifest(manifest_dir: &Path, command: &str) -> Result<Option<PathBuf>> {
    if !manifest_dir.is_dir() {
        return Ok(None);
    }

    let prefix = format!("{command}_run_");
    let mut latest: Option<PathBuf> = None;
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to list {}", manifest_dir.display()))?
    {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            continue;
        };
        if !name.starts_with(&prefix) || !name.ends_with(".json") {
            continue;
        }
        let newer = latest
            .as_ref()
            .and_then(|current| current.file_name())
            .is_none_or(|current| current < OsStr::new(name));
        if newer {
            latest = Some(path);
        }
    }
    Ok(latest)
}

fn metadata_value(conn: &Connection, key: &str) -> Option<String> {
    conn.query_row("SELECT value FROM metadata WHERE key = ?1", [key], |row| {
        row.get(0)
    })
    .ok()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::util::utc_compact_string;

    #[test]
    fn latest_run_manifest_picks_newest_for_command() {
        let dir = std::env::temp_dir().join(format!(
            "rmp-status-{}-{}",
            std::process::id(),
            utc_compact_string(Utc::now())
        ));
        fs::create_dir_all(&dir).expect("scratch dir should be created");
        for name in [
            "etl_run_20240101T000000Z.json",
            "etl_run_20240301T000000Z.json",
            "load_run_20250101T000000Z.json",
            "report_inventory.json",
        ] {
            fs::write(dir.join(name), "{}").expect("fixture should be written");
        }

        let latest = latest_run_manifest(&dir, "etl").expect("listing should succeed");
        assert_eq!(latest, Some(dir.join("etl_run_20240301T000000Z.json")));
        assert_eq!(
            latest_run_manifest(&dir, "dates").expect("listing should succeed"),
            None
        );

        fs::remove_dir_all(&dir).expect("cleanup");
    }

    #[test]
    fn missing_manifest_dir_has_no_runs() {
        let dir = std::env::temp_dir().join("rmp-status-does-not-exist");
        assert_eq!(
            latest_run_manifest(&dir, "load").expect("missing dir is not an error"),
            None
        );
    }
}
