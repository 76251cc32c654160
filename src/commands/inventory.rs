use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::model::{ReportEntry, ReportInventoryManifest};
use crate::reports::discover_reports;
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.reports_dir)?;

    if args.dry_run {
        info!(
            report_count = manifest.report_count,
            skipped = manifest.skipped_files.len(),
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args.manifest_path.unwrap_or_else(|| {
        args.data_root
            .join("manifests")
            .join("report_inventory.json")
    });

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(report_count = manifest.report_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(reports_dir: &Path) -> Result<ReportInventoryManifest> {
    let discovery = discover_reports(reports_dir)?;

    if discovery.reports.is_empty() {
        bail!("no RMP reports found in {}", reports_dir.display());
    }

    let mut reports = Vec::with_capacity(discovery.reports.len());
    for report in &discovery.reports {
        let size_bytes = report
            .path
            .metadata()
            .with_context(|| format!("failed to stat {}", report.path.display()))?
            .len();
        if size_bytes == 0 {
            warn!(path = %report.path.display(), "report file is empty");
        }

        reports.push(ReportEntry {
            relative_path: relative_display(reports_dir, &report.path),
            facility_id: report.facility_id.clone(),
            state: report.state.clone(),
            size_bytes,
            sha256: sha256_file(&report.path)?,
        });
    }

    reports.sort_by(|a, b| {
        a.facility_id
            .cmp(&b.facility_id)
            .then(a.relative_path.cmp(&b.relative_path))
    });

    Ok(ReportInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: reports_dir.display().to_string(),
        report_count: reports.len(),
        skipped_files: discovery
            .skipped
            .iter()
            .map(|path| relative_display(reports_dir, path))
            .collect(),
        reports,
    })
}

fn relative_display(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::Utc;

    use super::*;
    use crate::util::utc_compact_string;

    #[test]
    fn manifest_lists_reports_and_skipped_files() {
        let root = std::env::temp_dir().join(format!(
            "rmp-inventory-{}-{}",
            std::process::id(),
            utc_compact_string(Utc::now())
        ));
        fs::create_dir_all(root.join("OH")).expect("state dir should be created");
        fs::write(root.join("OH").join("100000012345.pdf"), b"%PDF-1.4").expect("fixture");
        fs::write(root.join("summary.pdf"), b"%PDF-1.4").expect("fixture");

        let manifest = build_manifest(&root).expect("manifest should build");

        assert_eq!(manifest.report_count, 1);
        assert_eq!(manifest.reports[0].facility_id, "100000012345");
        assert_eq!(manifest.reports[0].state.as_deref(), Some("OH"));
        assert_eq!(manifest.reports[0].size_bytes, 8);
        assert_eq!(manifest.reports[0].sha256.len(), 64);
        assert_eq!(manifest.skipped_files, vec!["summary.pdf".to_string()]);

        fs::remove_dir_all(&root).expect("cleanup");
    }

    #[test]
    fn empty_reports_directory_is_an_error() {
        let root = std::env::temp_dir().join(format!(
            "rmp-inventory-empty-{}-{}",
            std::process::id(),
            utc_compact_string(Utc::now())
        ));
        fs::create_dir_all(&root).expect("scratch dir should be created");

        assert!(build_manifest(&root).is_err());

        fs::remove_dir_all(&root).expect("cleanup");
    }
}
