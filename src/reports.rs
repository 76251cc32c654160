use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::warn;

/// One RMP report on disk, identified by the facility id in its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub path: PathBuf,
    pub facility_id: String,
    pub state: Option<String>,
}

#[derive(Debug, Default)]
pub struct ReportDiscovery {
    pub reports: Vec<ReportFile>,
    pub skipped: Vec<PathBuf>,
}

pub fn filename_pattern() -> Result<Regex> {
    Regex::new(r"(?i)(\d+)\.pdf$").context("failed to compile report filename regex")
}

pub fn facility_id_from_filename(filename: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(filename)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str().to_string())
}

/// Walks `root` recursively and returns every `*.pdf` whose name ends in a
/// facility id. PDFs without one are returned in `skipped`.
pub fn discover_reports(root: &Path) -> Result<ReportDiscovery> {
    if !root.is_dir() {
        bail!("reports directory not found: {}", root.display());
    }

    let pattern = filename_pattern()?;
    let mut discovery = ReportDiscovery::default();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries =
            fs::read_dir(&dir).with_context(|| format!("failed to read {}", dir.display()))?;

        for entry in entries {
            let entry =
                entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
            let path = entry.path();
            let file_type = entry
                .file_type()
                .with_context(|| format!("failed to inspect file type: {}", path.display()))?;

            if file_type.is_dir() {
                pending.push(path);
                continue;
            }
            if !file_type.is_file() || !is_pdf(&path) {
                continue;
            }

            let filename = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            let Some(facility_id) = facility_id_from_filename(filename, &pattern) else {
                warn!(path = %path.display(), "skipping report without facility id in filename");
                discovery.skipped.push(path);
                continue;
            };

            let state = state_folder(root, &path);
            discovery.reports.push(ReportFile {
                path,
                facility_id,
                state,
            });
        }
    }

    discovery.reports.sort_by(|a, b| a.path.cmp(&b.path));
    discovery.skipped.sort();
    Ok(discovery)
}

fn is_pdf(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

fn state_folder(root: &Path, path: &Path) -> Option<String> {
    let parent = path.parent()?;
    if parent == root {
        return None;
    }
    parent
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
}
