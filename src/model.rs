use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub relative_path: String,
    pub facility_id: String,
    pub state: Option<String>,
    pub size_bytes: u64,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub report_count: usize,
    pub skipped_files: Vec<String>,
    pub reports: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentCounts {
    pub report_count: usize,
    pub processed: usize,
    pub skipped: usize,
    pub errored: usize,
    pub accidents_found: usize,
    pub needs_review: usize,
    pub rows_written: usize,
    pub rows_deduplicated: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub facility_id: String,
    pub path: String,
    pub error: String,
}

/// Extracted accident totals against a previous summary run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpectedComparison {
    pub expected_csv: String,
    pub expected_total: usize,
    pub extracted_total: usize,
    pub facilities_without_accidents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableCount {
    pub table: String,
    pub rows: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunPaths {
    pub data_root: String,
    pub input: String,
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub command: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub elapsed_seconds: f64,
    pub paths: RunPaths,
    #[serde(default)]
    pub settings: Vec<String>,
    #[serde(default)]
    pub counts: DocumentCounts,
    #[serde(default)]
    pub expected: Option<ExpectedComparison>,
    #[serde(default)]
    pub table_counts: Vec<TableCount>,
    #[serde(default)]
    pub needs_review: Vec<String>,
    #[serde(default)]
    pub failures: Vec<DocumentFailure>,
    #[serde(default)]
    pub warnings: Vec<String>,
}
