use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use regex::Regex;
use tracing::{info, warn};

use crate::cli::DatesArgs;
use crate::commands::{RunStamp, log_document_error};
use crate::model::{DocumentCounts, DocumentFailure, RunManifest, RunPaths};
use crate::pdf_text::extract_pages;
use crate::reports::discover_reports;
use crate::table_writer::TableWriter;
use crate::util::{now_utc_string, write_json_pretty};

const DATES_HEADER: &[&str] = &[
    "EPA Facility ID",
    "State",
    "Report Received Date",
    "Report Created Date",
];

/// Receipt date from the first page and footer date from the last page.
pub struct ReportDateParser {
    receipt: Regex,
    footer: Regex,
}

impl ReportDateParser {
    pub fn new() -> Result<Self> {
        let receipt = Regex::new(r"Receipt Date:\s*([A-Za-z]+)\s+(\d{4})")
            .context("failed to compile receipt date regex")?;
        let footer = Regex::new(
            r"Data displayed is accurate as of 12:00 AM \(EST\)\s+([A-Za-z]+)\s+(\d{1,2}),\s+(\d{4})",
        )
        .context("failed to compile footer date regex")?;
        Ok(Self { receipt, footer })
    }

    /// `Receipt Date: April 2020` becomes the first of that month.
    pub fn received(&self, first_page: &str) -> Option<NaiveDate> {
        let captures = self.receipt.captures(first_page)?;
        let month = captures.get(1)?.as_str();
        let year = captures.get(2)?.as_str();
        NaiveDate::parse_from_str(&format!("1 {month} {year}"), "%d %B %Y").ok()
    }

    pub fn created(&self, last_page: &str) -> Option<NaiveDate> {
        let captures = self.footer.captures(last_page)?;
        let month = captures.get(1)?.as_str();
        let day = captures.get(2)?.as_str();
        let year = captures.get(3)?.as_str();
        NaiveDate::parse_from_str(&format!("{month} {day} {year}"), "%b %d %Y").ok()
    }

    pub fn dates(&self, pages: &[String]) -> (Option<NaiveDate>, Option<NaiveDate>) {
        let received = pages.first().and_then(|page| self.received(page));
        let created = pages.last().and_then(|page| self.created(page));
        (received, created)
    }
}

pub fn run(args: DatesArgs) -> Result<()> {
    let stamp = RunStamp::start();
    let run_id = stamp.run_id();
    let manifest_path = stamp.manifest_path(&args.data_root, "dates");
    let output_csv = args
        .output_csv
        .clone()
        .unwrap_or_else(|| args.data_root.join("rmp_dates_metadata.csv"));

    info!(
        run_id = %run_id,
        reports_dir = %args.reports_dir.display(),
        output = %output_csv.display(),
        "starting report date extraction"
    );

    let discovery = discover_reports(&args.reports_dir)?;
    let done = processed_facilities(&output_csv)?;
    let mut counts = DocumentCounts {
        report_count: discovery.reports.len(),
        skipped: discovery.skipped.len(),
        ..DocumentCounts::default()
    };

    let parser = ReportDateParser::new()?;
    let mut writer = TableWriter::open(&output_csv, DATES_HEADER, args.batch_size)?;
    let mut failures = Vec::new();
    let mut missing_dates = 0usize;

    for report in &discovery.reports {
        if done.contains(&report.facility_id) {
            counts.skipped += 1;
            continue;
        }

        let pages = match extract_pages(&report.path, None) {
            Ok(pages) => pages,
            Err(err) => {
                log_document_error(&report.facility_id, &report.path, &err);
                counts.errored += 1;
                failures.push(DocumentFailure {
                    facility_id: report.facility_id.clone(),
                    path: report.path.display().to_string(),
                    error: format!("{err:#}"),
                });
                continue;
            }
        };

        let (received, created) = parser.dates(&pages);
        if received.is_none() || created.is_none() {
            warn!(
                facility_id = %report.facility_id,
                received = received.is_some(),
                created = created.is_some(),
                "report date not found"
            );
            missing_dates += 1;
        }

        writer.push(vec![
            report.facility_id.clone(),
            report.state.clone().unwrap_or_default(),
            iso_date(received),
            iso_date(created),
        ])?;
        writer.finish_document()?;
        counts.processed += 1;
    }

    let written = writer.close()?;
    counts.rows_written = written.rows_written;

    let mut warnings = Vec::new();
    if !done.is_empty() {
        warnings.push(format!("{} facilities already present were skipped", done.len()));
    }
    if missing_dates > 0 {
        warnings.push(format!("{missing_dates} reports lacked a receipt or footer date"));
    }

    let manifest = RunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        command: "dates".to_string(),
        status: if counts.errored == 0 {
            "completed".to_string()
        } else {
            "completed_with_errors".to_string()
        },
        started_at: stamp.started_at(),
        updated_at: now_utc_string(),
        elapsed_seconds: stamp.elapsed_seconds(),
        paths: RunPaths {
            data_root: args.data_root.display().to_string(),
            input: args.reports_dir.display().to_string(),
            output: output_csv.display().to_string(),
        },
        settings: vec![format!("batch_size={}", args.batch_size)],
        counts,
        expected: None,
        table_counts: Vec::new(),
        needs_review: Vec::new(),
        failures,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        manifest = %manifest_path.display(),
        processed = manifest.counts.processed,
        skipped = manifest.counts.skipped,
        errored = manifest.counts.errored,
        "report date extraction completed"
    );

    Ok(())
}

fn iso_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Facility ids already written by an earlier, possibly interrupted, run.
fn processed_facilities(path: &Path) -> Result<HashSet<String>> {
    let has_content = path
        .metadata()
        .map(|metadata| metadata.len() > 0)
        .unwrap_or(false);
    if !has_content {
        return Ok(HashSet::new());
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut done = HashSet::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to read row in {}", path.display()))?;
        if let Some(facility_id) = record.get(0).filter(|id| !id.is_empty()) {
            done.insert(facility_id.to_string());
        }
    }

    info!(path = %path.display(), facilities = done.len(), "resuming date extraction");
    Ok(done)
}
