use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use regex::Regex;

/// Runs `pdftotext` and returns one string per page, in page order.
/// Trailing blank pages (the form feed after the last page) are dropped;
/// interior blank pages are kept so callers can report them by index.
pub fn extract_pages(pdf_path: &Path, max_pages_per_doc: Option<usize>) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages_per_doc {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
}

pub fn split_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

/// Drops the running header and footer lines every RMP report page carries.
pub struct ReportChromeFilter {
    pattern: Regex,
}

impl ReportChromeFilter {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(
            r"Facility Name:|EPA Facility Identifier:|Plan Sequence Number:|Data displayed is accurate as of|Page \d+ of \d+",
        )
        .context("failed to compile report header/footer regex")?;
        Ok(Self { pattern })
    }

    /// Returns the trimmed, non-empty lines of `text` that are not page chrome.
    pub fn filter(&self, text: &str) -> String {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !self.pattern.is_match(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_pages_drops_trailing_blank_pages_only() {
        let pages = split_pages("first\u{000C}  \u{000C}third\u{0000}\u{000C}\n");
        assert_eq!(pages, vec!["first", "  ", "third"]);
    }

    #[test]
    fn chrome_filter_removes_headers_and_blank_lines() {
        let filter = ReportChromeFilter::new().expect("filter should compile");
        let text = "Facility Name: ACME Plant\n\n  Chemical Name: Ammonia  \nPage 3 of 12\nCAS Number: 7664-41-7\nData displayed is accurate as of 12:00 AM (EST) Jan 5, 2024";
        assert_eq!(
            filter.filter(text),
            "Chemical Name: Ammonia\nCAS Number: 7664-41-7"
        );
    }
}
