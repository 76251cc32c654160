use anyhow::{Context, Result};
use regex::Regex;
use tracing::warn;

pub const ACCIDENT_HISTORY_MARKER: &str = "Section 6. Accident History";
pub const DEFAULT_TERMINATORS: [&str; 3] =
    ["Section 7", "Section 8", "Section 9. Emergency Response"];

/// Byte offsets of one named section inside the concatenated document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone)]
pub struct DocumentSegments {
    pub text: String,
    pub span: Option<SectionSpan>,
    pub terminator: Option<String>,
    /// Zero-based indices of pages that carried no text.
    pub empty_pages: Vec<usize>,
}

impl DocumentSegments {
    /// Text before the accident-history marker, or the whole document when
    /// the marker is missing.
    pub fn pre_section(&self) -> &str {
        match self.span {
            Some(span) => &self.text[..span.start],
            None => &self.text,
        }
    }

    pub fn section(&self) -> Option<&str> {
        self.span.map(|span| &self.text[span.start..span.end])
    }
}

pub struct Segmenter {
    marker: Regex,
    terminators: Vec<(String, Regex)>,
    naics: Regex,
}

impl Segmenter {
    pub fn new() -> Result<Self> {
        Self::with_markers(ACCIDENT_HISTORY_MARKER, &DEFAULT_TERMINATORS)
    }

    pub fn with_markers(marker: &str, terminators: &[&str]) -> Result<Self> {
        let marker = literal_regex(marker)?;
        let terminators = terminators
            .iter()
            .map(|literal| Ok(((*literal).to_string(), literal_regex(literal)?)))
            .collect::<Result<Vec<_>>>()?;
        let naics = Regex::new(r"(?i)NAICS Code:\s*(\d+)")
            .context("failed to compile document NAICS regex")?;

        Ok(Self {
            marker,
            terminators,
            naics,
        })
    }

    /// Joins the non-empty pages and locates the accident-history section.
    /// Offsets are taken in the joined text so a marker and a terminator on
    /// the same page split mid-page.
    pub fn segment(&self, pages: &[String]) -> DocumentSegments {
        let mut text = String::new();
        let mut empty_pages = Vec::new();

        for (index, page) in pages.iter().enumerate() {
            if page.trim().is_empty() {
                warn!(page = index + 1, "skipping page without extractable text");
                empty_pages.push(index);
                continue;
            }
            text.push_str(page);
            text.push('\n');
        }

        let Some(marker) = self.marker.find(&text) else {
            return DocumentSegments {
                text,
                span: None,
                terminator: None,
                empty_pages,
            };
        };

        let mut end = text.len();
        let mut terminator = None;
        for (literal, pattern) in &self.terminators {
            let Some(found) = pattern.find_at(&text, marker.end()) else {
                continue;
            };
            if found.start() < end {
                end = found.start();
                terminator = Some(literal.clone());
            }
        }

        DocumentSegments {
            span: Some(SectionSpan {
                start: marker.start(),
                end,
            }),
            text,
            terminator,
            empty_pages,
        }
    }

    /// First `NAICS Code: <digits>` before the accident-history section.
    pub fn document_naics(&self, segments: &DocumentSegments) -> Option<String> {
        self.naics
            .captures(segments.pre_section())
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string())
    }
}

fn literal_regex(literal: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){}", regex::escape(literal)))
        .with_context(|| format!("failed to compile section marker regex for {literal:?}"))
}
