use anyhow::Result;
use tracing::{debug, warn};

use super::blocks::{BlockSplit, BlockSplitter};
use super::extract::{AccidentRecord, FieldExtractor};
use super::grammar::Grammar;
use super::segment::Segmenter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HasAccident {
    Yes,
    No,
}

impl HasAccident {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
        }
    }
}

/// How the accident-history section of one document resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOutcome {
    SectionAbsent,
    NoRecords,
    NeedsReview,
    Accidents(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccidentRow {
    pub facility_id: String,
    pub has_accident: HasAccident,
    pub accident_count: usize,
    pub naics_code: Option<String>,
    pub facility_accident_id: Option<String>,
    pub record: Option<AccidentRecord>,
}

impl AccidentRow {
    fn no_accident(facility_id: &str, naics_code: Option<String>) -> Self {
        Self {
            facility_id: facility_id.to_string(),
            has_accident: HasAccident::No,
            accident_count: 0,
            naics_code,
            facility_accident_id: None,
            record: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AssembledDocument {
    pub outcome: DocumentOutcome,
    pub naics_code: Option<String>,
    pub empty_pages: usize,
    pub rows: Vec<AccidentRow>,
}

/// Segmenter, splitter and extractor wired together for one grammar.
pub struct RecordAssembler {
    segmenter: Segmenter,
    splitter: BlockSplitter,
    extractor: FieldExtractor,
}

impl RecordAssembler {
    pub fn new(grammar: Grammar) -> Result<Self> {
        Ok(Self {
            segmenter: Segmenter::new()?,
            splitter: BlockSplitter::new()?,
            extractor: FieldExtractor::new(grammar)?,
        })
    }

    pub fn assemble(&self, facility_id: &str, pages: &[String]) -> AssembledDocument {
        let segments = self.segmenter.segment(pages);
        let naics_code = self.segmenter.document_naics(&segments);
        let empty_pages = segments.empty_pages.len();

        let Some(section) = segments.section() else {
            debug!(facility_id, "accident history section not found");
            return AssembledDocument {
                outcome: DocumentOutcome::SectionAbsent,
                rows: vec![AccidentRow::no_accident(facility_id, naics_code.clone())],
                naics_code,
                empty_pages,
            };
        };

        debug!(
            facility_id,
            terminator = segments.terminator.as_deref().unwrap_or("end of text"),
            "located accident history section"
        );

        let blocks = match self.splitter.split(section) {
            BlockSplit::NoRecords => {
                return AssembledDocument {
                    outcome: DocumentOutcome::NoRecords,
                    rows: vec![AccidentRow::no_accident(facility_id, naics_code.clone())],
                    naics_code,
                    empty_pages,
                };
            }
            BlockSplit::Unrecognized => {
                warn!(
                    facility_id,
                    "accident history section has no accident markers; flagged for review"
                );
                return AssembledDocument {
                    outcome: DocumentOutcome::NeedsReview,
                    rows: Vec::new(),
                    naics_code,
                    empty_pages,
                };
            }
            BlockSplit::Blocks(blocks) => blocks,
        };

        let extracted: Vec<(String, AccidentRecord)> = blocks
            .map(|block| {
                debug!(
                    facility_id,
                    sequence = block.sequence,
                    label = block.label,
                    offset = block.offset,
                    "extracting accident block"
                );
                (
                    format!("{facility_id}_{}", block.label),
                    self.extractor.extract(block.text),
                )
            })
            .collect();
        let accident_count = extracted.len();

        let rows = extracted
            .into_iter()
            .map(|(facility_accident_id, record)| AccidentRow {
                facility_id: facility_id.to_string(),
                has_accident: HasAccident::Yes,
                accident_count,
                naics_code: naics_code.clone(),
                facility_accident_id: Some(facility_accident_id),
                record: Some(record),
            })
            .collect();

        AssembledDocument {
            outcome: DocumentOutcome::Accidents(accident_count),
            rows,
            naics_code,
            empty_pages,
        }
    }
}
