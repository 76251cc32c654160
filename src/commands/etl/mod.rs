use std::path::Path;

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::cli::{EtlArgs, GrammarVersion};
use crate::commands::{RunStamp, log_document_error};
use crate::keys::KeyRegistry;
use crate::model::{DocumentCounts, DocumentFailure, RunManifest, RunPaths, TableCount};
use crate::parse::{
    ACCIDENT_HISTORY_MARKER, BlockSplit, BlockSplitter, FieldExtractor, Grammar,
    PROCESS_CHEMICALS_HEADING, PROCESS_NAICS_HEADING, ProcessChemical, Segmenter,
    parse_accident_chemicals, parse_process_chemicals, parse_process_naics,
};
use crate::pdf_text::{ReportChromeFilter, extract_pages};
use crate::reports::discover_reports;
use crate::table_writer::TableWriter;
use crate::util::{ensure_directory, now_utc_string, write_json_pretty};

mod document;
mod run;
mod tables;
#[cfg(test)]
mod tests;

pub use run::run;

use document::*;
use tables::*;
