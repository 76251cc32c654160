use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cli::{AccidentOutput, AccidentsArgs, UnparsedPolicy};
use crate::commands::{RunStamp, log_document_error};
use crate::model::{
    DocumentCounts, DocumentFailure, ExpectedComparison, RunManifest, RunPaths,
};
use crate::parse::{AssembledDocument, DocumentOutcome, Grammar, RecordAssembler};
use crate::pdf_text::extract_pages;
use crate::reports::{ReportFile, discover_reports};
use crate::table_writer::TableWriter;
use crate::util::{now_utc_string, write_json_pretty};

mod expected;
mod rows;
mod run;

pub use run::run;

use expected::*;
use rows::*;
