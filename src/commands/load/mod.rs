use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{Connection, params, params_from_iter};
use tracing::{debug, info, warn};

use crate::cli::{LoadArgs, ViewsArgs};
use crate::commands::RunStamp;
use crate::model::{DocumentCounts, RunManifest, RunPaths, TableCount};
use crate::parse::Grammar;
use crate::util::{ensure_parent_directory, now_utc_string, write_json_pretty};

mod import;
mod run;
mod schema;
#[cfg(test)]
mod tests;
mod views;

pub use run::{run, run_views};
pub(crate) use run::default_db_path;
pub(crate) use schema::table_counts;

use import::*;
use schema::*;
use views::*;
