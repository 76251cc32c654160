use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "rmp",
    version,
    about = "EPA Risk Management Plan report scraping and loading tools"
)]
pub struct Cli {
    /// Append diagnostics to this file in addition to stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Accidents(AccidentsArgs),
    Etl(EtlArgs),
    Dates(DatesArgs),
    Load(LoadArgs),
    Views(ViewsArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    #[arg(long, default_value = ".cache/rmp")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AccidentsArgs {
    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    #[arg(long, default_value = ".cache/rmp")]
    pub data_root: PathBuf,

    /// Destination CSV; defaults to a name derived from the output mode.
    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = AccidentOutput::Summary)]
    pub output: AccidentOutput,

    #[arg(long, value_enum, default_value_t = GrammarVersion::V2)]
    pub grammar: GrammarVersion,

    #[arg(long, value_enum, default_value_t = UnparsedPolicy::Null)]
    pub unparsed_policy: UnparsedPolicy,

    /// Number of documents between flushes of the output buffer.
    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,

    /// Skip rows whose value in this column already exists in the destination.
    /// Rows with an empty value are always written.
    #[arg(long)]
    pub dedup_key_column: Option<String>,

    /// Summary CSV from a previous run; restricts processing to facilities
    /// reported with accidents and cross-checks accident totals.
    #[arg(long)]
    pub expected_csv: Option<PathBuf>,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum AccidentOutput {
    Summary,
    Detailed,
}

impl AccidentOutput {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Detailed => "detailed",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum GrammarVersion {
    V1,
    V2,
}

impl GrammarVersion {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V2 => "v2",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum UnparsedPolicy {
    /// Label found but value malformed renders as an empty cell.
    Null,
    /// Label found but value malformed renders as `[unparsed]`.
    Marker,
}

#[derive(Args, Debug, Clone)]
pub struct EtlArgs {
    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    #[arg(long, default_value = ".cache/rmp")]
    pub data_root: PathBuf,

    /// Directory for the relational CSVs; defaults to `<data-root>/relational`.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct DatesArgs {
    #[arg(long, default_value = "reports")]
    pub reports_dir: PathBuf,

    #[arg(long, default_value = ".cache/rmp")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    #[arg(long, default_value_t = 100)]
    pub batch_size: usize,
}

#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    #[arg(long, default_value = ".cache/rmp")]
    pub data_root: PathBuf,

    /// Directory holding the relational CSVs; defaults to `<data-root>/relational`.
    #[arg(long)]
    pub csv_dir: Option<PathBuf>,

    /// Facility listing CSV (`rmp_facility.csv`); defaults to `<csv-dir>/rmp_facility.csv`.
    #[arg(long)]
    pub facility_csv: Option<PathBuf>,

    /// Detailed accident CSV produced by `accidents --output detailed`.
    #[arg(long)]
    pub detail_csv: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = GrammarVersion::V2)]
    pub grammar: GrammarVersion,

    #[arg(long, default_value_t = false)]
    pub skip_views: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ViewsArgs {
    #[arg(long, default_value = ".cache/rmp")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/rmp")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
