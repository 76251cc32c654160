//! Text parsing for RMP reports: section segmentation, accident block
//! splitting, labelled field extraction and the line parsers behind the
//! relational tables.

mod assemble;
mod blocks;
mod extract;
mod grammar;
mod labeled;
mod relational;
mod segment;
#[cfg(test)]
mod tests;

pub use assemble::{AssembledDocument, DocumentOutcome, RecordAssembler};
pub use blocks::{BlockSplit, BlockSplitter};
pub use extract::FieldExtractor;
pub use grammar::Grammar;
pub use relational::{
    PROCESS_CHEMICALS_HEADING, PROCESS_NAICS_HEADING, ProcessChemical, parse_accident_chemicals,
    parse_process_chemicals, parse_process_naics,
};
pub use segment::{ACCIDENT_HISTORY_MARKER, Segmenter};
