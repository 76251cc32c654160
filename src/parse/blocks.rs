use std::iter::Peekable;

use anyhow::{Context, Result};
use regex::{CaptureMatches, Regex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccidentBlock<'a> {
    /// 1-based position within the document.
    pub sequence: usize,
    /// Digits from the `Accident <N>` marker. Only a label, never an index.
    pub label: &'a str,
    pub text: &'a str,
    pub offset: usize,
}

pub enum BlockSplit<'a> {
    /// The section states there is nothing to report.
    NoRecords,
    /// Neither markers nor a "no records" phrase; needs a human look.
    Unrecognized,
    Blocks(AccidentBlocks<'a>),
}

pub struct BlockSplitter {
    marker: Regex,
    no_records: Regex,
}

impl BlockSplitter {
    pub fn new() -> Result<Self> {
        let marker = Regex::new(r"(?i)Accident History ID:\s*Accident\s+(\d+)")
            .context("failed to compile accident marker regex")?;
        let no_records = Regex::new(r"(?i)No records found|No accidents reported")
            .context("failed to compile no-records regex")?;
        Ok(Self { marker, no_records })
    }

    pub fn split<'a>(&'a self, section: &'a str) -> BlockSplit<'a> {
        if self.no_records.is_match(section) {
            return BlockSplit::NoRecords;
        }

        let mut markers = self.marker.captures_iter(section).peekable();
        let preamble_end = match markers.peek().and_then(|captures| captures.get(0)) {
            Some(first) => first.start(),
            None => return BlockSplit::Unrecognized,
        };

        BlockSplit::Blocks(AccidentBlocks {
            section,
            markers,
            preamble_end,
            sequence: 0,
        })
    }
}

/// Single pass over the accident blocks of one section.
pub struct AccidentBlocks<'a> {
    section: &'a str,
    markers: Peekable<CaptureMatches<'a, 'a>>,
    preamble_end: usize,
    sequence: usize,
}

impl<'a> AccidentBlocks<'a> {
    /// Text between the section start and the first marker.
    pub fn preamble(&self) -> &'a str {
        &self.section[..self.preamble_end]
    }
}

impl<'a> Iterator for AccidentBlocks<'a> {
    type Item = AccidentBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let captures = self.markers.next()?;
        let whole = captures.get(0)?;
        let label = captures.get(1).map(|value| value.as_str()).unwrap_or_default();
        let end = self
            .markers
            .peek()
            .and_then(|next| next.get(0))
            .map(|next| next.start())
            .unwrap_or(self.section.len());

        self.sequence += 1;
        Some(AccidentBlock {
            sequence: self.sequence,
            label,
            text: &self.section[whole.start()..end],
            offset: whole.start(),
        })
    }
}
