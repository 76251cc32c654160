use super::*;

const ETL_TERMINATORS: [&str; 2] = ["Section 7", "Section 9. Emergency Response"];

const DATE_COLUMN: &str = "Date of Accident";
const TIME_COLUMN: &str = "Time Accident Began";
const PROCESS_NAICS_COLUMN: &str = "NAICS Code of Process Involved";
const NAICS_DESCRIPTION_COLUMN: &str = "NAICS Description";
const DURATION_HOURS_COLUMN: &str = "Release Duration (Hours)";
const DURATION_MINUTES_COLUMN: &str = "Release Duration (Minutes)";

/// Chrome-filtered text of the three report regions the relational tables
/// are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct DocumentSlices {
    pub(super) chemicals: String,
    pub(super) naics: String,
    pub(super) accidents: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Slicing {
    Found(DocumentSlices),
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct FacilityStats {
    pub(super) accidents: usize,
    pub(super) accident_chemicals: usize,
    pub(super) needs_review: bool,
}

pub(super) struct RelationalParser {
    segmenter: Segmenter,
    splitter: BlockSplitter,
    extractor: FieldExtractor,
    chrome: ReportChromeFilter,
}

impl RelationalParser {
    pub(super) fn new() -> Result<Self> {
        Ok(Self {
            segmenter: Segmenter::with_markers(ACCIDENT_HISTORY_MARKER, &ETL_TERMINATORS)?,
            splitter: BlockSplitter::new()?,
            extractor: FieldExtractor::new(Grammar::new(GrammarVersion::V2))?,
            chrome: ReportChromeFilter::new()?,
        })
    }

    /// Locates "Process Chemicals", then "Process NAICS", then the accident
    /// history section, each after the previous one.
    pub(super) fn slice(&self, pages: &[String]) -> Slicing {
        let segments = self.segmenter.segment(pages);
        let text = segments.text.as_str();

        let Some(chemicals_start) = text
            .find(PROCESS_CHEMICALS_HEADING)
            .map(|start| start + PROCESS_CHEMICALS_HEADING.len())
        else {
            return Slicing::Missing(PROCESS_CHEMICALS_HEADING);
        };
        let Some(naics_start) = text[chemicals_start..]
            .find(PROCESS_NAICS_HEADING)
            .map(|offset| chemicals_start + offset)
        else {
            return Slicing::Missing(PROCESS_NAICS_HEADING);
        };
        let Some(span) = segments.span.filter(|span| span.start >= naics_start) else {
            return Slicing::Missing(ACCIDENT_HISTORY_MARKER);
        };

        Slicing::Found(DocumentSlices {
            chemicals: self.chrome.filter(&text[chemicals_start..naics_start]),
            naics: self
                .chrome
                .filter(&text[naics_start + PROCESS_NAICS_HEADING.len()..span.start]),
            accidents: self.chrome.filter(&text[span.start..span.end]),
        })
    }

    /// Turns one report's slices into relational rows, assigning surrogate
    /// keys from `registry`.
    pub(super) fn facility_rows(
        &self,
        facility_id: &str,
        slices: &DocumentSlices,
        registry: &mut KeyRegistry,
    ) -> (FacilityRows, FacilityStats) {
        let mut rows = FacilityRows::default();
        let mut stats = FacilityStats::default();

        for chemical in parse_process_chemicals(&slices.chemicals) {
            let Some(chemical_id) = assign_chemical(registry, &chemical, &mut rows) else {
                continue;
            };
            rows.facility_chemicals.push(vec![
                registry.next_facility_chemical_id().to_string(),
                facility_id.to_string(),
                chemical_id.to_string(),
                cell(chemical.program_level.as_deref()),
            ]);
        }

        for naics in parse_process_naics(&slices.naics) {
            assign_naics(
                registry,
                &naics.naics_code,
                naics.naics_description.as_deref(),
                &mut rows,
            );
            rows.facility_naics.push(vec![
                registry.next_facility_naics_id().to_string(),
                facility_id.to_string(),
                naics.naics_code,
            ]);
        }

        let blocks = match self.splitter.split(&slices.accidents) {
            BlockSplit::Blocks(blocks) => blocks,
            BlockSplit::NoRecords => return (rows, stats),
            BlockSplit::Unrecognized => {
                warn!(facility_id, "accident history section has no accident markers");
                stats.needs_review = true;
                return (rows, stats);
            }
        };

        for block in blocks {
            let record = self.extractor.extract(block.text);
            let facility_accident_id = format!("{facility_id}_{}", block.label);
            let process_naics = record.text(PROCESS_NAICS_COLUMN);

            if let Some(code) = process_naics {
                assign_naics(registry, code, record.text(NAICS_DESCRIPTION_COLUMN), &mut rows);
            }

            let release_duration = match (
                record.text(DURATION_HOURS_COLUMN),
                record.text(DURATION_MINUTES_COLUMN),
            ) {
                (Some(hours), Some(minutes)) => format!("{hours} Hours {minutes} Minutes"),
                _ => String::new(),
            };

            rows.accidents.push(vec![
                facility_accident_id.clone(),
                format!("Accident {}", block.label),
                facility_id.to_string(),
                cell(record.text(DATE_COLUMN)),
                cell(record.text(TIME_COLUMN)),
                release_duration,
                cell(process_naics),
            ]);
            stats.accidents += 1;

            for (position, released) in parse_accident_chemicals(block.text).iter().enumerate() {
                let Some(chemical_id) = assign_chemical(registry, &released.chemical, &mut rows)
                else {
                    continue;
                };
                rows.accident_chemicals.push(vec![
                    registry.next_accident_chemical_id().to_string(),
                    format!("{facility_accident_id}_{}", position + 1),
                    facility_accident_id.clone(),
                    cell(released.quantity_released_lbs.as_deref()),
                    cell(released.percent_weight.as_deref()),
                    chemical_id.to_string(),
                ]);
                stats.accident_chemicals += 1;
            }
        }

        debug!(
            facility_id,
            chemicals = rows.facility_chemicals.len(),
            naics = rows.facility_naics.len(),
            accidents = stats.accidents,
            accident_chemicals = stats.accident_chemicals,
            "parsed relational rows"
        );
        (rows, stats)
    }
}

fn cell(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

fn assign_chemical(
    registry: &mut KeyRegistry,
    chemical: &ProcessChemical,
    rows: &mut FacilityRows,
) -> Option<i64> {
    let key = chemical.natural_key()?;
    let assigned = registry.chemical(key);
    if assigned.is_new {
        rows.chemicals.push(vec![
            assigned.id.to_string(),
            chemical.chemical_name.clone(),
            cell(chemical.cas_number.as_deref()),
            cell(chemical.flammable_toxic.as_deref()),
        ]);
    }
    Some(assigned.id)
}

fn assign_naics(
    registry: &mut KeyRegistry,
    code: &str,
    description: Option<&str>,
    rows: &mut FacilityRows,
) {
    let assigned = registry.naics(code);
    if assigned.is_new {
        rows.naics.push(vec![
            assigned.id.to_string(),
            code.to_string(),
            cell(description),
        ]);
    }
}
