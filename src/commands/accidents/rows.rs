use super::*;

pub(super) const SUMMARY_HEADER: [&str; 5] = [
    "EPA Facility ID",
    "Has Accident",
    "Accident Count",
    "NAICS Code",
    "Accident Details",
];

const DETAIL_KEY_COLUMNS: [&str; 6] = [
    "EPA Facility ID",
    "Has Accident",
    "Accident Count",
    "NAICS Code",
    "Accident History ID",
    "Facility Accident ID",
];

pub(super) const DATE_COLUMN: &str = "Date of Accident";
pub(super) const PROCESS_NAICS_COLUMN: &str = "NAICS Code of Process Involved";

/// One entry of the summary `Accident Details` JSON array.
#[derive(Debug, Serialize)]
struct AccidentDetail {
    #[serde(rename = "Date of Accident")]
    date_of_accident: Option<String>,
    #[serde(rename = "NAICS Code of Process Involved")]
    naics_code: Option<String>,
}

pub(super) fn output_header(output: AccidentOutput, grammar: &Grammar) -> Vec<&'static str> {
    match output {
        AccidentOutput::Summary => SUMMARY_HEADER.to_vec(),
        AccidentOutput::Detailed => DETAIL_KEY_COLUMNS
            .iter()
            .copied()
            .chain(grammar.fields().iter().map(|spec| spec.column))
            .collect(),
    }
}

/// CSV rows for one assembled document. Documents flagged for review
/// produce nothing.
pub(super) fn document_rows(
    output: AccidentOutput,
    document: &AssembledDocument,
    grammar: &Grammar,
    policy: UnparsedPolicy,
) -> Result<Vec<Vec<String>>> {
    match output {
        AccidentOutput::Summary => Ok(summary_row(document, policy)?.into_iter().collect()),
        AccidentOutput::Detailed => Ok(detailed_rows(document, grammar, policy)),
    }
}

fn summary_row(document: &AssembledDocument, policy: UnparsedPolicy) -> Result<Option<Vec<String>>> {
    let Some(first) = document.rows.first() else {
        return Ok(None);
    };

    let details = match document.outcome {
        DocumentOutcome::Accidents(_) => {
            let details: Vec<AccidentDetail> = document
                .rows
                .iter()
                .filter_map(|row| row.record.as_ref())
                .map(|record| AccidentDetail {
                    date_of_accident: record.get(DATE_COLUMN).render(policy),
                    naics_code: record.get(PROCESS_NAICS_COLUMN).render(policy),
                })
                .collect();
            serde_json::to_string(&details).context("failed to serialize accident details")?
        }
        _ => String::new(),
    };

    Ok(Some(vec![
        first.facility_id.clone(),
        first.has_accident.as_str().to_string(),
        first.accident_count.to_string(),
        document.naics_code.clone().unwrap_or_default(),
        details,
    ]))
}

fn detailed_rows(
    document: &AssembledDocument,
    grammar: &Grammar,
    policy: UnparsedPolicy,
) -> Vec<Vec<String>> {
    document
        .rows
        .iter()
        .map(|row| {
            let mut cells = vec![
                row.facility_id.clone(),
                row.has_accident.as_str().to_string(),
                row.accident_count.to_string(),
                row.naics_code.clone().unwrap_or_default(),
                row.record
                    .as_ref()
                    .and_then(|record| record.history_id.clone())
                    .unwrap_or_default(),
                row.facility_accident_id.clone().unwrap_or_default(),
            ];
            cells.extend(grammar.fields().iter().map(|spec| {
                row.record
                    .as_ref()
                    .and_then(|record| record.get(spec.column).render(policy))
                    .unwrap_or_default()
            }));
            cells
        })
        .collect()
}
