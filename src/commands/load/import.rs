use super::*;

const FACILITY_COLUMNS: [(&str, &str); 13] = [
    ("EPA Facility ID", "epa_facility_id"),
    ("Report", "report"),
    ("Facility Name", "facility_name"),
    ("Facility Address", "facility_address"),
    ("City", "city"),
    ("State", "state"),
    ("County", "county"),
    ("Zip", "zip"),
    ("Facility DUNS", "facility_duns"),
    ("Latitude", "latitude"),
    ("Longitude", "longitude"),
    ("Report Received Date", "receipt_date"),
    ("Report Created Date", "report_created_date"),
];

/// How one CSV maps onto its table.
pub(super) trait RowAdapter {
    /// Table column fed by a CSV header; `None` drops the column.
    fn column(&self, header: &str) -> Option<String>;

    /// Stored value for `column`; `None` stores NULL.
    fn value(&self, _column: &str, raw: &str) -> Option<String> {
        non_empty(raw)
    }

    /// Rows where this column ends up NULL are skipped.
    fn required_column(&self) -> Option<&str> {
        None
    }
}

/// CSV headers already equal to the table's column names.
pub(super) struct SameNames;

impl RowAdapter for SameNames {
    fn column(&self, header: &str) -> Option<String> {
        Some(header.trim().to_string())
    }
}

/// Facility listing: spreadsheet headers renamed, derived `Chemicals` and
/// `NAICS_Names` columns dropped, receipt date reduced to `Month YYYY`.
pub(super) struct FacilityColumns;

impl RowAdapter for FacilityColumns {
    fn column(&self, header: &str) -> Option<String> {
        FACILITY_COLUMNS
            .iter()
            .find(|(source, _)| *source == header.trim())
            .map(|(_, column)| column.to_string())
    }

    fn value(&self, column: &str, raw: &str) -> Option<String> {
        let value = non_empty(raw)?;
        if column != "receipt_date" {
            return Some(value);
        }
        let normalized = month_year(&value);
        if normalized.is_none() {
            warn!(value = %value, "unrecognized receipt date; storing NULL");
        }
        normalized
    }

    fn required_column(&self) -> Option<&str> {
        Some("epa_facility_id")
    }
}

/// Detailed accident CSV mapped through the grammar's SQL column names.
pub(super) struct DetailColumns<'a> {
    pub(super) grammar: &'a Grammar,
}

impl RowAdapter for DetailColumns<'_> {
    fn column(&self, header: &str) -> Option<String> {
        match header {
            "EPA Facility ID" => Some("EPA_Facility_ID".to_string()),
            "Accident History ID" => Some("Accident_History_ID".to_string()),
            "Facility Accident ID" => Some("Facility_Accident_ID".to_string()),
            other => self
                .grammar
                .field(other)
                .map(|spec| spec.sql_column.to_string()),
        }
    }

    fn value(&self, column: &str, raw: &str) -> Option<String> {
        let value = non_empty(raw)?;
        match column {
            "Accident_History_ID" => Some(format!("Accident {value}")),
            _ => Some(value),
        }
    }

    fn required_column(&self) -> Option<&str> {
        Some("Facility_Accident_ID")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(super) struct ImportSummary {
    pub(super) rows_read: usize,
    pub(super) rows_inserted: usize,
    pub(super) rows_skipped: usize,
    pub(super) duplicates: usize,
    pub(super) values_nulled: usize,
}

/// Loads `path` into `table`. INTEGER and REAL columns are parsed; a value
/// that does not parse is stored as NULL. Duplicate primary keys keep the
/// first row.
pub(super) fn import_csv(
    connection: &Connection,
    table: &str,
    path: &Path,
    adapter: &dyn RowAdapter,
) -> Result<ImportSummary> {
    let types = column_types(connection, table)?;
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();

    let mut mapping: Vec<(usize, String)> = Vec::new();
    for (index, header) in headers.iter().enumerate() {
        let Some(column) = adapter.column(header) else {
            debug!(table, header, "dropping CSV column");
            continue;
        };
        if !types.contains_key(&column) {
            warn!(table, header, "CSV column has no table counterpart; dropping");
            continue;
        }
        if mapping.iter().any(|(_, existing)| *existing == column) {
            continue;
        }
        mapping.push((index, column));
    }
    if mapping.is_empty() {
        bail!("{} has no columns matching table {table}", path.display());
    }

    let required = adapter
        .required_column()
        .and_then(|column| mapping.iter().position(|(_, name)| name == column));
    let column_list = mapping
        .iter()
        .map(|(_, column)| column.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=mapping.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut insert = connection
        .prepare(&format!(
            "INSERT OR IGNORE INTO {table} ({column_list}) VALUES ({placeholders})"
        ))
        .with_context(|| format!("failed to prepare insert into {table}"))?;

    let mut summary = ImportSummary::default();
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to read row in {}", path.display()))?;
        summary.rows_read += 1;

        let mut values = Vec::with_capacity(mapping.len());
        for (index, column) in &mapping {
            let raw = record.get(*index).unwrap_or_default().trim();
            let declared = types.get(column).map(String::as_str).unwrap_or_default();
            let value = typed_value(declared, adapter.value(column, raw));
            if value == Value::Null && !raw.is_empty() {
                summary.values_nulled += 1;
            }
            values.push(value);
        }

        if required.is_some_and(|position| values[position] == Value::Null) {
            summary.rows_skipped += 1;
            continue;
        }

        let inserted = insert
            .execute(params_from_iter(values.iter()))
            .with_context(|| format!("failed to insert row {} into {table}", summary.rows_read))?;
        if inserted == 0 {
            summary.duplicates += 1;
        } else {
            summary.rows_inserted += inserted;
        }
    }

    Ok(summary)
}

fn non_empty(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}

/// Coerces a cell to the column's declared affinity.
pub(super) fn typed_value(declared: &str, value: Option<String>) -> Value {
    let Some(value) = value else {
        return Value::Null;
    };
    if declared.contains("INT") {
        return parse_integer(&value).map_or(Value::Null, Value::Integer);
    }
    if declared.contains("REAL") {
        return value.parse::<f64>().map_or(Value::Null, Value::Real);
    }
    Value::Text(value)
}

/// Whole numbers, tolerating a `.0` suffix from spreadsheet exports.
fn parse_integer(value: &str) -> Option<i64> {
    value.parse::<i64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|number| number.is_finite() && number.fract() == 0.0)
            .map(|number| number as i64)
    })
}

/// `6/1/2004` or `2004-06-01` as `June 2004`; a value already in that
/// form is kept.
pub(super) fn month_year(value: &str) -> Option<String> {
    let value = value.trim();
    ["%m/%d/%Y", "%Y-%m-%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| NaiveDate::parse_from_str(&format!("1 {value}"), "%d %B %Y").ok())
        .map(|date| date.format("%B %Y").to_string())
}
