use super::*;

pub(super) const DB_SCHEMA_VERSION: &str = "0.1.0";

/// Tables filled straight from CSV, in load order.
pub(crate) const BASE_TABLES: [&str; 9] = [
    "rmp_facility",
    "rmp_chemical",
    "rmp_facility_chemicals",
    "rmp_naics",
    "rmp_facility_naics",
    "rmp_facility_accidents",
    "rmp_accident_chemicals",
    "rmp_accident_history_detail",
    "metadata",
];

/// Materialized read tables and their full-text indexes.
pub(crate) const DERIVED_TABLES: [&str; 5] = [
    "facility_view",
    "facility_accidents_view",
    "accident_chemicals_view",
    "facility_accidents_fts",
    "accident_chemicals_fts",
];

pub(super) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

/// Drops and recreates every base table. A load always starts from empty
/// tables so rerunning it never duplicates rows.
pub(super) fn recreate_schema(connection: &Connection, grammar: &Grammar) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            DROP TABLE IF EXISTS rmp_accident_chemicals;
            DROP TABLE IF EXISTS rmp_facility_accidents;
            DROP TABLE IF EXISTS rmp_facility_naics;
            DROP TABLE IF EXISTS rmp_naics;
            DROP TABLE IF EXISTS rmp_facility_chemicals;
            DROP TABLE IF EXISTS rmp_chemical;
            DROP TABLE IF EXISTS rmp_facility;

            CREATE TABLE rmp_facility (
              epa_facility_id TEXT PRIMARY KEY,
              report TEXT,
              facility_name TEXT,
              facility_address TEXT,
              city TEXT,
              state TEXT,
              county TEXT,
              zip TEXT,
              facility_duns TEXT,
              latitude REAL,
              longitude REAL,
              receipt_date TEXT,
              report_created_date TEXT
            );

            CREATE TABLE rmp_chemical (
              chemical_id INTEGER PRIMARY KEY,
              chemical_name TEXT,
              cas_number TEXT,
              flammable_toxic TEXT
            );

            CREATE TABLE rmp_facility_chemicals (
              facility_chemical_id INTEGER PRIMARY KEY,
              facility_id TEXT,
              chemical_id INTEGER,
              program_level TEXT,
              FOREIGN KEY (facility_id) REFERENCES rmp_facility(epa_facility_id),
              FOREIGN KEY (chemical_id) REFERENCES rmp_chemical(chemical_id)
            );

            CREATE TABLE rmp_naics (
              naics_id INTEGER PRIMARY KEY,
              naics_code TEXT UNIQUE,
              naics_description TEXT
            );

            CREATE TABLE rmp_facility_naics (
              facility_naics_id INTEGER PRIMARY KEY,
              facility_id TEXT,
              naics_code TEXT,
              FOREIGN KEY (facility_id) REFERENCES rmp_facility(epa_facility_id),
              FOREIGN KEY (naics_code) REFERENCES rmp_naics(naics_code)
            );

            CREATE TABLE rmp_facility_accidents (
              facility_accident_id TEXT PRIMARY KEY,
              accident_id TEXT,
              facility_id TEXT,
              date_of_accident TEXT,
              time_accident_began TEXT,
              release_duration TEXT,
              naics_code TEXT,
              FOREIGN KEY (facility_id) REFERENCES rmp_facility(epa_facility_id),
              FOREIGN KEY (naics_code) REFERENCES rmp_naics(naics_code)
            );

            CREATE TABLE rmp_accident_chemicals (
              accident_chemical_id INTEGER PRIMARY KEY,
              facility_accident_chemical_id TEXT,
              facility_accident_id TEXT,
              quantity_released_lbs TEXT,
              percent_weight TEXT,
              chemical_id INTEGER,
              FOREIGN KEY (facility_accident_id) REFERENCES rmp_facility_accidents(facility_accident_id),
              FOREIGN KEY (chemical_id) REFERENCES rmp_chemical(chemical_id)
            );

            CREATE INDEX idx_rmp_facility_chemicals_facility_id ON rmp_facility_chemicals(facility_id);
            CREATE INDEX idx_rmp_facility_naics_facility_id ON rmp_facility_naics(facility_id);
            CREATE INDEX idx_rmp_facility_accidents_facility_id ON rmp_facility_accidents(facility_id);
            CREATE INDEX idx_rmp_accident_chemicals_accident_id ON rmp_accident_chemicals(facility_accident_id);
            ",
        )
        .context("failed to create RMP tables")?;

    connection
        .execute_batch(&detail_table_sql(grammar))
        .context("failed to create rmp_accident_history_detail")?;

    Ok(())
}

/// DDL for the detailed accident table; one column per grammar field.
pub(super) fn detail_table_sql(grammar: &Grammar) -> String {
    let mut columns = vec![
        "  EPA_Facility_ID TEXT".to_string(),
        "  Accident_History_ID TEXT".to_string(),
        "  Facility_Accident_ID TEXT PRIMARY KEY".to_string(),
    ];
    columns.extend(
        grammar
            .fields()
            .iter()
            .map(|spec| format!("  {} {}", spec.sql_column, spec.sql_type.as_sql())),
    );

    format!(
        "DROP TABLE IF EXISTS rmp_accident_history_detail;\n\
         CREATE TABLE rmp_accident_history_detail (\n{}\n);\n\
         CREATE INDEX idx_rmp_accident_history_detail_facility ON rmp_accident_history_detail(EPA_Facility_ID);",
        columns.join(",\n")
    )
}

pub(super) fn write_metadata(connection: &Connection, grammar: &Grammar) -> Result<()> {
    let now = now_utc_string();
    for (key, value) in [
        ("db_schema_version", DB_SCHEMA_VERSION),
        ("db_updated_at", now.as_str()),
        ("detail_grammar", grammar.version().as_str()),
    ] {
        connection
            .execute(
                "INSERT INTO metadata(key, value) VALUES(?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value=excluded.value",
                params![key, value],
            )
            .with_context(|| format!("failed to write metadata key {key}"))?;
    }
    Ok(())
}

/// Declared type of every column of `table`, upper-cased.
pub(super) fn column_types(connection: &Connection, table: &str) -> Result<HashMap<String, String>> {
    let mut statement = connection
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("failed to inspect schema for table {table}"))?;
    let rows = statement
        .query_map([], |row| {
            Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })
        .with_context(|| format!("failed to read columns of {table}"))?;

    let mut types = HashMap::new();
    for row in rows {
        let (name, declared) = row?;
        types.insert(name, declared.to_ascii_uppercase());
    }
    if types.is_empty() {
        bail!("table {table} does not exist");
    }
    Ok(types)
}

pub(crate) fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE name = ?1 AND type IN ('table', 'view')",
            [table],
            |row| row.get(0),
        )
        .with_context(|| format!("failed to look up table {table}"))?;
    Ok(count > 0)
}

pub(crate) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Row counts of every known table present in the database.
pub(crate) fn table_counts(connection: &Connection) -> Result<Vec<TableCount>> {
    let mut counts = Vec::new();
    for table in BASE_TABLES.iter().chain(DERIVED_TABLES.iter()) {
        if !table_exists(connection, table)? {
            continue;
        }
        counts.push(TableCount {
            table: table.to_string(),
            rows: count_rows(connection, &format!("SELECT COUNT(*) FROM {table}"))?,
        });
    }
    Ok(counts)
}
