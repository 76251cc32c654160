use super::*;

const VIEW_TABLES_SQL: &str = "
    CREATE TABLE IF NOT EXISTS metadata (
      key TEXT PRIMARY KEY,
      value TEXT NOT NULL
    );

    DROP TABLE IF EXISTS facility_accidents_fts;
    DROP TABLE IF EXISTS accident_chemicals_fts;
    DROP TABLE IF EXISTS facility_view;
    DROP TABLE IF EXISTS facility_accidents_view;
    DROP TABLE IF EXISTS accident_chemicals_view;

    CREATE TABLE facility_view (
      epa_facility_id TEXT PRIMARY KEY,
      report TEXT,
      facility_name TEXT,
      facility_address TEXT,
      city TEXT,
      state TEXT,
      county TEXT,
      zip TEXT,
      facility_duns TEXT,
      receipt_date TEXT,
      report_created_date TEXT,
      naics_codes TEXT,
      chemical_names TEXT,
      latitude REAL,
      longitude REAL
    );

    INSERT INTO facility_view
    SELECT
      f.epa_facility_id,
      f.report,
      f.facility_name,
      f.facility_address,
      f.city,
      f.state,
      f.county,
      f.zip,
      f.facility_duns,
      f.receipt_date,
      f.report_created_date,
      (
        SELECT GROUP_CONCAT(DISTINCT fn.naics_code)
        FROM rmp_facility_naics fn
        WHERE fn.facility_id = f.epa_facility_id
      ),
      (
        SELECT GROUP_CONCAT(chemical_name, ', ')
        FROM (
          SELECT DISTINCT c.chemical_name
          FROM rmp_facility_chemicals fc
          JOIN rmp_chemical c ON fc.chemical_id = c.chemical_id
          WHERE fc.facility_id = f.epa_facility_id
        )
      ),
      f.latitude,
      f.longitude
    FROM rmp_facility f;

    CREATE TABLE facility_accidents_view (
      id INTEGER PRIMARY KEY AUTOINCREMENT,
      facility_accident_id TEXT,
      accident_id TEXT,
      facility_id TEXT,
      facility_name TEXT,
      facility_address TEXT,
      city TEXT,
      state TEXT,
      county TEXT,
      date_of_accident TEXT,
      time_accident_began TEXT,
      release_duration TEXT,
      naics_code TEXT,
      chemical_names TEXT,
      latitude REAL,
      longitude REAL
    );

    INSERT INTO facility_accidents_view (
      facility_accident_id, accident_id, facility_id, facility_name,
      facility_address, city, state, county, date_of_accident,
      time_accident_began, release_duration, naics_code, chemical_names,
      latitude, longitude
    )
    SELECT
      a.facility_accident_id,
      a.accident_id,
      a.facility_id,
      f.facility_name,
      f.facility_address,
      f.city,
      f.state,
      f.county,
      a.date_of_accident,
      a.time_accident_began,
      a.release_duration,
      a.naics_code,
      (
        SELECT GROUP_CONCAT(chemical_name, ', ')
        FROM (
          SELECT DISTINCT c.chemical_name
          FROM rmp_facility_chemicals fc
          JOIN rmp_chemical c ON fc.chemical_id = c.chemical_id
          WHERE fc.facility_id = a.facility_id
        )
      ),
      f.latitude,
      f.longitude
    FROM rmp_facility_accidents a
    JOIN rmp_facility f ON a.facility_id = f.epa_facility_id
    ORDER BY a.facility_accident_id;

    CREATE TABLE accident_chemicals_view (
      accident_chemical_id INTEGER PRIMARY KEY,
      accident_id TEXT,
      facility_id TEXT,
      facility_name TEXT,
      facility_address TEXT,
      city TEXT,
      state TEXT,
      county TEXT,
      date_of_accident TEXT,
      chemical_name TEXT,
      quantity_released_lbs TEXT,
      percent_weight TEXT
    );

    INSERT INTO accident_chemicals_view
    SELECT
      ac.accident_chemical_id,
      a.accident_id,
      a.facility_id,
      f.facility_name,
      f.facility_address,
      f.city,
      f.state,
      f.county,
      a.date_of_accident,
      c.chemical_name,
      ac.quantity_released_lbs,
      ac.percent_weight
    FROM rmp_accident_chemicals ac
    LEFT JOIN rmp_facility_accidents a ON ac.facility_accident_id = a.facility_accident_id
    LEFT JOIN rmp_facility f ON a.facility_id = f.epa_facility_id
    LEFT JOIN rmp_chemical c ON ac.chemical_id = c.chemical_id;

    CREATE VIRTUAL TABLE accident_chemicals_fts USING fts5(
      accident_id,
      facility_id,
      facility_name,
      facility_address,
      city,
      state,
      county,
      date_of_accident,
      chemical_name,
      quantity_released_lbs,
      percent_weight,
      content='accident_chemicals_view',
      content_rowid='accident_chemical_id',
      tokenize='unicode61'
    );

    CREATE VIRTUAL TABLE facility_accidents_fts USING fts5(
      facility_accident_id,
      accident_id,
      facility_id,
      facility_name,
      facility_address,
      city,
      state,
      county,
      date_of_accident,
      time_accident_began,
      release_duration,
      naics_code,
      chemical_names,
      content='facility_accidents_view',
      content_rowid='id',
      tokenize='unicode61'
    );
";

const FTS_TABLES: [&str; 2] = ["accident_chemicals_fts", "facility_accidents_fts"];

/// Rebuilds the materialized read tables from the base tables, then
/// repopulates and optimizes their FTS5 indexes.
pub(crate) fn rebuild_views(connection: &mut Connection) -> Result<()> {
    for table in BASE_TABLES.iter().filter(|table| **table != "metadata") {
        if !table_exists(connection, table)? {
            bail!("table {table} is missing; run `load` first");
        }
    }

    let tx = connection
        .transaction()
        .context("failed to start view rebuild transaction")?;
    tx.execute_batch(VIEW_TABLES_SQL)
        .context("failed to rebuild materialized views")?;

    for table in FTS_TABLES {
        tx.execute(&format!("INSERT INTO {table}({table}) VALUES('rebuild')"), [])
            .with_context(|| format!("failed to rebuild FTS index {table}"))?;
        tx.execute(&format!("INSERT INTO {table}({table}) VALUES('optimize')"), [])
            .with_context(|| format!("failed to optimize FTS index {table}"))?;
    }
    tx.execute(
        "INSERT INTO metadata(key, value) VALUES('views_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )
    .context("failed to record view rebuild time")?;
    tx.commit().context("failed to commit view rebuild")?;

    info!(
        facilities = count_rows(connection, "SELECT COUNT(*) FROM facility_view")?,
        accidents = count_rows(connection, "SELECT COUNT(*) FROM facility_accidents_view")?,
        accident_chemicals = count_rows(connection, "SELECT COUNT(*) FROM accident_chemicals_view")?,
        "rebuilt views and full-text indexes"
    );
    Ok(())
}
