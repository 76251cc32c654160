use std::fs;

use chrono::Utc;

use super::*;
use crate::cli::GrammarVersion;
use crate::util::utc_compact_string;

fn scratch_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "rmp-load-{label}-{}-{}",
        std::process::id(),
        utc_compact_string(Utc::now())
    ));
    fs::create_dir_all(&dir).expect("scratch dir should be created");
    dir
}

fn write_csv(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("fixture should be written");
    path
}

fn loaded_connection(dir: &Path) -> Connection {
    let grammar = Grammar::new(GrammarVersion::V2);
    let connection = Connection::open_in_memory().expect("in-memory db should open");
    recreate_schema(&connection, &grammar).expect("schema should be created");

    let facility = write_csv(
        dir,
        "rmp_facility.csv",
        "EPA Facility ID,Report,Facility Name,Facility Address,City,State,County,Zip,Facility DUNS,Latitude,Longitude,Report Received Date,Report Created Date,Chemicals,NAICS_Names\n\
         100000012345,r.pdf,Acme Fertilizer,1 Main St,Enid,OK,Garfield,73701,123,36.39,-97.87,6/1/2004,2024-11-29,Ammonia,Fertilizer\n\
         100000099999,s.pdf,Bolt Chemical,2 Side Rd,Tulsa,OK,Tulsa,74101,456,not-a-number,-95.99,2004-06-01,,Chlorine,Wholesale\n",
    );
    let chemicals = write_csv(
        dir,
        "rmp_chemical.csv",
        "chemical_id,chemical_name,cas_number,flammable_toxic\n1,Ammonia (anhydrous),7664-41-7,Toxic\n2,Chlorine,7782-50-5,Toxic\n",
    );
    let facility_chemicals = write_csv(
        dir,
        "rmp_facility_chemicals.csv",
        "facility_chemical_id,facility_id,chemical_id,program_level\n1,100000012345,1,Program 3\n2,100000099999,2,Program 2\n",
    );
    let naics = write_csv(
        dir,
        "rmp_naics.csv",
        "naics_id,naics_code,naics_description\n1,325311,Nitrogenous Fertilizer Manufacturing\n",
    );
    let facility_naics = write_csv(
        dir,
        "rmp_facility_naics.csv",
        "facility_naics_id,facility_id,naics_code\n1,100000012345,325311\n",
    );
    let accidents = write_csv(
        dir,
        "rmp_facility_accidents.csv",
        "facility_accident_id,accident_id,facility_id,date_of_accident,time_accident_began,release_duration,naics_code\n\
         100000012345_7,Accident 7,100000012345,June 2012,14:30,002 Hours 15 Minutes,325311\n",
    );
    let accident_chemicals = write_csv(
        dir,
        "rmp_accident_chemicals.csv",
        "accident_chemical_id,facility_accident_chemical_id,facility_accident_id,quantity_released_lbs,percent_weight,chemical_id\n\
         1,100000012345_7_1,100000012345_7,1200,100.0,1\n",
    );

    for (table, path, adapter) in [
        ("rmp_facility", &facility, &FacilityColumns as &dyn RowAdapter),
        ("rmp_chemical", &chemicals, &SameNames),
        ("rmp_facility_chemicals", &facility_chemicals, &SameNames),
        ("rmp_naics", &naics, &SameNames),
        ("rmp_facility_naics", &facility_naics, &SameNames),
        ("rmp_facility_accidents", &accidents, &SameNames),
        ("rmp_accident_chemicals", &accident_chemicals, &SameNames),
    ] {
        import_csv(&connection, table, path, adapter).expect("csv should import");
    }
    connection
}

#[test]
fn facility_import_renames_columns_and_normalizes_dates() {
    let dir = scratch_dir("facility");
    let connection = loaded_connection(&dir);

    let (name, receipt, latitude): (String, Option<String>, Option<f64>) = connection
        .query_row(
            "SELECT facility_name, receipt_date, latitude FROM rmp_facility WHERE epa_facility_id = '100000012345'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .expect("facility row should exist");
    assert_eq!(name, "Acme Fertilizer");
    assert_eq!(receipt.as_deref(), Some("June 2004"));
    assert_eq!(latitude, Some(36.39));

    let (receipt, latitude, created): (Option<String>, Option<f64>, Option<String>) = connection
        .query_row(
            "SELECT receipt_date, latitude, report_created_date FROM rmp_facility WHERE epa_facility_id = '100000099999'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .expect("facility row should exist");
    assert_eq!(receipt.as_deref(), Some("June 2004"));
    assert_eq!(latitude, None);
    assert_eq!(created, None);

    fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn typed_values_degrade_to_null() {
    assert_eq!(
        typed_value("INTEGER", Some("12".to_string())),
        Value::Integer(12)
    );
    assert_eq!(
        typed_value("INTEGER", Some("3.0".to_string())),
        Value::Integer(3)
    );
    assert_eq!(typed_value("INTEGER", Some("N/A".to_string())), Value::Null);
    assert_eq!(typed_value("REAL", Some("x".to_string())), Value::Null);
    assert_eq!(
        typed_value("TEXT", Some("0042".to_string())),
        Value::Text("0042".to_string())
    );
    assert_eq!(typed_value("TEXT", None), Value::Null);
}

#[test]
fn month_year_accepts_both_source_formats() {
    assert_eq!(month_year("6/1/2004").as_deref(), Some("June 2004"));
    assert_eq!(month_year("2004-06-01").as_deref(), Some("June 2004"));
    assert_eq!(month_year("June 2004").as_deref(), Some("June 2004"));
    assert_eq!(month_year("sometime"), None);
}

#[test]
fn detail_import_prefixes_history_id_and_skips_rows_without_key() {
    let dir = scratch_dir("detail");
    let grammar = Grammar::new(GrammarVersion::V2);
    let connection = Connection::open_in_memory().expect("in-memory db should open");
    recreate_schema(&connection, &grammar).expect("schema should be created");

    let path = write_csv(
        &dir,
        "detail.csv",
        "EPA Facility ID,Has Accident,Accident Count,NAICS Code,Accident History ID,Facility Accident ID,Date of Accident,On-Site Property Damage ($),Fire\n\
         100000012345,Yes,1,325311,7,100000012345_7,June 2012,15000,Yes\n\
         100000099999,No,0,221310,,,,,\n\
         100000012345,Yes,1,325311,7,100000012345_7,June 2012,15000,Yes\n",
    );
    let summary = import_csv(
        &connection,
        "rmp_accident_history_detail",
        &path,
        &DetailColumns { grammar: &grammar },
    )
    .expect("detail should import");

    assert_eq!(summary.rows_read, 3);
    assert_eq!(summary.rows_inserted, 1);
    assert_eq!(summary.rows_skipped, 1);
    assert_eq!(summary.duplicates, 1);

    let (history_id, date, fire): (String, String, String) = connection
        .query_row(
            "SELECT Accident_History_ID, Date_of_Accident, Fire FROM rmp_accident_history_detail",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .expect("detail row should exist");
    assert_eq!(history_id, "Accident 7");
    assert_eq!(date, "June 2012");
    assert_eq!(fire, "Yes");

    fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn detail_table_follows_grammar_columns() {
    let grammar = Grammar::new(GrammarVersion::V2);
    let sql = detail_table_sql(&grammar);

    assert!(sql.contains("Facility_Accident_ID TEXT PRIMARY KEY"));
    assert!(sql.contains("On_Site_Property_Damage_Dollar INTEGER"));
    assert!(sql.contains("Off_Site_Property_Damage_Dollar INTEGER"));
    assert!(sql.contains("Date_of_Accident TEXT"));
}

#[test]
fn views_and_fts_are_rebuilt_from_base_tables() {
    let dir = scratch_dir("views");
    let mut connection = loaded_connection(&dir);

    rebuild_views(&mut connection).expect("views should rebuild");

    let (naics_codes, chemical_names): (String, String) = connection
        .query_row(
            "SELECT naics_codes, chemical_names FROM facility_view WHERE epa_facility_id = '100000012345'",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("facility view row should exist");
    assert_eq!(naics_codes, "325311");
    assert_eq!(chemical_names, "Ammonia (anhydrous)");

    let accident: (i64, String) = connection
        .query_row(
            "SELECT id, facility_name FROM facility_accidents_view",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .expect("accident view row should exist");
    assert_eq!(accident, (1, "Acme Fertilizer".to_string()));

    let hits = count_rows(
        &connection,
        "SELECT COUNT(*) FROM accident_chemicals_fts WHERE accident_chemicals_fts MATCH 'ammonia'",
    )
    .expect("fts query should run");
    assert_eq!(hits, 1);

    let hits = count_rows(
        &connection,
        "SELECT COUNT(*) FROM facility_accidents_fts WHERE facility_accidents_fts MATCH 'enid'",
    )
    .expect("fts query should run");
    assert_eq!(hits, 1);

    let counts = table_counts(&connection).expect("table counts should load");
    let facility_view = counts
        .iter()
        .find(|count| count.table == "facility_view")
        .expect("facility_view should be counted");
    assert_eq!(facility_view.rows, 2);

    fs::remove_dir_all(&dir).expect("cleanup");
}

#[test]
fn views_require_loaded_tables() {
    let mut connection = Connection::open_in_memory().expect("in-memory db should open");
    assert!(rebuild_views(&mut connection).is_err());
}
