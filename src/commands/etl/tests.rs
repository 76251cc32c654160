use std::fs;

use chrono::Utc;

use super::*;
use crate::util::utc_compact_string;

const FACILITY: &str = "100000012345";

fn report_pages() -> Vec<String> {
    vec![
        "Facility Name: Acme Fertilizer\n\
         EPA Facility Identifier: 100000012345\n\
         Process Chemicals\n\
         Program Level:\n\
         Program 3\n\
         Chemical Name:\n\
         Ammonia (anhydrous)\n\
         CAS Number:\n\
         7664-41-7\n\
         Flammable/Toxic:\n\
         Toxic\n\
         Page 1 of 3\n\
         Process NAICS\n\
         NAICS Code:\n\
         325311\n\
         NAICS Description:\n\
         Nitrogenous Fertilizer Manufacturing\n"
            .to_string(),
        "Section 6. Accident History\n\
         Accident History ID: Accident 7\n\
         Date of Accident: June 2012\n\
         Time Accident Began (HH:MM): 14:30\n\
         NAICS Code of Process Involved: 424690\n\
         NAICS Description: Other Chemical Merchant Wholesalers\n\
         Release Duration: 002 Hours 15 Minutes\n\
         Chemicals in Accident History\n\
         Quantity Released (lbs): 1200\n\
         Percent Weight: 100.0\n\
         Chemical Name: Ammonia (anhydrous)\n\
         CAS Number: 7664-41-7\n\
         Flammable/Toxic: Toxic\n\
         Section 7. Prevention Program\n\
         Chemical Name: Never read\n"
            .to_string(),
    ]
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn slices_drop_report_chrome() {
    let parser = RelationalParser::new().expect("parser should compile");
    let Slicing::Found(slices) = parser.slice(&report_pages()) else {
        panic!("slices should be found");
    };

    assert!(slices.chemicals.starts_with("Program Level:"));
    assert!(!slices.chemicals.contains("Page 1 of 3"));
    assert!(slices.naics.ends_with("Nitrogenous Fertilizer Manufacturing"));
    assert!(slices.accidents.starts_with("Section 6. Accident History"));
    assert!(!slices.accidents.contains("Never read"));
}

#[test]
fn missing_process_naics_skips_document() {
    let parser = RelationalParser::new().expect("parser should compile");
    let pages = vec!["Process Chemicals\nChemical Name: Ammonia\nSection 6. Accident History\n".to_string()];

    assert_eq!(parser.slice(&pages), Slicing::Missing(PROCESS_NAICS_HEADING));
}

#[test]
fn facility_rows_share_chemical_and_naics_keys() {
    let parser = RelationalParser::new().expect("parser should compile");
    let Slicing::Found(slices) = parser.slice(&report_pages()) else {
        panic!("slices should be found");
    };
    let mut registry = KeyRegistry::new();

    let (rows, stats) = parser.facility_rows(FACILITY, &slices, &mut registry);

    assert_eq!(
        rows.chemicals,
        vec![strings(&["1", "Ammonia (anhydrous)", "7664-41-7", "Toxic"])]
    );
    assert_eq!(
        rows.facility_chemicals,
        vec![strings(&["1", FACILITY, "1", "Program 3"])]
    );
    assert_eq!(
        rows.naics,
        vec![
            strings(&["1", "325311", "Nitrogenous Fertilizer Manufacturing"]),
            strings(&["2", "424690", "Other Chemical Merchant Wholesalers"]),
        ]
    );
    assert_eq!(rows.facility_naics, vec![strings(&["1", FACILITY, "325311"])]);
    assert_eq!(
        rows.accidents,
        vec![strings(&[
            "100000012345_7",
            "Accident 7",
            FACILITY,
            "June 2012",
            "14:30",
            "002 Hours 15 Minutes",
            "424690",
        ])]
    );
    assert_eq!(
        rows.accident_chemicals,
        vec![strings(&[
            "1",
            "100000012345_7_1",
            "100000012345_7",
            "1200",
            "100.0",
            "1",
        ])]
    );
    assert_eq!(stats.accidents, 1);
    assert_eq!(stats.accident_chemicals, 1);
    assert!(!stats.needs_review);

    let (second, _) = parser.facility_rows("100000099999", &slices, &mut registry);
    assert!(second.chemicals.is_empty());
    assert!(second.naics.is_empty());
    assert_eq!(second.facility_chemicals[0][0], "2");
}

#[test]
fn appended_run_continues_surrogate_keys() {
    let dir = std::env::temp_dir().join(format!(
        "rmp-etl-{}-{}",
        std::process::id(),
        utc_compact_string(Utc::now())
    ));
    let parser = RelationalParser::new().expect("parser should compile");
    let Slicing::Found(slices) = parser.slice(&report_pages()) else {
        panic!("slices should be found");
    };

    {
        let mut registry = KeyRegistry::seed_from_dir(&dir).expect("empty dir should seed");
        let mut tables = RelationalTables::open(&dir, 10).expect("tables should open");
        let (rows, _) = parser.facility_rows(FACILITY, &slices, &mut registry);
        tables.push(rows).expect("rows should buffer");
        tables.finish_document().expect("document should finish");
        let counts = tables.close().expect("tables should close");
        assert_eq!(counts.len(), 6);
        assert_eq!(counts[0].table, CHEMICAL_TABLE);
        assert_eq!(counts[0].rows, 1);
    }

    let mut registry = KeyRegistry::seed_from_dir(&dir).expect("seeding should succeed");
    let (rows, _) = parser.facility_rows("100000099999", &slices, &mut registry);
    assert!(rows.chemicals.is_empty());
    assert_eq!(rows.facility_chemicals[0][0], "2");
    assert_eq!(rows.accident_chemicals[0][0], "2");
    assert_eq!(registry.chemical("74-98-6").id, 2);

    fs::remove_dir_all(&dir).expect("cleanup");
}
