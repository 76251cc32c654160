use super::*;
use super::assemble::HasAccident;
use super::blocks::AccidentBlock;
use super::extract::{FieldValue, UNPARSED_MARKER};
use super::relational::ProcessNaics;
use crate::cli::{GrammarVersion, UnparsedPolicy};

fn pages(texts: &[&str]) -> Vec<String> {
    texts.iter().map(|text| text.to_string()).collect()
}

fn extractor(version: GrammarVersion) -> FieldExtractor {
    FieldExtractor::new(Grammar::new(version)).expect("extractor should compile")
}

fn assembler() -> RecordAssembler {
    RecordAssembler::new(Grammar::new(GrammarVersion::V2)).expect("assembler should compile")
}

#[test]
fn segmenter_splits_marker_and_terminator_on_same_page() {
    let segmenter = Segmenter::new().expect("segmenter should compile");
    let segments = segmenter.segment(&pages(&[
        "Section 1. Registration\nNAICS Code: 325311\n",
        "SECTION 6. ACCIDENT HISTORY\nNo records found\nSection 7. Prevention Program 3\nmore",
    ]));

    assert_eq!(
        segments.section(),
        Some("SECTION 6. ACCIDENT HISTORY\nNo records found\n")
    );
    assert_eq!(segments.terminator.as_deref(), Some("Section 7"));
    assert!(segments.pre_section().ends_with("NAICS Code: 325311\n\n"));
    assert_eq!(
        segmenter.document_naics(&segments),
        Some("325311".to_string())
    );
}

#[test]
fn segmenter_picks_earliest_terminator_and_runs_to_end_without_one() {
    let segmenter = Segmenter::new().expect("segmenter should compile");

    let segments = segmenter.segment(&pages(&[
        "Section 6. Accident History\nbody\nSection 9. Emergency Response\nSection 8. x",
    ]));
    let section = segments.section().expect("section should be found");
    assert!(section.ends_with("body\n"));
    assert_eq!(
        segments.terminator.as_deref(),
        Some("Section 9. Emergency Response")
    );

    let open_ended = segmenter.segment(&pages(&["Section 6. Accident History\ntail"]));
    let span = open_ended.span.expect("span should be found");
    assert_eq!(span.end, open_ended.text.len());
    assert!(span.end > span.start);
    assert_eq!(open_ended.terminator, None);
}

#[test]
fn segmenter_skips_empty_pages_and_reports_them() {
    let segmenter = Segmenter::new().expect("segmenter should compile");
    let segments = segmenter.segment(&pages(&["first", "   \n", "third"]));

    assert_eq!(segments.empty_pages, vec![1]);
    assert_eq!(segments.text, "first\nthird\n");
    assert_eq!(segments.section(), None);
}

#[test]
fn splitter_blocks_reconstruct_section() {
    let splitter = BlockSplitter::new().expect("splitter should compile");
    let section = "Section 6. Accident History\nintro\nAccident History ID: Accident 7\nDate of Accident: May 2010\nAccident History ID:  Accident 9\nFire: Yes\nAccident History ID: Accident 12\n";

    let BlockSplit::Blocks(blocks) = splitter.split(section) else {
        panic!("expected blocks");
    };
    let preamble = blocks.preamble();
    let collected: Vec<AccidentBlock<'_>> = blocks.collect();

    assert_eq!(collected.len(), 3);
    assert_eq!(
        collected
            .iter()
            .map(|block| (block.sequence, block.label))
            .collect::<Vec<_>>(),
        vec![(1, "7"), (2, "9"), (3, "12")]
    );

    let mut rebuilt = preamble.to_string();
    for block in &collected {
        assert_eq!(&section[block.offset..block.offset + block.text.len()], block.text);
        rebuilt.push_str(block.text);
    }
    assert_eq!(rebuilt, section);
}

#[test]
fn splitter_no_records_wins_over_block_markers() {
    let splitter = BlockSplitter::new().expect("splitter should compile");
    let section = "Section 6. Accident History\nNO RECORDS FOUND\nAccident History ID: Accident 1\n";
    assert!(matches!(splitter.split(section), BlockSplit::NoRecords));
}

#[test]
fn splitter_flags_section_without_markers() {
    let splitter = BlockSplitter::new().expect("splitter should compile");
    assert!(matches!(
        splitter.split("Section 6. Accident History\ngarbled text"),
        BlockSplit::Unrecognized
    ));
}

#[test]
fn extractor_reads_minimal_block() {
    let record = extractor(GrammarVersion::V2).extract(
        "Accident History ID: Accident 1\nDate of Accident: March 2015\nGas Release: Yes\nFire: No\n",
    );

    assert_eq!(record.history_id.as_deref(), Some("1"));
    assert_eq!(record.text("Date of Accident"), Some("March 2015"));
    assert_eq!(record.text("Gas Release"), Some("Yes"));
    assert_eq!(record.text("Fire"), Some("No"));

    let populated: Vec<&str> = record
        .values
        .iter()
        .filter(|(_, value)| *value != FieldValue::Absent)
        .map(|(column, _)| *column)
        .collect();
    assert_eq!(populated, vec!["Date of Accident", "Gas Release", "Fire"]);
}

#[test]
fn missing_date_leaves_other_fields_untouched() {
    let extractor = extractor(GrammarVersion::V2);
    let with_date = extractor.extract(
        "Accident History ID: Accident 2\nDate of Accident: June 2001\nTime Accident Began (HH:MM): 14:05\nRelease Duration: 001 Hours 30 Minutes\nExplosion: no\n",
    );
    let without_date = extractor.extract(
        "Accident History ID: Accident 2\nTime Accident Began (HH:MM): 14:05\nRelease Duration: 001 Hours 30 Minutes\nExplosion: no\n",
    );

    assert_eq!(without_date.get("Date of Accident"), &FieldValue::Absent);
    for (column, value) in &with_date.values {
        if *column != "Date of Accident" {
            assert_eq!(without_date.get(column), value, "column {column} changed");
        }
    }
    assert_eq!(without_date.text("Time Accident Began"), Some("14:05"));
    assert_eq!(without_date.text("Release Duration (Hours)"), Some("001"));
    assert_eq!(without_date.text("Release Duration (Minutes)"), Some("30"));
    assert_eq!(without_date.text("Explosion"), Some("No"));
}

#[test]
fn casualty_labels_are_scoped_to_their_subsection() {
    let record = extractor(GrammarVersion::V2).extract(
        "Accident History ID: Accident 3\nOn-Site Impacts\nEmployee or Contractor Deaths: 1\nPublic Deaths: 2\nOn-Site Property Damage ($): 12,500\nOff-Site Impacts\nDeaths: 3\nPublic Deaths: N/A\nEvacuated: 40\nEnvironmental Damage\nFish or Animal Kills: No\n",
    );

    assert_eq!(record.text("Employee/Contractor Deaths"), Some("1"));
    assert_eq!(record.text("Public Deaths"), Some("2"));
    assert_eq!(record.text("On-Site Property Damage ($)"), Some("12500"));
    assert_eq!(record.text("Off-Site Deaths"), Some("3"));
    assert_eq!(record.text("Off-Site Public Deaths"), Some("N/A"));
    assert_eq!(record.text("Evacuated"), Some("40"));
    assert_eq!(record.text("Fish or Animal Kills"), Some("No"));
}

#[test]
fn scoped_field_without_subsection_is_absent() {
    let record = extractor(GrammarVersion::V2)
        .extract("Accident History ID: Accident 4\nDeaths: 3\nPublic Deaths: 1\n");
    assert_eq!(record.get("Off-Site Deaths"), &FieldValue::Absent);
    assert_eq!(record.get("Public Deaths"), &FieldValue::Absent);
}

#[test]
fn grammar_versions_differ_on_responders_and_na_counts() {
    let block = "Accident History ID: Accident 5\nOn-Site Impacts\nPublic Injuries: N/A\nOff-Site Responders Notified: Notified Only\n";

    let v1 = extractor(GrammarVersion::V1).extract(block);
    assert_eq!(v1.get("Public Injuries"), &FieldValue::Unparsed);
    assert_eq!(v1.get("Off-Site Responders Notified"), &FieldValue::Unparsed);

    let v2 = extractor(GrammarVersion::V2).extract(block);
    assert_eq!(v2.text("Public Injuries"), Some("N/A"));
    assert_eq!(v2.text("Off-Site Responders Notified"), Some("Notified Only"));

    let not_notified = extractor(GrammarVersion::V1)
        .extract("Off-Site Responders Notified: No, not notified\n");
    assert_eq!(
        not_notified.text("Off-Site Responders Notified"),
        Some("No, not notified")
    );
}

#[test]
fn unparsed_values_render_per_policy() {
    let record = extractor(GrammarVersion::V2)
        .extract("Accident History ID: Accident 6\nTemperature: unknown\n");
    let value = record.get("Temperature");

    assert_eq!(value, &FieldValue::Unparsed);
    assert_eq!(value.render(UnparsedPolicy::Null), None);
    assert_eq!(
        value.render(UnparsedPolicy::Marker),
        Some(UNPARSED_MARKER.to_string())
    );
    assert_eq!(FieldValue::Absent.render(UnparsedPolicy::Marker), None);
    assert_eq!(record.unparsed_count(), 1);
}

#[test]
fn free_text_stops_at_next_label_and_falls_through_blank_label_line() {
    let record = extractor(GrammarVersion::V2).extract(
        "Initiating Event:\nEquipment failure at valve\nWind Speed: 4.5\nUnits:\nDirection: NW\nOther Release Source: flange Valve: Yes\n",
    );

    assert_eq!(
        record.text("Initiating Event"),
        Some("Equipment failure at valve")
    );
    assert_eq!(record.text("Wind Speed"), Some("4.5"));
    assert_eq!(record.get("Wind Speed Units"), &FieldValue::Absent);
    assert_eq!(record.text("Wind Direction"), Some("NW"));
    assert_eq!(record.text("Other Release Source"), Some("flange"));
}

#[test]
fn labels_sharing_a_line_are_each_extracted() {
    let record = extractor(GrammarVersion::V2).extract(
        "Accident History ID: Accident 1\nGas Release: Yes   Fire: No\nOther Release Source: flange   Initiating Event: Human error\n",
    );

    assert_eq!(record.text("Gas Release"), Some("Yes"));
    assert_eq!(record.text("Fire"), Some("No"));
    assert_eq!(record.text("Other Release Source"), Some("flange"));
    assert_eq!(record.text("Initiating Event"), Some("Human error"));
}

#[test]
fn short_label_inside_longer_label_on_same_line_is_skipped() {
    let record = extractor(GrammarVersion::V2).extract(
        "Accident History ID: Accident 7\nOff-Site Impacts\nPublic Deaths: 4   Deaths: 1\nEvacuated: 0\n",
    );

    assert_eq!(record.text("Off-Site Public Deaths"), Some("4"));
    assert_eq!(record.text("Off-Site Deaths"), Some("1"));
}

#[test]
fn heading_word_inside_a_sentence_does_not_end_a_subsection() {
    let record = extractor(GrammarVersion::V2).extract(
        "Accident History ID: Accident 8\nOn-Site Impacts\nEmployee or Contractor Deaths: 0\nRelease Source was a flange\nPublic Deaths: 2\nOff-Site Impacts\nDeaths: 0\n",
    );

    assert_eq!(record.text("Public Deaths"), Some("2"));
    assert_eq!(record.text("Off-Site Deaths"), Some("0"));
}

#[test]
fn absent_section_yields_single_no_accident_row() {
    let document = assembler().assemble("1000", &pages(&["Section 1.\nNAICS Code: 42471\n"]));

    assert_eq!(document.outcome, DocumentOutcome::SectionAbsent);
    assert_eq!(document.rows.len(), 1);
    let row = &document.rows[0];
    assert_eq!(row.has_accident, HasAccident::No);
    assert_eq!(row.accident_count, 0);
    assert_eq!(row.naics_code.as_deref(), Some("42471"));
    assert!(row.record.is_none());
}

#[test]
fn no_records_section_yields_single_no_accident_row() {
    let document = assembler().assemble(
        "1001",
        &pages(&["Section 6. Accident History\nNo records found\nAccident History ID: Accident 1\nFire: Yes\n"]),
    );

    assert_eq!(document.outcome, DocumentOutcome::NoRecords);
    assert_eq!(document.rows.len(), 1);
    assert_eq!(document.rows[0].has_accident, HasAccident::No);
    assert_eq!(document.rows[0].accident_count, 0);
    assert_eq!(document.rows[0].facility_accident_id, None);
}

#[test]
fn unrecognized_section_yields_no_rows() {
    let document = assembler().assemble("1002", &pages(&["Section 6. Accident History\n???\n"]));
    assert_eq!(document.outcome, DocumentOutcome::NeedsReview);
    assert!(document.rows.is_empty());
}

#[test]
fn accidents_carry_document_and_block_identifiers() {
    let document = assembler().assemble(
        "100000123",
        &pages(&[
            "NAICS Code: 325311\n",
            "Section 6. Accident History\nAccident History ID: Accident 4\nNAICS Code of Process Involved: 424690\nAccident History ID: Accident 8\nFire: Yes\nSection 7. Prevention",
        ]),
    );

    assert_eq!(document.outcome, DocumentOutcome::Accidents(2));
    let ids: Vec<Option<&str>> = document
        .rows
        .iter()
        .map(|row| row.facility_accident_id.as_deref())
        .collect();
    assert_eq!(ids, vec![Some("100000123_4"), Some("100000123_8")]);
    for row in &document.rows {
        assert_eq!(row.has_accident, HasAccident::Yes);
        assert_eq!(row.accident_count, 2);
        assert_eq!(row.naics_code.as_deref(), Some("325311"));
    }
    let first = document.rows[0].record.as_ref().expect("record present");
    assert_eq!(first.text("NAICS Code of Process Involved"), Some("424690"));
}

#[test]
fn process_chemicals_carry_program_level_and_key_on_cas() {
    let chemicals = parse_process_chemicals(
        "Program Level:\nProgram 3\nChemical Name:\nAmmonia (anhydrous)\nCAS Number:\n7664-41-7\nFlammable/Toxic:\nToxic\nChemical Name: Mystery blend\nFlammable Mixture Chemical Components\nProcess NAICS\nChemical Name: Never read",
    );

    assert_eq!(chemicals.len(), 2);
    assert_eq!(chemicals[0].program_level.as_deref(), Some("Program 3"));
    assert_eq!(chemicals[0].natural_key(), Some("7664-41-7"));
    assert_eq!(chemicals[0].flammable_toxic.as_deref(), Some("Toxic"));
    assert_eq!(chemicals[1].program_level.as_deref(), Some("Program 3"));
    assert_eq!(chemicals[1].natural_key(), Some("Mystery blend"));
}

#[test]
fn process_chemical_name_closes_at_bracketed_class() {
    let chemicals = parse_process_chemicals(
        "Program Level:\nProgram 2\nChemical Name:\nChlorine\n[Toxic]\nData as of 11/29/2024\nCAS Number:\n7782-50-5\nProcess NAICS\n",
    );

    assert_eq!(chemicals.len(), 1);
    assert_eq!(chemicals[0].chemical_name, "Chlorine [Toxic]");
    assert_eq!(chemicals[0].natural_key(), Some("7782-50-5"));
}

#[test]
fn process_naics_pairs_code_with_description() {
    let naics = parse_process_naics(
        "NAICS Code:\n325311\nNAICS Description:\nNitrogenous Fertilizer\nManufacturing\nNAICS Code: 42491\nSection 6. Accident History\nNAICS Code: 1",
    );

    assert_eq!(
        naics,
        vec![
            ProcessNaics {
                naics_code: "325311".to_string(),
                naics_description: Some("Nitrogenous Fertilizer Manufacturing".to_string()),
            },
            ProcessNaics {
                naics_code: "42491".to_string(),
                naics_description: None,
            },
        ]
    );
}

#[test]
fn accident_chemicals_take_preceding_quantities_and_mixture_defaults() {
    let chemicals = parse_accident_chemicals(
        "Accident History ID: Accident 1\nFire: Yes\nChemicals in Accident History\nQuantity Released (lbs): 1200\nPercent Weight: 100.0\nChemical Name: Ammonia (anhydrous)\nCAS Number: 7664-41-7\nFlammable/Toxic: Toxic\nQuantity Released (lbs): 50\nPercent Weight:\nChemical Name: Flammable Mixture\nFlammable Mixture Chemical Components\nChemical Name: Propane\nCAS Number: 74-98-6\n",
    );

    assert_eq!(chemicals.len(), 3);
    assert_eq!(chemicals[0].quantity_released_lbs.as_deref(), Some("1200"));
    assert_eq!(chemicals[0].percent_weight.as_deref(), Some("100.0"));
    assert_eq!(chemicals[0].chemical.cas_number.as_deref(), Some("7664-41-7"));
    assert_eq!(chemicals[1].quantity_released_lbs.as_deref(), Some("50"));
    assert_eq!(chemicals[1].percent_weight.as_deref(), Some("N/A"));
    assert_eq!(chemicals[2].chemical.chemical_name, "Propane");
    assert_eq!(chemicals[2].quantity_released_lbs.as_deref(), Some("N/A"));
    assert_eq!(chemicals[2].percent_weight.as_deref(), Some("N/A"));
}

#[test]
fn accident_chemicals_absent_without_heading() {
    assert!(parse_accident_chemicals("Accident History ID: Accident 1\nFire: No\n").is_empty());
}
