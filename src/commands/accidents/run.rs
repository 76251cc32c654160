use super::*;

pub fn run(args: AccidentsArgs) -> Result<()> {
    let stamp = RunStamp::start();
    let run_id = stamp.run_id();
    let manifest_path = stamp.manifest_path(&args.data_root, "accidents");
    let output_csv = args.output_csv.clone().unwrap_or_else(|| {
        args.data_root.join(match args.output {
            AccidentOutput::Summary => "rmp_accident_history.csv",
            AccidentOutput::Detailed => "rmp_accident_history_detailed.csv",
        })
    });

    info!(
        run_id = %run_id,
        reports_dir = %args.reports_dir.display(),
        output = args.output.as_str(),
        grammar = args.grammar.as_str(),
        "starting accident history scrape"
    );

    let discovery = discover_reports(&args.reports_dir)?;
    let mut counts = DocumentCounts {
        skipped: discovery.skipped.len(),
        ..DocumentCounts::default()
    };
    let mut warnings = Vec::new();

    let expected = args
        .expected_csv
        .as_deref()
        .map(ExpectedCounts::load)
        .transpose()?;
    let reports = match &expected {
        Some(expected) => {
            let (kept, excluded) = expected.retain_reports(discovery.reports);
            info!(
                kept = kept.len(),
                excluded,
                "restricted reports to facilities with expected accidents"
            );
            kept
        }
        None => discovery.reports,
    };
    counts.report_count = reports.len();

    let grammar = Grammar::new(args.grammar);
    let assembler = RecordAssembler::new(grammar.clone())?;
    let header = output_header(args.output, &grammar);
    let mut writer = TableWriter::open(&output_csv, &header, args.batch_size)?;
    if let Some(column) = args.dedup_key_column.as_deref() {
        writer = writer.dedup_on(column)?;
    }

    let mut needs_review = Vec::new();
    let mut failures = Vec::new();
    let mut facilities_without_accidents = Vec::new();
    let mut unparsed_fields = 0usize;
    let mut empty_pages = 0usize;

    for report in &reports {
        let pages = match extract_pages(&report.path, args.max_pages_per_doc) {
            Ok(pages) => pages,
            Err(err) => {
                log_document_error(&report.facility_id, &report.path, &err);
                counts.errored += 1;
                failures.push(DocumentFailure {
                    facility_id: report.facility_id.clone(),
                    path: report.path.display().to_string(),
                    error: format!("{err:#}"),
                });
                continue;
            }
        };

        let document = assembler.assemble(&report.facility_id, &pages);
        empty_pages += document.empty_pages;
        match document.outcome {
            DocumentOutcome::SectionAbsent => {
                warn!(
                    facility_id = %report.facility_id,
                    path = %report.path.display(),
                    "accident history section not found"
                );
                counts.skipped += 1;
            }
            DocumentOutcome::NeedsReview => {
                counts.needs_review += 1;
                needs_review.push(report.facility_id.clone());
            }
            DocumentOutcome::NoRecords | DocumentOutcome::Accidents(_) => counts.processed += 1,
        }

        if let DocumentOutcome::Accidents(found) = document.outcome {
            counts.accidents_found += found;
        } else if expected.is_some() {
            warn!(
                facility_id = %report.facility_id,
                "facility expected to report accidents but none were extracted"
            );
            facilities_without_accidents.push(report.facility_id.clone());
        }

        unparsed_fields += document
            .rows
            .iter()
            .filter_map(|row| row.record.as_ref())
            .map(|record| record.unparsed_count())
            .sum::<usize>();

        for row in document_rows(args.output, &document, &grammar, args.unparsed_policy)? {
            writer.push(row)?;
        }
        writer.finish_document()?;
    }

    let written = writer.close()?;
    counts.rows_written = written.rows_written;
    counts.rows_deduplicated = written.rows_deduplicated;

    if empty_pages > 0 {
        warnings.push(format!("{empty_pages} pages had no extractable text"));
    }
    if unparsed_fields > 0 {
        warnings.push(format!(
            "{unparsed_fields} labelled fields had values of unexpected shape"
        ));
    }

    let comparison = expected
        .as_ref()
        .map(|expected| expected.compare(counts.accidents_found, facilities_without_accidents));

    let manifest = RunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        command: "accidents".to_string(),
        status: if counts.errored == 0 {
            "completed".to_string()
        } else {
            "completed_with_errors".to_string()
        },
        started_at: stamp.started_at(),
        updated_at: now_utc_string(),
        elapsed_seconds: stamp.elapsed_seconds(),
        paths: RunPaths {
            data_root: args.data_root.display().to_string(),
            input: args.reports_dir.display().to_string(),
            output: output_csv.display().to_string(),
        },
        settings: vec![
            format!("output={}", args.output.as_str()),
            format!("grammar={}", args.grammar.as_str()),
            format!("unparsed_policy={:?}", args.unparsed_policy),
            format!("batch_size={}", args.batch_size),
            format!(
                "dedup_key_column={}",
                args.dedup_key_column.as_deref().unwrap_or("")
            ),
        ],
        counts,
        expected: comparison,
        table_counts: Vec::new(),
        needs_review,
        failures,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        manifest = %manifest_path.display(),
        output = %output_csv.display(),
        processed = manifest.counts.processed,
        skipped = manifest.counts.skipped,
        errored = manifest.counts.errored,
        needs_review = manifest.counts.needs_review,
        accidents = manifest.counts.accidents_found,
        rows_written = manifest.counts.rows_written,
        "accident history scrape completed"
    );

    Ok(())
}
