use super::*;

pub fn run(args: EtlArgs) -> Result<()> {
    let stamp = RunStamp::start();
    let run_id = stamp.run_id();
    let manifest_path = stamp.manifest_path(&args.data_root, "etl");
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.data_root.join("relational"));
    ensure_directory(&output_dir)?;

    info!(
        run_id = %run_id,
        reports_dir = %args.reports_dir.display(),
        output_dir = %output_dir.display(),
        "starting relational scrape"
    );

    let discovery = discover_reports(&args.reports_dir)?;
    let mut counts = DocumentCounts {
        report_count: discovery.reports.len(),
        skipped: discovery.skipped.len(),
        ..DocumentCounts::default()
    };

    let parser = RelationalParser::new()?;
    let mut registry = KeyRegistry::seed_from_dir(&output_dir)?;
    let mut tables = RelationalTables::open(&output_dir, args.batch_size)?;

    let mut needs_review = Vec::new();
    let mut failures = Vec::new();
    let mut accident_chemicals = 0usize;
    let mut facilities_with_accidents = 0usize;

    for report in &discovery.reports {
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

        let slices = match parser.slice(&pages) {
            Slicing::Found(slices) => slices,
            Slicing::Missing(heading) => {
                warn!(
                    facility_id = %report.facility_id,
                    path = %report.path.display(),
                    heading,
                    "report section not found; skipping"
                );
                counts.skipped += 1;
                continue;
            }
        };

        let (rows, stats) = parser.facility_rows(&report.facility_id, &slices, &mut registry);
        tables.push(rows)?;
        tables.finish_document()?;

        counts.processed += 1;
        counts.accidents_found += stats.accidents;
        accident_chemicals += stats.accident_chemicals;
        if stats.accidents > 0 {
            facilities_with_accidents += 1;
        }
        if stats.needs_review {
            counts.needs_review += 1;
            needs_review.push(report.facility_id.clone());
        }
    }

    let table_counts = tables.close()?;
    counts.rows_written = table_counts.iter().map(|count| count.rows as usize).sum();

    let manifest = RunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        command: "etl".to_string(),
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
            output: output_dir.display().to_string(),
        },
        settings: vec![format!("batch_size={}", args.batch_size)],
        counts,
        expected: None,
        table_counts,
        needs_review,
        failures,
        warnings: Vec::new(),
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        manifest = %manifest_path.display(),
        processed = manifest.counts.processed,
        skipped = manifest.counts.skipped,
        errored = manifest.counts.errored,
        facilities_with_accidents,
        accidents = manifest.counts.accidents_found,
        accident_chemicals,
        "relational scrape completed"
    );

    Ok(())
}
