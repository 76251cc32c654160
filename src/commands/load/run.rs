use super::*;

pub(crate) fn default_db_path(data_root: &Path) -> PathBuf {
    data_root.join("risk-management-plans.sqlite")
}

pub fn run(args: LoadArgs) -> Result<()> {
    let stamp = RunStamp::start();
    let run_id = stamp.run_id();
    let manifest_path = stamp.manifest_path(&args.data_root, "load");
    let csv_dir = args
        .csv_dir
        .clone()
        .unwrap_or_else(|| args.data_root.join("relational"));
    let facility_csv = args
        .facility_csv
        .clone()
        .unwrap_or_else(|| csv_dir.join("rmp_facility.csv"));
    let detail_csv = args
        .detail_csv
        .clone()
        .unwrap_or_else(|| args.data_root.join("rmp_accident_history_detailed.csv"));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.data_root));

    info!(
        run_id = %run_id,
        csv_dir = %csv_dir.display(),
        db_path = %db_path.display(),
        "starting database load"
    );

    ensure_parent_directory(&db_path)?;
    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;

    let grammar = Grammar::new(args.grammar);
    let facility: &dyn RowAdapter = &FacilityColumns;
    let same_names: &dyn RowAdapter = &SameNames;
    let detail = DetailColumns { grammar: &grammar };
    let detail: &dyn RowAdapter = &detail;
    let mut sources = vec![("rmp_facility", facility_csv, facility)];
    for table in [
        "rmp_chemical",
        "rmp_facility_chemicals",
        "rmp_naics",
        "rmp_facility_naics",
        "rmp_facility_accidents",
        "rmp_accident_chemicals",
    ] {
        sources.push((table, csv_dir.join(format!("{table}.csv")), same_names));
    }
    sources.push(("rmp_accident_history_detail", detail_csv, detail));

    let mut counts = DocumentCounts::default();
    let mut warnings = Vec::new();

    let tx = connection
        .transaction()
        .context("failed to start load transaction")?;
    recreate_schema(&tx, &grammar)?;

    for (table, path, adapter) in &sources {
        if !path.exists() {
            warn!(table, path = %path.display(), "CSV not found; table left empty");
            warnings.push(format!("{table}: {} not found", path.display()));
            counts.skipped += 1;
            continue;
        }

        let summary = import_csv(&tx, table, path, *adapter)?;
        info!(
            table,
            path = %path.display(),
            read = summary.rows_read,
            inserted = summary.rows_inserted,
            skipped = summary.rows_skipped,
            duplicates = summary.duplicates,
            nulled = summary.values_nulled,
            "imported CSV"
        );
        if summary.values_nulled > 0 {
            warnings.push(format!(
                "{table}: {} values did not match their column type and were stored as NULL",
                summary.values_nulled
            ));
        }
        if summary.duplicates > 0 {
            warnings.push(format!(
                "{table}: {} rows repeated an existing primary key",
                summary.duplicates
            ));
        }
        counts.processed += 1;
        counts.rows_written += summary.rows_inserted;
        counts.rows_deduplicated += summary.duplicates;
    }

    write_metadata(&tx, &grammar)?;
    tx.commit().context("failed to commit load transaction")?;

    if args.skip_views {
        info!("skipping view rebuild");
    } else {
        rebuild_views(&mut connection)?;
    }

    let manifest = RunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        command: "load".to_string(),
        status: "completed".to_string(),
        started_at: stamp.started_at(),
        updated_at: now_utc_string(),
        elapsed_seconds: stamp.elapsed_seconds(),
        paths: RunPaths {
            data_root: args.data_root.display().to_string(),
            input: csv_dir.display().to_string(),
            output: db_path.display().to_string(),
        },
        settings: vec![
            format!("grammar={}", args.grammar.as_str()),
            format!("skip_views={}", args.skip_views),
        ],
        counts,
        expected: None,
        table_counts: table_counts(&connection)?,
        needs_review: Vec::new(),
        failures: Vec::new(),
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;

    info!(
        run_id = %run_id,
        manifest = %manifest_path.display(),
        tables_loaded = manifest.counts.processed,
        rows = manifest.counts.rows_written,
        "database load completed"
    );

    Ok(())
}

pub fn run_views(args: ViewsArgs) -> Result<()> {
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| default_db_path(&args.data_root));
    if !db_path.exists() {
        bail!("database not found: {}", db_path.display());
    }

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    rebuild_views(&mut connection)?;

    info!(db_path = %db_path.display(), "views rebuilt");
    Ok(())
}
