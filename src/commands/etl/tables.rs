use super::*;

pub(super) const CHEMICAL_TABLE: &str = "rmp_chemical";
pub(super) const FACILITY_CHEMICALS_TABLE: &str = "rmp_facility_chemicals";
pub(super) const NAICS_TABLE: &str = "rmp_naics";
pub(super) const FACILITY_NAICS_TABLE: &str = "rmp_facility_naics";
pub(super) const FACILITY_ACCIDENTS_TABLE: &str = "rmp_facility_accidents";
pub(super) const ACCIDENT_CHEMICALS_TABLE: &str = "rmp_accident_chemicals";

pub(super) const CHEMICAL_HEADER: &[&str] =
    &["chemical_id", "chemical_name", "cas_number", "flammable_toxic"];
pub(super) const FACILITY_CHEMICALS_HEADER: &[&str] =
    &["facility_chemical_id", "facility_id", "chemical_id", "program_level"];
pub(super) const NAICS_HEADER: &[&str] = &["naics_id", "naics_code", "naics_description"];
pub(super) const FACILITY_NAICS_HEADER: &[&str] =
    &["facility_naics_id", "facility_id", "naics_code"];
pub(super) const FACILITY_ACCIDENTS_HEADER: &[&str] = &[
    "facility_accident_id",
    "accident_id",
    "facility_id",
    "date_of_accident",
    "time_accident_began",
    "release_duration",
    "naics_code",
];
pub(super) const ACCIDENT_CHEMICALS_HEADER: &[&str] = &[
    "accident_chemical_id",
    "facility_accident_chemical_id",
    "facility_accident_id",
    "quantity_released_lbs",
    "percent_weight",
    "chemical_id",
];

/// Rows one report contributes to each relational table.
#[derive(Debug, Default)]
pub(super) struct FacilityRows {
    pub(super) chemicals: Vec<Vec<String>>,
    pub(super) facility_chemicals: Vec<Vec<String>>,
    pub(super) naics: Vec<Vec<String>>,
    pub(super) facility_naics: Vec<Vec<String>>,
    pub(super) accidents: Vec<Vec<String>>,
    pub(super) accident_chemicals: Vec<Vec<String>>,
}

/// The six relational CSVs of one run, flushed together per batch.
pub(super) struct RelationalTables {
    chemicals: TableWriter,
    facility_chemicals: TableWriter,
    naics: TableWriter,
    facility_naics: TableWriter,
    accidents: TableWriter,
    accident_chemicals: TableWriter,
}

impl RelationalTables {
    pub(super) fn open(dir: &Path, batch_size: usize) -> Result<Self> {
        let open = |table: &str, header: &[&str]| {
            TableWriter::open(&dir.join(format!("{table}.csv")), header, batch_size)
        };
        Ok(Self {
            chemicals: open(CHEMICAL_TABLE, CHEMICAL_HEADER)?,
            facility_chemicals: open(FACILITY_CHEMICALS_TABLE, FACILITY_CHEMICALS_HEADER)?,
            naics: open(NAICS_TABLE, NAICS_HEADER)?,
            facility_naics: open(FACILITY_NAICS_TABLE, FACILITY_NAICS_HEADER)?,
            accidents: open(FACILITY_ACCIDENTS_TABLE, FACILITY_ACCIDENTS_HEADER)?,
            accident_chemicals: open(ACCIDENT_CHEMICALS_TABLE, ACCIDENT_CHEMICALS_HEADER)?,
        })
    }

    pub(super) fn push(&mut self, rows: FacilityRows) -> Result<()> {
        let targets = [
            (&mut self.chemicals, rows.chemicals),
            (&mut self.facility_chemicals, rows.facility_chemicals),
            (&mut self.naics, rows.naics),
            (&mut self.facility_naics, rows.facility_naics),
            (&mut self.accidents, rows.accidents),
            (&mut self.accident_chemicals, rows.accident_chemicals),
        ];
        for (writer, rows) in targets {
            for row in rows {
                writer.push(row)?;
            }
        }
        Ok(())
    }

    pub(super) fn finish_document(&mut self) -> Result<()> {
        for writer in self.writers_mut() {
            writer.finish_document()?;
        }
        Ok(())
    }

    /// Flushes every table and returns rows written per table.
    pub(super) fn close(self) -> Result<Vec<TableCount>> {
        let tables = [
            (CHEMICAL_TABLE, self.chemicals),
            (FACILITY_CHEMICALS_TABLE, self.facility_chemicals),
            (NAICS_TABLE, self.naics),
            (FACILITY_NAICS_TABLE, self.facility_naics),
            (FACILITY_ACCIDENTS_TABLE, self.accidents),
            (ACCIDENT_CHEMICALS_TABLE, self.accident_chemicals),
        ];

        let mut counts = Vec::with_capacity(tables.len());
        for (table, writer) in tables {
            let summary = writer.close()?;
            counts.push(TableCount {
                table: table.to_string(),
                rows: summary.rows_written as i64,
            });
        }
        Ok(counts)
    }

    fn writers_mut(&mut self) -> [&mut TableWriter; 6] {
        [
            &mut self.chemicals,
            &mut self.facility_chemicals,
            &mut self.naics,
            &mut self.facility_naics,
            &mut self.accidents,
            &mut self.accident_chemicals,
        ]
    }
}
