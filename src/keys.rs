use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use csv::ReaderBuilder;
use tracing::info;

/// Surrogate id for a natural key, and whether this call assigned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assigned {
    pub id: i64,
    pub is_new: bool,
}

#[derive(Debug, Default)]
struct Dimension {
    ids: HashMap<String, i64>,
    next_id: i64,
}

impl Dimension {
    fn assign(&mut self, key: &str) -> Assigned {
        if let Some(id) = self.ids.get(key) {
            return Assigned {
                id: *id,
                is_new: false,
            };
        }
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.ids.insert(key.to_string(), id);
        Assigned { id, is_new: true }
    }

    fn seed(&mut self, key: String, id: i64) {
        self.next_id = self.next_id.max(id + 1);
        self.ids.insert(key, id);
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Counter {
    next: i64,
}

impl Counter {
    fn next(&mut self) -> i64 {
        let id = self.next.max(1);
        self.next = id + 1;
        id
    }

    fn seed(&mut self, last: i64) {
        self.next = self.next.max(last + 1);
    }
}

/// Surrogate keys for one relational scrape run.
///
/// Chemicals are keyed on CAS number (name when no CAS is printed), NAICS
/// rows on the code. Junction tables only need monotonic ids.
#[derive(Debug, Default)]
pub struct KeyRegistry {
    chemicals: Dimension,
    naics: Dimension,
    facility_chemicals: Counter,
    facility_naics: Counter,
    accident_chemicals: Counter,
}

impl KeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues numbering from the relational CSVs already in `dir`, so an
    /// appended run never reuses an id.
    pub fn seed_from_dir(dir: &Path) -> Result<Self> {
        let mut registry = Self::new();

        for (key, id) in read_keyed_ids(&dir.join("rmp_chemical.csv"), "chemical_id", |row| {
            natural_chemical_key(row.get("cas_number"), row.get("chemical_name"))
        })? {
            registry.chemicals.seed(key, id);
        }
        for (key, id) in read_keyed_ids(&dir.join("rmp_naics.csv"), "naics_id", |row| {
            row.get("naics_code").filter(|code| !code.is_empty()).map(ToOwned::to_owned)
        })? {
            registry.naics.seed(key, id);
        }

        registry
            .facility_chemicals
            .seed(max_id(&dir.join("rmp_facility_chemicals.csv"), "facility_chemical_id")?);
        registry
            .facility_naics
            .seed(max_id(&dir.join("rmp_facility_naics.csv"), "facility_naics_id")?);
        registry
            .accident_chemicals
            .seed(max_id(&dir.join("rmp_accident_chemicals.csv"), "accident_chemical_id")?);

        info!(
            dir = %dir.display(),
            chemicals = registry.chemicals.ids.len(),
            naics = registry.naics.ids.len(),
            "seeded surrogate keys"
        );
        Ok(registry)
    }

    pub fn chemical(&mut self, natural_key: &str) -> Assigned {
        self.chemicals.assign(natural_key)
    }

    pub fn naics(&mut self, naics_code: &str) -> Assigned {
        self.naics.assign(naics_code)
    }

    pub fn next_facility_chemical_id(&mut self) -> i64 {
        self.facility_chemicals.next()
    }

    pub fn next_facility_naics_id(&mut self) -> i64 {
        self.facility_naics.next()
    }

    pub fn next_accident_chemical_id(&mut self) -> i64 {
        self.accident_chemicals.next()
    }
}

pub fn natural_chemical_key(cas_number: Option<&str>, chemical_name: Option<&str>) -> Option<String> {
    cas_number
        .filter(|cas| !cas.is_empty())
        .or(chemical_name.filter(|name| !name.is_empty()))
        .map(ToOwned::to_owned)
}

/// Header-addressed view of one CSV record.
struct NamedRow<'a> {
    header: &'a csv::StringRecord,
    record: &'a csv::StringRecord,
}

impl NamedRow<'_> {
    fn get(&self, column: &str) -> Option<&str> {
        self.header
            .iter()
            .position(|name| name == column)
            .and_then(|index| self.record.get(index))
    }
}

fn read_keyed_ids(
    path: &Path,
    id_column: &str,
    key: impl Fn(&NamedRow<'_>) -> Option<String>,
) -> Result<Vec<(String, i64)>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let header = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();

    let mut pairs = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("failed to read row in {}", path.display()))?;
        let row = NamedRow {
            header: &header,
            record: &record,
        };
        let id = row.get(id_column).and_then(|value| value.trim().parse::<i64>().ok());
        if let (Some(key), Some(id)) = (key(&row), id) {
            pairs.push((key, id));
        }
    }
    Ok(pairs)
}

fn max_id(path: &Path, id_column: &str) -> Result<i64> {
    let ids = read_keyed_ids(path, id_column, |_| Some(String::new()))?;
    Ok(ids.into_iter().map(|(_, id)| id).max().unwrap_or(0))
}
