use super::*;

#[derive(Debug, Deserialize)]
struct SummaryRecord {
    #[serde(rename = "EPA Facility ID")]
    facility_id: String,
    #[serde(rename = "Has Accident")]
    has_accident: String,
    #[serde(rename = "Accident Count", default)]
    accident_count: Option<String>,
}

/// Accident counts per facility taken from an earlier summary CSV.
#[derive(Debug, Clone)]
pub(super) struct ExpectedCounts {
    path: PathBuf,
    counts: BTreeMap<String, usize>,
}

impl ExpectedCounts {
    /// Keeps only facilities reported with `Has Accident = Yes`.
    pub(super) fn load(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .with_context(|| format!("failed to open expected summary {}", path.display()))?;

        let mut counts = BTreeMap::new();
        for record in reader.deserialize::<SummaryRecord>() {
            let record =
                record.with_context(|| format!("failed to read row in {}", path.display()))?;
            if !record.has_accident.trim().eq_ignore_ascii_case("yes") {
                continue;
            }
            let count = record
                .accident_count
                .as_deref()
                .and_then(parse_count)
                .unwrap_or(0);
            counts.insert(record.facility_id.trim().to_string(), count);
        }

        info!(
            path = %path.display(),
            facilities = counts.len(),
            "loaded expected accident counts"
        );
        Ok(Self {
            path: path.to_path_buf(),
            counts,
        })
    }

    pub(super) fn contains(&self, facility_id: &str) -> bool {
        self.counts.contains_key(facility_id)
    }

    pub(super) fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub(super) fn retain_reports(&self, reports: Vec<ReportFile>) -> (Vec<ReportFile>, usize) {
        let before = reports.len();
        let kept: Vec<ReportFile> = reports
            .into_iter()
            .filter(|report| self.contains(&report.facility_id))
            .collect();
        let excluded = before - kept.len();
        (kept, excluded)
    }

    pub(super) fn compare(
        &self,
        extracted_total: usize,
        facilities_without_accidents: Vec<String>,
    ) -> ExpectedComparison {
        let expected_total = self.total();
        if expected_total == extracted_total {
            info!(expected_total, extracted_total, "accident totals match");
        } else {
            warn!(expected_total, extracted_total, "accident totals differ");
        }

        ExpectedComparison {
            expected_csv: self.path.display().to_string(),
            expected_total,
            extracted_total,
            facilities_without_accidents,
        }
    }
}

/// Accepts `3` as well as `3.0`, which spreadsheet round trips tend to produce.
fn parse_count(raw: &str) -> Option<usize> {
    let raw = raw.trim();
    raw.parse::<usize>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|value| value.is_finite() && *value >= 0.0)
            .map(|value| value as usize)
    })
}
