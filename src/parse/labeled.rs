/// One `Label: value` entry; continuation lines are folded into `value`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledEntry {
    pub label: &'static str,
    pub value: String,
}

/// Line state machine for the report's stacked `Label:` / value layout.
///
/// A line starting with a known label opens a new entry whose value is the
/// rest of that line; following unlabelled lines are appended to it. The
/// first line starting with a stop prefix ends the scan.
#[derive(Debug, Clone, Copy)]
pub struct LabeledLineParser {
    labels: &'static [&'static str],
    stops: &'static [&'static str],
    skips: &'static [&'static str],
    closers: &'static [(&'static str, &'static str)],
}

impl LabeledLineParser {
    pub const fn new(labels: &'static [&'static str]) -> Self {
        Self {
            labels,
            stops: &[],
            skips: &[],
            closers: &[],
        }
    }

    pub const fn stop_at(self, stops: &'static [&'static str]) -> Self {
        Self { stops, ..self }
    }

    /// Lines containing any of these phrases are dropped outright.
    pub const fn skip_lines(self, skips: &'static [&'static str]) -> Self {
        Self { skips, ..self }
    }

    /// `(label, suffix)` pairs: an entry for `label` closes once its value ends
    /// with `suffix`, and unlabelled lines after it are dropped until the next
    /// label.
    pub const fn close_after(self, closers: &'static [(&'static str, &'static str)]) -> Self {
        Self { closers, ..self }
    }

    fn closes(&self, entry: &LabeledEntry) -> bool {
        self.closers
            .iter()
            .any(|(label, suffix)| entry.label == *label && entry.value.ends_with(suffix))
    }

    pub fn entries(&self, text: &str) -> Vec<LabeledEntry> {
        let mut entries: Vec<LabeledEntry> = Vec::new();
        let mut open = false;

        for line in text.lines().map(str::trim) {
            if line.is_empty() {
                continue;
            }
            if self.stops.iter().any(|stop| line.starts_with(stop)) {
                break;
            }
            if self.skips.iter().any(|skip| line.contains(skip)) {
                continue;
            }

            if let Some(label) = self.labels.iter().copied().find(|label| line.starts_with(label)) {
                let entry = LabeledEntry {
                    label,
                    value: line[label.len()..].trim().to_string(),
                };
                open = !self.closes(&entry);
                entries.push(entry);
                continue;
            }

            if !open {
                continue;
            }
            if let Some(current) = entries.last_mut() {
                if !current.value.is_empty() {
                    current.value.push(' ');
                }
                current.value.push_str(line);
                open = !self.closes(current);
            }
        }

        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: &[&str] = &["Chemical Name:", "CAS Number:"];

    #[test]
    fn continuation_lines_fold_into_open_entry() {
        let parser = LabeledLineParser::new(LABELS).stop_at(&["Process NAICS"]);
        let entries = parser.entries(
            "preamble ignored\nChemical Name:\nAmmonia (anhydrous)\n[Toxic]\nCAS Number: 7664-41-7\nProcess NAICS\nChemical Name: Never",
        );

        assert_eq!(
            entries,
            vec![
                LabeledEntry {
                    label: "Chemical Name:",
                    value: "Ammonia (anhydrous) [Toxic]".to_string(),
                },
                LabeledEntry {
                    label: "CAS Number:",
                    value: "7664-41-7".to_string(),
                },
            ]
        );
    }

    #[test]
    fn closed_entry_drops_trailing_unlabelled_lines() {
        let parser = LabeledLineParser::new(LABELS).close_after(&[("Chemical Name:", "]")]);
        let entries = parser.entries(
            "Chemical Name:\nAmmonia (anhydrous)\n[Toxic]\nPage 3 of 40\nCAS Number: 7664-41-7\nChemical Name: Chlorine [Toxic]\nstray line\n",
        );

        assert_eq!(
            entries,
            vec![
                LabeledEntry {
                    label: "Chemical Name:",
                    value: "Ammonia (anhydrous) [Toxic]".to_string(),
                },
                LabeledEntry {
                    label: "CAS Number:",
                    value: "7664-41-7".to_string(),
                },
                LabeledEntry {
                    label: "Chemical Name:",
                    value: "Chlorine [Toxic]".to_string(),
                },
            ]
        );
    }

    #[test]
    fn skipped_lines_do_not_reach_entries() {
        let parser = LabeledLineParser::new(LABELS)
            .skip_lines(&["Flammable Mixture Chemical Components"]);
        let entries =
            parser.entries("Chemical Name: Propane\nFlammable Mixture Chemical Components\n");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].value, "Propane");
    }
}
