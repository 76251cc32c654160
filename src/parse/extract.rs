use anyhow::{Context, Result};
use regex::Regex;

use super::grammar::{FieldSpec, Grammar, SUBSECTION_HEADINGS, Scope, ValueShape};
use crate::cli::UnparsedPolicy;

pub const UNPARSED_MARKER: &str = "[unparsed]";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Absent,
    /// The label is present but its value does not have the expected shape.
    Unparsed,
    Text(String),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn render(&self, policy: UnparsedPolicy) -> Option<String> {
        match (self, policy) {
            (Self::Text(value), _) => Some(value.clone()),
            (Self::Unparsed, UnparsedPolicy::Marker) => Some(UNPARSED_MARKER.to_string()),
            (Self::Unparsed, UnparsedPolicy::Null) | (Self::Absent, _) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccidentRecord {
    pub history_id: Option<String>,
    pub values: Vec<(&'static str, FieldValue)>,
}

impl AccidentRecord {
    pub fn get(&self, column: &str) -> &FieldValue {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, value)| value)
            .unwrap_or(&FieldValue::Absent)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).as_text()
    }

    pub fn unparsed_count(&self) -> usize {
        self.values
            .iter()
            .filter(|(_, value)| *value == FieldValue::Unparsed)
            .count()
    }
}

struct CompiledField {
    spec: FieldSpec,
    label: Regex,
    /// Longer grammar labels ending in this one, e.g. `Public Deaths:` for `Deaths:`.
    longer_labels: Vec<&'static str>,
    value: Option<Regex>,
}

impl CompiledField {
    /// First label occurrence at line start or after whitespace that is not
    /// the tail of a longer label.
    fn find_label<'a>(&self, text: &'a str) -> Option<regex::Match<'a>> {
        self.label.find_iter(text).find(|hit| {
            let preceded_by_space = text[..hit.start()]
                .chars()
                .next_back()
                .is_none_or(char::is_whitespace);
            preceded_by_space && !self.is_tail_of_longer_label(text, hit.end())
        })
    }

    fn is_tail_of_longer_label(&self, text: &str, end: usize) -> bool {
        self.longer_labels.iter().any(|longer| {
            end.checked_sub(longer.len())
                .and_then(|start| text.get(start..end))
                .is_some_and(|candidate| candidate.eq_ignore_ascii_case(longer))
        })
    }
}

/// Applies a [`Grammar`] to the text of one accident block.
pub struct FieldExtractor {
    fields: Vec<CompiledField>,
    any_label: Regex,
    heading: Regex,
    history_id: Regex,
}

impl FieldExtractor {
    pub fn new(grammar: Grammar) -> Result<Self> {
        let mut fields = Vec::with_capacity(grammar.fields().len());
        for spec in grammar.fields() {
            let label = Regex::new(&format!("(?i){}", regex::escape(spec.label)))
                .with_context(|| format!("failed to compile label regex for {}", spec.column))?;
            let longer_labels = grammar
                .fields()
                .iter()
                .map(|other| other.label)
                .filter(|other| {
                    other.len() > spec.label.len()
                        && other
                            .to_ascii_lowercase()
                            .ends_with(&spec.label.to_ascii_lowercase())
                })
                .collect();
            let value = value_pattern(spec.shape)
                .map(|pattern| {
                    Regex::new(&format!(r"(?i)^\s*(?:{pattern})"))
                        .with_context(|| format!("failed to compile value regex for {}", spec.column))
                })
                .transpose()?;
            fields.push(CompiledField {
                spec: *spec,
                label,
                longer_labels,
                value,
            });
        }

        let mut labels: Vec<&str> = grammar.fields().iter().map(|spec| spec.label).collect();
        labels.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        labels.dedup();
        let any_label = Regex::new(&format!(
            "(?i){}",
            labels
                .iter()
                .map(|label| regex::escape(label))
                .collect::<Vec<_>>()
                .join("|")
        ))
        .context("failed to compile field label union regex")?;

        let heading = Regex::new(&format!(
            r"(?im)^[ \t]*({})[ \t]*$",
            SUBSECTION_HEADINGS
                .iter()
                .map(|heading| regex::escape(heading))
                .collect::<Vec<_>>()
                .join("|")
        ))
        .context("failed to compile subsection heading regex")?;

        let history_id = Regex::new(r"(?i)Accident History ID:\s*Accident\s+(\d+)")
            .context("failed to compile accident history id regex")?;

        Ok(Self {
            fields,
            any_label,
            heading,
            history_id,
        })
    }

    /// Never fails: a missing label yields [`FieldValue::Absent`] and a
    /// malformed value yields [`FieldValue::Unparsed`].
    pub fn extract(&self, block: &str) -> AccidentRecord {
        let history_id = self
            .history_id
            .captures(block)
            .and_then(|captures| captures.get(1))
            .map(|value| value.as_str().to_string());

        let values = self
            .fields
            .iter()
            .map(|field| (field.spec.column, self.extract_field(field, block)))
            .collect();

        AccidentRecord { history_id, values }
    }

    fn extract_field(&self, field: &CompiledField, block: &str) -> FieldValue {
        let scoped = match field.spec.scope {
            Scope::Block => block,
            scope => match scope.heading().and_then(|heading| self.subsection(block, heading)) {
                Some(text) => text,
                None => return FieldValue::Absent,
            },
        };

        let Some(label) = field.find_label(scoped) else {
            return FieldValue::Absent;
        };
        let rest = &scoped[label.end()..];

        match &field.value {
            Some(pattern) => match pattern.captures(rest) {
                Some(captures) => normalize(field.spec.shape, &captures),
                None => FieldValue::Unparsed,
            },
            None => self.free_text(rest),
        }
    }

    fn subsection<'a>(&self, block: &'a str, heading: &str) -> Option<&'a str> {
        let mut headings = self.heading.captures_iter(block);
        let start = headings.by_ref().find_map(|captures| {
            let name = captures.get(1)?;
            if !name.as_str().eq_ignore_ascii_case(heading) {
                return None;
            }
            captures.get(0).map(|whole| whole.end())
        })?;
        let end = headings
            .next()
            .and_then(|captures| captures.get(0))
            .map(|whole| whole.start())
            .unwrap_or(block.len());
        Some(&block[start..end])
    }

    fn free_text(&self, rest: &str) -> FieldValue {
        let mut lines = rest.split('\n');
        let first = lines.next().unwrap_or_default();
        let candidate = if first.trim().is_empty() {
            lines.find(|line| !line.trim().is_empty()).unwrap_or_default()
        } else {
            first
        };

        let cut = self
            .any_label
            .find(candidate)
            .map(|next| &candidate[..next.start()])
            .unwrap_or(candidate);
        let value = cut.trim();

        if value.is_empty() {
            FieldValue::Absent
        } else {
            FieldValue::Text(value.to_string())
        }
    }
}

fn value_pattern(shape: ValueShape) -> Option<String> {
    let pattern = match shape {
        ValueShape::ShortDate => r"([A-Za-z]+\s*\d{4})\b".to_string(),
        ValueShape::Time => r"(\d{2}:\d{2})\b".to_string(),
        ValueShape::Integer => r"(-?\d+)\b".to_string(),
        ValueShape::IntegerOrNa => r"(\d+\b|N/A)".to_string(),
        ValueShape::Money => r"\$?\s*(\d[\d,]*)\b".to_string(),
        ValueShape::Decimal => r"(\d+\.?\d*)".to_string(),
        ValueShape::Letter => r"([A-Z])\b".to_string(),
        ValueShape::DurationHours | ValueShape::DurationMinutes => {
            r"(\d+)\s*Hours\s*(\d+)\s*Minutes".to_string()
        }
        ValueShape::YesNo => r"(Yes|No|N/A)\b".to_string(),
        ValueShape::Choice(options) => {
            let mut options = options.to_vec();
            options.sort_by_key(|option| std::cmp::Reverse(option.len()));
            format!(
                "({})",
                options
                    .iter()
                    .map(|option| regex::escape(option))
                    .collect::<Vec<_>>()
                    .join("|")
            )
        }
        ValueShape::Text => return None,
    };
    Some(pattern)
}

fn normalize(shape: ValueShape, captures: &regex::Captures<'_>) -> FieldValue {
    let group = match shape {
        ValueShape::DurationMinutes => 2,
        _ => 1,
    };
    let Some(raw) = captures.get(group).map(|value| value.as_str()) else {
        return FieldValue::Unparsed;
    };

    let value = match shape {
        ValueShape::ShortDate => raw.split_whitespace().collect::<Vec<_>>().join(" "),
        ValueShape::Letter => raw.to_ascii_uppercase(),
        ValueShape::Money => raw.replace(',', ""),
        ValueShape::IntegerOrNa | ValueShape::YesNo => canonical_flag(raw),
        ValueShape::Choice(options) => options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(raw))
            .map(|option| (*option).to_string())
            .unwrap_or_else(|| raw.to_string()),
        _ => raw.to_string(),
    };
    FieldValue::Text(value)
}

fn canonical_flag(raw: &str) -> String {
    if raw.eq_ignore_ascii_case("yes") {
        "Yes".to_string()
    } else if raw.eq_ignore_ascii_case("no") {
        "No".to_string()
    } else if raw.eq_ignore_ascii_case("n/a") {
        "N/A".to_string()
    } else {
        raw.to_string()
    }
}
