use super::labeled::LabeledLineParser;

const PROGRAM_LEVEL: &str = "Program Level:";
const CHEMICAL_NAME: &str = "Chemical Name:";
const CAS_NUMBER: &str = "CAS Number:";
const FLAMMABLE_TOXIC: &str = "Flammable/Toxic:";
const NAICS_CODE: &str = "NAICS Code:";
const NAICS_DESCRIPTION: &str = "NAICS Description:";
const QUANTITY_RELEASED: &str = "Quantity Released (lbs):";
const PERCENT_WEIGHT: &str = "Percent Weight:";
const FLAMMABLE_MIXTURE: &str = "Flammable Mixture Chemical Components";
const NOT_APPLICABLE: &str = "N/A";

pub const PROCESS_CHEMICALS_HEADING: &str = "Process Chemicals";
pub const PROCESS_NAICS_HEADING: &str = "Process NAICS";
pub const ACCIDENT_CHEMICALS_HEADING: &str = "Chemicals in Accident History";

const PROCESS_CHEMICALS: LabeledLineParser =
    LabeledLineParser::new(&[PROGRAM_LEVEL, CHEMICAL_NAME, CAS_NUMBER, FLAMMABLE_TOXIC])
        .stop_at(&[PROCESS_NAICS_HEADING])
        .skip_lines(&[FLAMMABLE_MIXTURE])
        .close_after(&[(CHEMICAL_NAME, "]")]);

const PROCESS_NAICS: LabeledLineParser =
    LabeledLineParser::new(&[NAICS_CODE, NAICS_DESCRIPTION])
        .stop_at(&["Section 6. Accident History"]);

const ACCIDENT_CHEMICALS: LabeledLineParser = LabeledLineParser::new(&[
    QUANTITY_RELEASED,
    PERCENT_WEIGHT,
    CHEMICAL_NAME,
    CAS_NUMBER,
    FLAMMABLE_TOXIC,
    FLAMMABLE_MIXTURE,
])
.stop_at(&["Accident History ID:", "Section 7", "Section 9"]);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessChemical {
    pub program_level: Option<String>,
    pub chemical_name: String,
    pub cas_number: Option<String>,
    pub flammable_toxic: Option<String>,
}

impl ProcessChemical {
    /// CAS number, or the chemical name when the report omits it.
    pub fn natural_key(&self) -> Option<&str> {
        self.cas_number
            .as_deref()
            .filter(|cas| !cas.is_empty())
            .or_else(|| Some(self.chemical_name.as_str()).filter(|name| !name.is_empty()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessNaics {
    pub naics_code: String,
    pub naics_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccidentChemical {
    pub quantity_released_lbs: Option<String>,
    pub percent_weight: Option<String>,
    pub chemical: ProcessChemical,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Chemicals listed under "Process Chemicals". A program level applies to
/// every chemical after it until the next one.
pub fn parse_process_chemicals(text: &str) -> Vec<ProcessChemical> {
    let mut chemicals = Vec::new();
    let mut program_level = None;
    let mut current: Option<ProcessChemical> = None;

    for entry in PROCESS_CHEMICALS.entries(text) {
        match entry.label {
            PROGRAM_LEVEL => program_level = non_empty(&entry.value),
            CHEMICAL_NAME => {
                chemicals.extend(current.take());
                current = Some(ProcessChemical {
                    program_level: program_level.clone(),
                    chemical_name: entry.value,
                    ..ProcessChemical::default()
                });
            }
            CAS_NUMBER => {
                if let Some(chemical) = current.as_mut() {
                    chemical.cas_number = non_empty(&entry.value);
                }
            }
            FLAMMABLE_TOXIC => {
                if let Some(chemical) = current.as_mut() {
                    chemical.flammable_toxic = non_empty(&entry.value);
                }
            }
            _ => {}
        }
    }
    chemicals.extend(current);

    chemicals
        .into_iter()
        .filter(|chemical| chemical.natural_key().is_some())
        .collect()
}

pub fn parse_process_naics(text: &str) -> Vec<ProcessNaics> {
    let mut naics: Vec<ProcessNaics> = Vec::new();

    for entry in PROCESS_NAICS.entries(text) {
        match entry.label {
            NAICS_CODE => {
                if let Some(code) = non_empty(&entry.value) {
                    naics.push(ProcessNaics {
                        naics_code: code,
                        naics_description: None,
                    });
                }
            }
            NAICS_DESCRIPTION => {
                if let Some(last) = naics.last_mut() {
                    last.naics_description = non_empty(&entry.value);
                }
            }
            _ => {}
        }
    }

    naics
}

/// Chemicals of one accident block, read from its "Chemicals in Accident
/// History" heading onwards. Quantity and percent weight precede the
/// chemical they describe; components of a flammable mixture default both
/// to `N/A`.
pub fn parse_accident_chemicals(block: &str) -> Vec<AccidentChemical> {
    let Some(start) = block.find(ACCIDENT_CHEMICALS_HEADING) else {
        return Vec::new();
    };
    let text = &block[start + ACCIDENT_CHEMICALS_HEADING.len()..];

    let mut chemicals = Vec::new();
    let mut quantity: Option<String> = None;
    let mut percent: Option<String> = None;
    let mut in_mixture = false;
    let mut current: Option<AccidentChemical> = None;

    for entry in ACCIDENT_CHEMICALS.entries(text) {
        match entry.label {
            FLAMMABLE_MIXTURE => {
                chemicals.extend(current.take());
                in_mixture = true;
                quantity = None;
                percent = None;
            }
            QUANTITY_RELEASED => {
                chemicals.extend(current.take());
                quantity = Some(non_empty(&entry.value).unwrap_or_else(|| NOT_APPLICABLE.into()));
                percent = None;
            }
            PERCENT_WEIGHT => {
                percent = Some(non_empty(&entry.value).unwrap_or_else(|| NOT_APPLICABLE.into()));
            }
            CHEMICAL_NAME => {
                chemicals.extend(current.take());
                let default = || in_mixture.then(|| NOT_APPLICABLE.to_string());
                current = Some(AccidentChemical {
                    quantity_released_lbs: quantity.take().or_else(default),
                    percent_weight: percent.take().or_else(default),
                    chemical: ProcessChemical {
                        chemical_name: entry.value,
                        ..ProcessChemical::default()
                    },
                });
            }
            CAS_NUMBER => {
                if let Some(current) = current.as_mut() {
                    current.chemical.cas_number = non_empty(&entry.value);
                }
            }
            FLAMMABLE_TOXIC => {
                if let Some(current) = current.as_mut() {
                    current.chemical.flammable_toxic = non_empty(&entry.value);
                }
            }
            _ => {}
        }
    }
    chemicals.extend(current);

    chemicals
        .into_iter()
        .filter(|chemical| chemical.chemical.natural_key().is_some())
        .collect()
}
