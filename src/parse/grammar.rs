use crate::cli::GrammarVersion;

const RESPONDERS_V1: &[&str] = &["Yes", "No, not notified"];
const RESPONDERS_V2: &[&str] = &["Yes", "No, not notified", "Notified Only"];

/// Subsection headings inside an accident block. Scoped fields only look
/// between their heading and the next one.
pub const SUBSECTION_HEADINGS: [&str; 10] = [
    "Release Event",
    "Release Source",
    "Weather Conditions",
    "On-Site Impacts",
    "Off-Site Impacts",
    "Environmental Damage",
    "Initiating Event",
    "Contributing Factors",
    "Changes Introduced",
    "Chemicals in Accident History",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueShape {
    /// `Month YYYY`
    ShortDate,
    /// `HH:MM`
    Time,
    Integer,
    IntegerOrNa,
    /// Whole dollars, `$` and thousands separators tolerated.
    Money,
    Decimal,
    Letter,
    DurationHours,
    DurationMinutes,
    YesNo,
    Choice(&'static [&'static str]),
    /// Rest of the line, or the next line when the label stands alone.
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Block,
    OnSite,
    OffSite,
}

impl Scope {
    pub fn heading(self) -> Option<&'static str> {
        match self {
            Self::Block => None,
            Self::OnSite => Some("On-Site Impacts"),
            Self::OffSite => Some("Off-Site Impacts"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    Text,
    Integer,
}

impl SqlType {
    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Text => "TEXT",
            Self::Integer => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Header in the detailed CSV.
    pub column: &'static str,
    /// Column in `rmp_accident_history_detail`.
    pub sql_column: &'static str,
    /// Label as printed in the report, colon included.
    pub label: &'static str,
    pub shape: ValueShape,
    pub scope: Scope,
    pub sql_type: SqlType,
}

const fn field(
    column: &'static str,
    sql_column: &'static str,
    label: &'static str,
    shape: ValueShape,
) -> FieldSpec {
    FieldSpec {
        column,
        sql_column,
        label,
        shape,
        scope: Scope::Block,
        sql_type: SqlType::Text,
    }
}

const fn flag(column: &'static str, sql_column: &'static str, label: &'static str) -> FieldSpec {
    field(column, sql_column, label, ValueShape::YesNo)
}

const fn scoped(spec: FieldSpec, scope: Scope) -> FieldSpec {
    FieldSpec { scope, ..spec }
}

const fn integer_column(spec: FieldSpec) -> FieldSpec {
    FieldSpec {
        sql_type: SqlType::Integer,
        ..spec
    }
}

/// The labelled fields of one accident block, in output column order.
#[derive(Debug, Clone)]
pub struct Grammar {
    version: GrammarVersion,
    fields: Vec<FieldSpec>,
}

impl Grammar {
    pub fn new(version: GrammarVersion) -> Self {
        let (casualty, responders) = match version {
            GrammarVersion::V1 => (ValueShape::Integer, RESPONDERS_V1),
            GrammarVersion::V2 => (ValueShape::IntegerOrNa, RESPONDERS_V2),
        };
        use Scope::{OffSite, OnSite};
        use ValueShape::*;

        let fields = vec![
            field("Date of Accident", "Date_of_Accident", "Date of Accident:", ShortDate),
            field(
                "Time Accident Began",
                "Time_Accident_Began",
                "Time Accident Began (HH:MM):",
                Time,
            ),
            field(
                "NAICS Code of Process Involved",
                "NAICS_Code_of_Process_Involved",
                "NAICS Code of Process Involved:",
                Integer,
            ),
            field("NAICS Description", "NAICS_Description", "NAICS Description:", Text),
            field(
                "Release Duration (Hours)",
                "Release_Duration_Hours",
                "Release Duration:",
                DurationHours,
            ),
            field(
                "Release Duration (Minutes)",
                "Release_Duration_Minutes",
                "Release Duration:",
                DurationMinutes,
            ),
            flag("Gas Release", "Gas_Release", "Gas Release:"),
            flag(
                "Liquid Spill/Evaporation",
                "Liquid_Spill_Evaporation",
                "Liquid Spill/Evaporation:",
            ),
            flag("Fire", "Fire", "Fire:"),
            flag("Explosion", "Explosion", "Explosion:"),
            flag(
                "Uncontrolled/Runaway Reaction",
                "Uncontrolled_Runaway_Reaction",
                "Uncontrolled/Runaway Reaction:",
            ),
            flag("Storage Vessel", "Storage_Vessel", "Storage Vessel:"),
            flag("Piping", "Piping", "Piping:"),
            flag("Process Vessel", "Process_Vessel", "Process Vessel:"),
            flag("Transfer Hose", "Transfer_Hose", "Transfer Hose:"),
            flag("Valve", "Valve", "Valve:"),
            flag("Pump", "Pump", "Pump:"),
            flag("Joint", "Joint", "Joint:"),
            field(
                "Other Release Source",
                "Other_Release_Source",
                "Other Release Source:",
                Text,
            ),
            field("Wind Speed", "Wind_Speed", "Wind Speed:", Decimal),
            field("Wind Speed Units", "Wind_Speed_Units", "Units:", Text),
            field("Wind Direction", "Wind_Direction", "Direction:", Text),
            field("Temperature", "Temperature", "Temperature:", Integer),
            field(
                "Atmospheric Stability Class",
                "Atmospheric_Stability_Class",
                "Atmospheric Stability Class:",
                Letter,
            ),
            flag(
                "Precipitation Present",
                "Precipitation_Present",
                "Precipitation Present:",
            ),
            flag(
                "Unknown Weather Conditions",
                "Unknown_Weather_Conditions",
                "Unknown Weather Conditions:",
            ),
            scoped(
                field(
                    "Employee/Contractor Deaths",
                    "Employee_Contractor_Deaths",
                    "Employee or Contractor Deaths:",
                    casualty,
                ),
                OnSite,
            ),
            scoped(
                field(
                    "Public Responder Deaths",
                    "Public_Responder_Deaths",
                    "Public Responder Deaths:",
                    casualty,
                ),
                OnSite,
            ),
            scoped(
                field("Public Deaths", "Public_Deaths", "Public Deaths:", casualty),
                OnSite,
            ),
            scoped(
                field(
                    "Employee/Contractor Injuries",
                    "Employee_Contractor_Injuries",
                    "Employee or Contractor Injuries:",
                    casualty,
                ),
                OnSite,
            ),
            scoped(
                field(
                    "Public Responder Injuries",
                    "Public_Responder_Injuries",
                    "Public Responder Injuries:",
                    casualty,
                ),
                OnSite,
            ),
            scoped(
                field(
                    "Public Injuries",
                    "Public_Injuries",
                    "Public Injuries:",
                    casualty,
                ),
                OnSite,
            ),
            scoped(
                integer_column(field(
                    "On-Site Property Damage ($)",
                    "On_Site_Property_Damage_Dollar",
                    "On-Site Property Damage ($):",
                    Money,
                )),
                OnSite,
            ),
            scoped(
                field("Off-Site Deaths", "Off_Site_Deaths", "Deaths:", casualty),
                OffSite,
            ),
            scoped(
                field(
                    "Off-Site Hospitalizations",
                    "Off_Site_Hospitalizations",
                    "Hospitalizations:",
                    casualty,
                ),
                OffSite,
            ),
            scoped(
                field(
                    "Off-Site Public Deaths",
                    "Off_Site_Public_Deaths",
                    "Public Deaths:",
                    casualty,
                ),
                OffSite,
            ),
            scoped(
                field(
                    "Off-Site Other Medical Treatments",
                    "Off_Site_Other_Medical_Treatments",
                    "Other Medical Treatments:",
                    casualty,
                ),
                OffSite,
            ),
            scoped(
                field("Evacuated", "Evacuated", "Evacuated:", casualty),
                OffSite,
            ),
            scoped(
                field(
                    "Sheltered-in-Place",
                    "Sheltered_in_Place",
                    "Sheltered-in-Place:",
                    casualty,
                ),
                OffSite,
            ),
            scoped(
                integer_column(field(
                    "Off-Site Property Damage ($)",
                    "Off_Site_Property_Damage_Dollar",
                    "Off-Site Property Damage ($):",
                    Money,
                )),
                OffSite,
            ),
            flag(
                "Fish or Animal Kills",
                "Fish_or_Animal_Kills",
                "Fish or Animal Kills:",
            ),
            flag(
                "Tree, Lawn, Shrub, or Crop Damage",
                "Tree_Lawn_Shrub_or_Crop_Damage",
                "Tree, Lawn, Shrub, or Crop Damage:",
            ),
            flag(
                "Water Contamination",
                "Water_Contamination",
                "Water Contamination:",
            ),
            flag("Soil Contamination", "Soil_Contamination", "Soil Contamination:"),
            field(
                "Other Environmental Damage",
                "Other_Environmental_Damage",
                "Other Environmental Damage:",
                Text,
            ),
            field("Initiating Event", "Initiating_Event", "Initiating Event:", Text),
            flag(
                "Contributing - Equipment Failure",
                "Contributing_Equipment_Failure",
                "Equipment Failure:",
            ),
            flag(
                "Contributing - Human Error",
                "Contributing_Human_Error",
                "Human Error:",
            ),
            flag(
                "Contributing - Improper Procedures",
                "Contributing_Improper_Procedures",
                "Improper Procedures:",
            ),
            flag(
                "Contributing - Overpressurization",
                "Contributing_Overpressurization",
                "Overpressurization:",
            ),
            flag(
                "Contributing - Upset Condition",
                "Contributing_Upset_Condition",
                "Upset Condition:",
            ),
            flag(
                "Contributing - By-Pass Condition",
                "Contributing_By_Pass_Condition",
                "By-Pass Condition:",
            ),
            flag(
                "Contributing - Maintenance Activity/Inactivity",
                "Contributing_Maintenance_Activity_Inactivity",
                "Maintenance Activity/Inactivity:",
            ),
            flag(
                "Contributing - Process Design Failure",
                "Contributing_Process_Design_Failure",
                "Process Design Failure:",
            ),
            flag(
                "Contributing - Unsuitable Equipment",
                "Contributing_Unsuitable_Equipment",
                "Unsuitable Equipment:",
            ),
            flag(
                "Contributing - Unusual Weather Condition",
                "Contributing_Unusual_Weather_Condition",
                "Unusual Weather Condition:",
            ),
            flag(
                "Contributing - Management Error",
                "Contributing_Management_Error",
                "Management Error:",
            ),
            field(
                "Contributing - Other",
                "Contributing_Other",
                "Other Contributing Factor:",
                Text,
            ),
            field(
                "Off-Site Responders Notified",
                "Off_Site_Responders_Notified",
                "Off-Site Responders Notified:",
                Choice(responders),
            ),
            flag(
                "Change - Improved/Upgraded Equipment",
                "Change_Improved_Upgraded_Equipment",
                "Improved or Upgraded Equipment:",
            ),
            flag(
                "Change - Revised Maintenance",
                "Change_Revised_Maintenance",
                "Revised Maintenance:",
            ),
            flag(
                "Change - Revised Training",
                "Change_Revised_Training",
                "Revised Training:",
            ),
            flag(
                "Change - Revised Operating Procedures",
                "Change_Revised_Operating_Procedures",
                "Revised Operating Procedures:",
            ),
            flag(
                "Change - New Process Controls",
                "Change_New_Process_Controls",
                "New Process Controls:",
            ),
            flag(
                "Change - New Mitigation Systems",
                "Change_New_Mitigation_Systems",
                "New Mitigation Systems:",
            ),
            flag(
                "Change - Revised Emergency Response Plan",
                "Change_Revised_Emergency_Response_Plan",
                "Revised Emergency Response Plan:",
            ),
            flag(
                "Change - Changed Process",
                "Change_Changed_Process",
                "Changed Process:",
            ),
            flag(
                "Change - Reduced Inventory",
                "Change_Reduced_Inventory",
                "Reduced Inventory:",
            ),
            flag("Change - None", "Change_None", "None:"),
            field(
                "Change - Other",
                "Change_Other",
                "Other Changes Introduced:",
                Text,
            ),
        ];

        Self { version, fields }
    }

    pub fn version(&self) -> GrammarVersion {
        self.version
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn field(&self, column: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|spec| spec.column == column)
    }
}
