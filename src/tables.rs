use crate::error::ValidationError;

/// Every table the export endpoint knows how to render as CSV.
pub const TABLES: [&str; 40] = [
    "diagnostic_report",
    "diagnostic_report_detail",
    "diagnostic_report_diagnostic_report_detail",
    "immunization_completion",
    "immunization_recommendation",
    "immunization_report",
    "immunization_report_immunization_completion",
    "immunization_report_immunization_recommendation",
    "combined_immunization",
    "patient_care",
    "patient_care_consultations",
    "patient_care_consumables",
    "patient_care_lab_tests",
    "patient_care_vaccinations",
    "patient_care_vitals",
    "medical_history",
    "combined_patient_care",
    "combined_diagnostic_report",
    "prescription",
    "prescription_condition",
    "prescription_medication",
    "prescription_prescription_condition",
    "prescription_prescription_medication",
    "combined_prescription",
    "consultation",
    "consumables",
    "vital_info",
    "vaccination",
    "vital_detail",
    "patient_profile",
    "patient_queue",
    "patient_visit",
    "op_consultation",
    "consent_request",
    "consolidated_report",
    "discover_and_link",
    "health_professional",
    "hip_data_push_notification",
    "hip_data_push_request",
    "combined_facility",
];

/// A validated table identifier from [`TABLES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableName(&'static str);

impl TableName {
    pub fn parse(name: &str) -> Result<Self, ValidationError> {
        TABLES
            .iter()
            .find(|t| **t == name.trim())
            .map(|t| TableName(*t))
            .ok_or_else(|| ValidationError::UnknownTable(name.to_string()))
    }

    pub fn all() -> impl Iterator<Item = TableName> {
        TABLES.iter().map(|t| TableName(*t))
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }

    /// Facility tables are resolved server side from the branch's facility.
    pub fn is_facility_scoped(&self) -> bool {
        self.0.starts_with("combined_facility")
    }

    pub fn report_filename(&self) -> String {
        format!("{}_report.csv", self.0)
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl std::str::FromStr for TableName {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Tables for a batch export; nothing requested means the whole catalogue.
pub fn batch_tables(requested: Vec<String>) -> Vec<String> {
    if requested.is_empty() {
        TABLES.iter().map(|t| t.to_string()).collect()
    } else {
        requested
    }
}
