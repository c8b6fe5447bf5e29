use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceType {
    #[default]
    Planned,
    Unplanned,
    Emergency,
}

impl ServiceType {
    pub const ALL: [ServiceType; 3] = [Self::Planned, Self::Unplanned, Self::Emergency];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Unplanned => "unplanned",
            Self::Emergency => "emergency",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "planned" => Ok(Self::Planned),
            "unplanned" => Ok(Self::Unplanned),
            "emergency" => Ok(Self::Emergency),
            other => Err(format!("unknown service type '{}'", other)),
        }
    }
}

/// The record shape shared by the entry form, drafts, committed logs and CSV rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLogFormValues {
    pub provider_id: String,
    pub service_order: String,
    pub car_id: String,
    pub odometer: f64,
    pub engine_hours: f64,
    pub start_date: String,
    pub end_date: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub service_description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub id: String,
    #[serde(flatten)]
    pub values: ServiceLogFormValues,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLog {
    pub id: String,
    #[serde(flatten)]
    pub values: ServiceLogFormValues,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ServiceTypeFilter {
    #[default]
    All,
    Planned,
    Unplanned,
    Emergency,
}

impl ServiceTypeFilter {
    pub fn matches(self, service_type: ServiceType) -> bool {
        match self {
            Self::All => true,
            Self::Planned => service_type == ServiceType::Planned,
            Self::Unplanned => service_type == ServiceType::Unplanned,
            Self::Emergency => service_type == ServiceType::Emergency,
        }
    }
}

impl From<ServiceType> for ServiceTypeFilter {
    fn from(value: ServiceType) -> Self {
        match value {
            ServiceType::Planned => Self::Planned,
            ServiceType::Unplanned => Self::Unplanned,
            ServiceType::Emergency => Self::Emergency,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLogFilters {
    pub search: String,
    #[serde(rename = "type")]
    pub service_type: ServiceTypeFilter,
    pub start_date_from: String,
    pub start_date_to: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub autosave_debounce_ms: u64,
    pub storage_key: String,
    pub import_error_preview_limit: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            autosave_debounce_ms: 350,
            storage_key: "medidrive-root".to_string(),
            import_error_preview_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DraftsSnapshot {
    pub items: BTreeMap<String, Draft>,
    pub active_draft_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceLogsSnapshot {
    pub items: Vec<ServiceLog>,
}

/// Serialized form of the central state as written to the blob store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    pub version: u32,
    pub drafts: DraftsSnapshot,
    pub service_logs: ServiceLogsSnapshot,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub imported: usize,
    pub errors: Vec<String>,
}

impl ImportOutcome {
    pub fn summary(&self, preview_limit: usize) -> String {
        if !self.errors.is_empty() {
            let preview = self
                .errors
                .iter()
                .take(preview_limit)
                .cloned()
                .collect::<Vec<_>>()
                .join(" | ");
            if self.imported > 0 {
                return format!("Imported {} log(s) from CSV. Skipped rows: {}", self.imported, preview);
            }
            return preview;
        }
        if self.imported == 0 {
            return "No valid rows found in CSV file.".to_string();
        }
        format!("Imported {} log(s) from CSV.", self.imported)
    }
}
