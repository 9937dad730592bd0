//! Defect records as delivered by the remote analysis service.
//!
//! Field names follow the service's camelCase JSON so that snapshots can be
//! deserialized directly. Records are read-only once fetched.

use serde::{Deserialize, Serialize};

/// Name of the status attribute carrying the triage state.
pub const DEFECT_STATUS: &str = "DefectStatus";

/// Triage states that take a defect out of reconciliation entirely.
pub const RESOLVED_STATUSES: [&str; 3] = ["Dismissed", "Fixed", "Absent Dismissed"];

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// A deduplicated defect spanning one or more stream occurrences.
pub struct MergedDefect {
    pub cid: i64,
    #[serde(default)]
    pub display_type: String,
    #[serde(default)]
    pub merge_key: String,
    #[serde(default)]
    pub file_pathname: String,
    #[serde(default)]
    pub defect_state_attribute_values: Vec<StatusAttribute>,
}

impl MergedDefect {
    /// Value of the `DefectStatus` attribute. Duplicates are not collapsed:
    /// the last matching entry wins.
    pub fn status(&self) -> &str {
        let mut status = "";
        for attr in &self.defect_state_attribute_values {
            if attr.name == DEFECT_STATUS {
                status = attr.value.as_str();
            }
        }
        status
    }

    pub fn is_resolved(&self) -> bool {
        RESOLVED_STATUSES.contains(&self.status())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// One name/value triage attribute.
pub struct StatusAttribute {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// Per-stream occurrence of a merged defect.
pub struct StreamDefect {
    #[serde(default)]
    pub defect_instances: Vec<DefectInstance>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// A concrete manifestation of a defect.
pub struct DefectInstance {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub checker_name: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    /// Display name of the impact (`High`, `Medium`, `Low`).
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub long_description: String,
    #[serde(default)]
    pub events: Option<Vec<Event>>,
}

impl DefectInstance {
    /// Subcategory with empty or missing values mapped to `"none"`.
    pub fn subcategory_or_none(&self) -> &str {
        match self.subcategory.as_deref() {
            Some(s) if !s.is_empty() => s,
            _ => "none",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
/// A diagnostic event attached to an instance.
pub struct Event {
    #[serde(default)]
    pub main: bool,
    #[serde(default)]
    pub file_pathname: Option<String>,
    pub line_number: u32,
    #[serde(default)]
    pub event_tag: String,
    #[serde(default)]
    pub event_description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
/// Severity bucket used for counting.
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    /// Bucket an impact display name. Empty means "no impact" and is not
    /// counted; anything other than exactly `High` or `Medium` is `Low`.
    pub fn classify(display: &str) -> Option<Impact> {
        match display {
            "" => None,
            "High" => Some(Impact::High),
            "Medium" => Some(Impact::Medium),
            _ => Some(Impact::Low),
        }
    }
}
