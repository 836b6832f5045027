//! Data model for subsidy programs and generated narrative content.

use serde::{Deserialize, Serialize};

/// Structured attributes of a subsidy program.
///
/// Every field is optional: records come either from the caller's request
/// body or from heuristic extraction over free text, and both sources are
/// routinely partial. Wire names follow the subsidy-search API schema.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubsidyInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_area_search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subsidy_max_limit: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_start_datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_end_datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_number_of_employees: Option<String>,
}

impl SubsidyInfo {
    /// A record is meaningful only when it names the program or its ceiling.
    pub fn has_substance(&self) -> bool {
        self.title.is_some() || self.subsidy_max_limit.is_some()
    }
}

/// The six narrative sections of an application document, in render order.
pub const NARRATIVE_SECTION_KEYS: [&str; 6] = [
    "application_reason",
    "business_plan",
    "implementation_structure",
    "schedule",
    "budget_plan",
    "expected_effects",
];

/// AI-generated prose for the document's narrative sections.
///
/// Partial content is expected: the generator substitutes a per-section
/// unavailable notice for any field left `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiContent {
    pub application_reason: Option<String>,
    pub business_plan: Option<String>,
    pub implementation_structure: Option<String>,
    pub schedule: Option<String>,
    pub budget_plan: Option<String>,
    pub expected_effects: Option<String>,
}

impl AiContent {
    pub fn get(&self, key: &str) -> Option<&str> {
        match key {
            "application_reason" => self.application_reason.as_deref(),
            "business_plan" => self.business_plan.as_deref(),
            "implementation_structure" => self.implementation_structure.as_deref(),
            "schedule" => self.schedule.as_deref(),
            "budget_plan" => self.budget_plan.as_deref(),
            "expected_effects" => self.expected_effects.as_deref(),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) {
        match key {
            "application_reason" => self.application_reason = Some(value),
            "business_plan" => self.business_plan = Some(value),
            "implementation_structure" => self.implementation_structure = Some(value),
            "schedule" => self.schedule = Some(value),
            "budget_plan" => self.budget_plan = Some(value),
            "expected_effects" => self.expected_effects = Some(value),
            _ => {}
        }
    }
}
