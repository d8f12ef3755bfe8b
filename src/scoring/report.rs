use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::HealthRecord;
use crate::registry::TestRegistry;
use crate::scoring::calculation::latest_per_test_type;

/// Buyer-facing tier derived from the trust score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Gold,
    Silver,
}

/// Gold at 80+, silver at 60+, nothing below. Display only; the badge
/// never feeds back into scoring.
pub fn badge_for_score(score: i32) -> Option<Badge> {
    if score >= 80 {
        Some(Badge::Gold)
    } else if score >= 60 {
        Some(Badge::Silver)
    } else {
        None
    }
}

/// Where a test type sits in its lifecycle: no record yet, documented by
/// the breeder, or confirmed by an external verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Missing,
    Uploaded,
    Verified,
}

/// One row of the health panel shown on a dog's profile.
#[derive(Debug, Clone, Serialize)]
pub struct HealthPanelEntry {
    pub test_type: String,
    pub label: String,
    pub status: RecordStatus,
    pub result: Option<String>,
    pub test_date: Option<DateTime<Utc>>,
    pub document_url: Option<String>,
}

/// Build the per-test panel: one entry per registered test type, backed
/// by the most recent record where one exists.
pub fn build_health_panel(registry: &TestRegistry, records: &[HealthRecord]) -> Vec<HealthPanelEntry> {
    let latest = latest_per_test_type(records);

    registry
        .iter()
        .map(|(test_type, def)| match latest.get(test_type) {
            Some(record) => HealthPanelEntry {
                test_type: test_type.to_string(),
                label: def.label.clone(),
                status: if record.verified {
                    RecordStatus::Verified
                } else {
                    RecordStatus::Uploaded
                },
                result: Some(record.result.clone()),
                test_date: Some(record.test_date),
                document_url: record.document_url.clone(),
            },
            None => HealthPanelEntry {
                test_type: test_type.to_string(),
                label: def.label.clone(),
                status: RecordStatus::Missing,
                result: None,
                test_date: None,
                document_url: None,
            },
        })
        .collect()
}
