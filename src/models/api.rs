use serde::Serialize;
use uuid::Uuid;

use crate::models::{Dog, HealthRecord, PedigreeEntry, PedigreePosition};
use crate::registry::TestRegistry;
use crate::scoring::{badge_for_score, build_health_panel, score_breakdown};
use crate::scoring::{Badge, HealthPanelEntry, ScoreBreakdown};

/// Buyer-facing trust report for one dog: the published score plus the
/// live breakdown and panel derived from current records.
#[derive(Debug, Serialize)]
pub struct TrustReport {
    pub dog_id: Uuid,
    pub registered_name: String,
    pub breed: String,
    pub registration_number: Option<String>,
    /// The published score on the dog record.
    pub trust_score: i32,
    pub badge: Option<Badge>,
    pub breakdown: ScoreBreakdown,
    pub health_panel: Vec<HealthPanelEntry>,
    pub pedigree: PedigreeSummary,
}

#[derive(Debug, Serialize)]
pub struct PedigreeSummary {
    pub sire: Option<AncestorSummary>,
    pub dam: Option<AncestorSummary>,
}

#[derive(Debug, Serialize)]
pub struct AncestorSummary {
    pub name: String,
    pub registration: Option<String>,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct ScoreResponse {
    pub dog_id: Uuid,
    pub trust_score: i32,
}

impl TrustReport {
    pub fn build(
        dog: Dog,
        health_records: &[HealthRecord],
        pedigree_entries: &[PedigreeEntry],
        registry: &TestRegistry,
    ) -> Self {
        let breakdown = score_breakdown(health_records, pedigree_entries, registry);
        let health_panel = build_health_panel(registry, health_records);

        let ancestor = |position: PedigreePosition| {
            pedigree_entries
                .iter()
                .find(|e| e.parsed_position() == Some(position))
                .map(|e| AncestorSummary {
                    name: e.ancestor_name.clone(),
                    registration: e.ancestor_registration.clone(),
                    source: e.source.clone(),
                })
        };

        TrustReport {
            dog_id: dog.id,
            registered_name: dog.registered_name,
            breed: dog.breed,
            registration_number: dog.registration_number,
            trust_score: dog.trust_score,
            badge: badge_for_score(dog.trust_score),
            breakdown,
            health_panel,
            pedigree: PedigreeSummary {
                sire: ancestor(PedigreePosition::Sire),
                dam: ancestor(PedigreePosition::Dam),
            },
        }
    }
}
