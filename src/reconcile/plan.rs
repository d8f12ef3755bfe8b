use std::collections::HashSet;

use crate::models::{PedigreePosition, PedigreeVerification};
use crate::registry::TestRegistry;

/// Everything a pedigree-verification commit will write, resolved ahead
/// of time. Building the plan is pure; applying it is one transaction.
#[derive(Debug, Clone)]
pub struct CommitPlan {
    pub pedigree_entries: Vec<PlannedPedigreeEntry>,
    pub health_records: Vec<PlannedHealthRecord>,
    /// Verifier attributes that matched no registered test type.
    pub skipped_attributes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct PlannedPedigreeEntry {
    pub position: PedigreePosition,
    pub ancestor_name: String,
    pub ancestor_registration: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PlannedHealthRecord {
    pub test_type: String,
    pub result: String,
}

impl CommitPlan {
    pub fn is_empty(&self) -> bool {
        self.pedigree_entries.is_empty() && self.health_records.is_empty()
    }
}

/// Resolve a verification preview against the registry: at most one sire
/// and one dam entry, plus one verified health record per attribute that
/// documents a known test type.
pub fn build_commit_plan(registry: &TestRegistry, verification: &PedigreeVerification) -> CommitPlan {
    let mut pedigree_entries = Vec::with_capacity(2);
    if let Some(sire) = &verification.sire {
        pedigree_entries.push(PlannedPedigreeEntry {
            position: PedigreePosition::Sire,
            ancestor_name: sire.name.clone(),
            ancestor_registration: sire.registration.clone(),
        });
    }
    if let Some(dam) = &verification.dam {
        pedigree_entries.push(PlannedPedigreeEntry {
            position: PedigreePosition::Dam,
            ancestor_name: dam.name.clone(),
            ancestor_registration: dam.registration.clone(),
        });
    }

    let mut health_records = Vec::new();
    let mut skipped_attributes = Vec::new();
    let mut planned_types: HashSet<String> = HashSet::new();
    for attribute in &verification.health_attributes {
        match registry.test_for_attribute(&attribute.attribute) {
            // One record per test type; a second attribute for the same
            // type is dropped rather than overwriting the first.
            Some(test_type) if planned_types.insert(test_type.to_string()) => {
                health_records.push(PlannedHealthRecord {
                    test_type: test_type.to_string(),
                    result: attribute.result.clone(),
                });
            }
            _ => skipped_attributes.push(attribute.attribute.clone()),
        }
    }

    CommitPlan {
        pedigree_entries,
        health_records,
        skipped_attributes,
    }
}
