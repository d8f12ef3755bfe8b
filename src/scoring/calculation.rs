use serde::Serialize;
use std::collections::HashMap;

use crate::models::{HealthRecord, PedigreeEntry, PedigreePosition};
use crate::registry::{Contribution, TestRegistry};

/// Full scoring output: the clamped total plus one line per contribution
/// slot, earned or not.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub total: i32,
    pub contributions: Vec<EarnedContribution>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EarnedContribution {
    pub contribution: Contribution,
    pub label: String,
    pub points: i32,
    pub earned: bool,
    /// What earned the slot: the ancestor name for sire/dam, the test
    /// type for health contributions.
    pub via: Option<String>,
}

/// Map a dog's record sets to its trust score.
///
/// Pure and deterministic: no clock and no I/O. Calling it twice with
/// the same inputs yields the same integer, always in [0, 100].
///
/// Presence of a record counts regardless of its `verified` flag; the
/// flag only drives the display status (see `report`). Each contribution
/// slot earns its weight at most once: duplicate rows for a test type,
/// two test types in the same slot, or duplicate sire/dam entries never
/// double-count.
pub fn compute_trust_score(
    health_records: &[HealthRecord],
    pedigree_entries: &[PedigreeEntry],
    registry: &TestRegistry,
) -> i32 {
    score_breakdown(health_records, pedigree_entries, registry).total
}

/// Compute the per-contribution breakdown behind the trust score.
pub fn score_breakdown(
    health_records: &[HealthRecord],
    pedigree_entries: &[PedigreeEntry],
    registry: &TestRegistry,
) -> ScoreBreakdown {
    let latest = latest_per_test_type(health_records);

    let mut total: i64 = 0;
    let mut contributions = Vec::with_capacity(Contribution::ALL.len());

    for contribution in Contribution::ALL {
        let points = registry.weight(contribution);
        let via = match contribution {
            Contribution::Sire => ancestor_name(pedigree_entries, PedigreePosition::Sire),
            Contribution::Dam => ancestor_name(pedigree_entries, PedigreePosition::Dam),
            _ => qualifying_test_type(&latest, registry, contribution),
        };
        let earned = via.is_some();
        if earned {
            total += i64::from(points);
        }
        contributions.push(EarnedContribution {
            contribution,
            label: contribution.label().to_string(),
            points,
            earned,
            via,
        });
    }

    ScoreBreakdown {
        total: total.clamp(0, 100) as i32,
        contributions,
    }
}

/// Keep only the most recent record per test type: newest `test_date`
/// wins, ties broken by most recent `updated_at`. Duplicate rows per
/// test type are a store defect, but the calculator stays correct in
/// their presence.
pub(crate) fn latest_per_test_type(records: &[HealthRecord]) -> HashMap<&str, &HealthRecord> {
    let mut latest: HashMap<&str, &HealthRecord> = HashMap::new();
    for record in records {
        match latest.get(record.test_type.as_str()) {
            Some(current)
                if (current.test_date, current.updated_at)
                    >= (record.test_date, record.updated_at) => {}
            _ => {
                latest.insert(record.test_type.as_str(), record);
            }
        }
    }
    latest
}

fn ancestor_name(entries: &[PedigreeEntry], position: PedigreePosition) -> Option<String> {
    // Dedupe by position: only one entry per slot can count.
    entries
        .iter()
        .find(|e| e.parsed_position() == Some(position))
        .map(|e| e.ancestor_name.clone())
}

fn qualifying_test_type(
    latest: &HashMap<&str, &HealthRecord>,
    registry: &TestRegistry,
    contribution: Contribution,
) -> Option<String> {
    // Registry iteration order is stable, so the reported test type is too.
    registry
        .iter()
        .find(|(name, def)| def.contribution == Some(contribution) && latest.contains_key(name))
        .map(|(name, _)| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SOURCE_BREEDER_UPLOAD;
    use chrono::{Duration, Utc};
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn record(test_type: &str, days_ago: i64) -> HealthRecord {
        let when = Utc::now() - Duration::days(days_ago);
        HealthRecord {
            id: Uuid::new_v4(),
            dog_id: Uuid::new_v4(),
            test_type: test_type.to_string(),
            result: "Documented".to_string(),
            test_date: when,
            verified: false,
            source: SOURCE_BREEDER_UPLOAD.to_string(),
            document_url: None,
            created_at: when,
            updated_at: when,
        }
    }

    fn entry(position: &str, name: &str) -> PedigreeEntry {
        let when = Utc::now();
        PedigreeEntry {
            id: Uuid::new_v4(),
            dog_id: Uuid::new_v4(),
            position: position.to_string(),
            ancestor_name: name.to_string(),
            ancestor_registration: None,
            source: "kennel-registry".to_string(),
            created_at: when,
            updated_at: when,
        }
    }

    #[test]
    fn empty_record_set_scores_zero() {
        let registry = TestRegistry::builtin();
        assert_eq!(compute_trust_score(&[], &[], &registry), 0);
    }

    #[test]
    fn score_ladder_reaches_one_hundred() {
        let registry = TestRegistry::builtin();
        let mut records = Vec::new();
        let mut entries = Vec::new();

        records.push(record("OFA Hips", 30));
        assert_eq!(compute_trust_score(&records, &entries, &registry), 25);

        entries.push(entry("sire", "Ch. Atlas vom Hause"));
        assert_eq!(compute_trust_score(&records, &entries, &registry), 45);

        entries.push(entry("dam", "Luna di Campo"));
        assert_eq!(compute_trust_score(&records, &entries, &registry), 65);

        records.push(record("Deworming", 14));
        assert_eq!(compute_trust_score(&records, &entries, &registry), 85);

        records.push(record("Vaccinations", 7));
        assert_eq!(compute_trust_score(&records, &entries, &registry), 100);

        // A second hip-class record stays capped: the slot is already earned.
        records.push(record("PennHIP", 2));
        assert_eq!(compute_trust_score(&records, &entries, &registry), 100);
    }

    #[test]
    fn same_inputs_always_give_same_score() {
        let registry = TestRegistry::builtin();
        let records = vec![record("OFA Hips", 10), record("Deworming", 5)];
        let entries = vec![entry("sire", "Rex")];

        let first = compute_trust_score(&records, &entries, &registry);
        let second = compute_trust_score(&records, &entries, &registry);
        assert_eq!(first, second);
        assert_eq!(first, 65);
    }

    #[test]
    fn unverified_records_still_count() {
        let registry = TestRegistry::builtin();
        let mut uploaded = record("OFA Hips", 10);
        uploaded.verified = false;
        assert_eq!(compute_trust_score(&[uploaded], &[], &registry), 25);
    }

    #[test]
    fn display_only_and_unknown_test_types_earn_nothing() {
        let registry = TestRegistry::builtin();
        let records = vec![record("Cardiac", 10), record("Tail Length", 3)];
        assert_eq!(compute_trust_score(&records, &[], &registry), 0);
    }

    #[test]
    fn duplicate_sire_entries_count_once() {
        let registry = TestRegistry::builtin();
        let entries = vec![entry("sire", "Rex"), entry("sire", "Rex Again")];
        let breakdown = score_breakdown(&[], &entries, &registry);
        assert_eq!(breakdown.total, 20);

        let sire = breakdown
            .contributions
            .iter()
            .find(|c| c.contribution == Contribution::Sire)
            .unwrap();
        assert_eq!(sire.via.as_deref(), Some("Rex"));
    }

    #[test]
    fn adding_qualifying_records_never_lowers_the_score() {
        let registry = TestRegistry::builtin();
        let mut records = Vec::new();
        let mut entries = Vec::new();
        let mut last = compute_trust_score(&records, &entries, &registry);

        let additions: Vec<Box<dyn Fn(&mut Vec<HealthRecord>, &mut Vec<PedigreeEntry>)>> = vec![
            Box::new(|r, _| r.push(record("Deworming", 3))),
            Box::new(|_, e| e.push(entry("dam", "Luna"))),
            Box::new(|r, _| r.push(record("PennHIP", 9))),
            Box::new(|_, e| e.push(entry("sire", "Rex"))),
            Box::new(|r, _| r.push(record("Vaccinations", 1))),
            Box::new(|r, _| r.push(record("OFA Hips", 40))),
        ];

        for add in additions {
            add(&mut records, &mut entries);
            let score = compute_trust_score(&records, &entries, &registry);
            assert!(score >= last, "score dropped from {} to {}", last, score);
            last = score;
        }
        assert_eq!(last, 100);
    }

    #[test]
    fn latest_record_wins_per_test_type() {
        let newer = record("OFA Hips", 5);
        let older = record("OFA Hips", 50);
        let binding = [older.clone(), newer.clone()];
        let latest = latest_per_test_type(&binding);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest["OFA Hips"].id, newer.id);

        // Same test_date: most recently updated row wins.
        let mut refreshed = older.clone();
        refreshed.id = Uuid::new_v4();
        refreshed.updated_at = older.updated_at + Duration::hours(1);
        let binding = [older.clone(), refreshed.clone()];
        let latest = latest_per_test_type(&binding);
        assert_eq!(latest["OFA Hips"].id, refreshed.id);
    }

    #[test]
    fn total_is_clamped_to_bounds() {
        // Deliberately overweight registry: the clamp holds the line.
        let mut tests = BTreeMap::new();
        tests.insert(
            "Hip Evaluation".to_string(),
            crate::registry::TestDefinition {
                label: "Hip Evaluation".to_string(),
                contribution: Some(Contribution::HipEvaluation),
                verifier_attribute: None,
            },
        );
        let heavy = TestRegistry::new(
            tests.clone(),
            std::collections::HashMap::from([
                (Contribution::Sire, 90),
                (Contribution::HipEvaluation, 90),
            ]),
        );
        let records = vec![record("Hip Evaluation", 1)];
        let entries = vec![entry("sire", "Rex")];
        assert_eq!(compute_trust_score(&records, &entries, &heavy), 100);

        let negative = TestRegistry::new(
            tests,
            std::collections::HashMap::from([(Contribution::HipEvaluation, -40)]),
        );
        assert_eq!(compute_trust_score(&records, &[], &negative), 0);
    }
}
