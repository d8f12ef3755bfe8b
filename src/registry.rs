use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

/// A scoring contribution slot. Each slot earns its weight at most once
/// per dog, no matter how many qualifying rows exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Contribution {
    Sire,
    Dam,
    HipEvaluation,
    Deworming,
    Vaccination,
}

impl Contribution {
    /// Fixed evaluation order, used for stable breakdown output.
    pub const ALL: [Contribution; 5] = [
        Contribution::Sire,
        Contribution::Dam,
        Contribution::HipEvaluation,
        Contribution::Deworming,
        Contribution::Vaccination,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Contribution::Sire => "Sire on record",
            Contribution::Dam => "Dam on record",
            Contribution::HipEvaluation => "Hip evaluation",
            Contribution::Deworming => "Deworming",
            Contribution::Vaccination => "Vaccinations",
        }
    }
}

/// One known health test type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestDefinition {
    pub label: String,
    /// Scoring slot this test type fills, if any. Display-only test
    /// types carry `None`.
    #[serde(default)]
    pub contribution: Option<Contribution>,
    /// Field name in the external verifier's response that documents
    /// this test type, if the verifier reports one.
    #[serde(default)]
    pub verifier_attribute: Option<String>,
}

/// Registry of known test types and contribution weights. The scoring
/// rule is data-driven: swap the registry and the score follows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestRegistry {
    tests: BTreeMap<String, TestDefinition>,
    weights: HashMap<Contribution, i32>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read registry file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid registry file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl TestRegistry {
    pub fn new(tests: BTreeMap<String, TestDefinition>, weights: HashMap<Contribution, i32>) -> Self {
        TestRegistry { tests, weights }
    }

    /// The built-in test set: the OFA panel plus the husbandry records
    /// that carry score weight.
    pub fn builtin() -> Self {
        let mut tests = BTreeMap::new();
        let mut def = |name: &str, contribution: Option<Contribution>, attr: Option<&str>| {
            tests.insert(
                name.to_string(),
                TestDefinition {
                    label: name.to_string(),
                    contribution,
                    verifier_attribute: attr.map(str::to_string),
                },
            );
        };
        def("OFA Hips", Some(Contribution::HipEvaluation), Some("hd_score"));
        def("PennHIP", Some(Contribution::HipEvaluation), None);
        def("OFA Elbows", None, Some("ed_score"));
        def("Cardiac", None, None);
        def("Eyes", None, None);
        def("DNA Panel", None, Some("dsra_result"));
        def("Patella", None, None);
        def("Deworming", Some(Contribution::Deworming), None);
        def("Vaccinations", Some(Contribution::Vaccination), None);

        let weights = HashMap::from([
            (Contribution::Sire, 20),
            (Contribution::Dam, 20),
            (Contribution::HipEvaluation, 25),
            (Contribution::Deworming, 20),
            (Contribution::Vaccination, 15),
        ]);

        TestRegistry { tests, weights }
    }

    pub fn from_json_str(path: &str, json: &str) -> Result<Self, RegistryError> {
        serde_json::from_str(json).map_err(|source| RegistryError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self, RegistryError> {
        let display = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: display.clone(),
            source,
        })?;
        Self::from_json_str(&display, &json)
    }

    pub fn get(&self, test_type: &str) -> Option<&TestDefinition> {
        self.tests.get(test_type)
    }

    pub fn contains(&self, test_type: &str) -> bool {
        self.tests.contains_key(test_type)
    }

    /// Known test types with their definitions, in stable order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestDefinition)> {
        self.tests.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn weight(&self, contribution: Contribution) -> i32 {
        self.weights.get(&contribution).copied().unwrap_or(0)
    }

    /// Resolve a verifier attribute name (e.g. `hd_score`) to the test
    /// type it documents.
    pub fn test_for_attribute(&self, attribute: &str) -> Option<&str> {
        self.tests
            .iter()
            .find(|(_, def)| def.verifier_attribute.as_deref() == Some(attribute))
            .map(|(name, _)| name.as_str())
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

static BUILTIN: Lazy<TestRegistry> = Lazy::new(TestRegistry::builtin);

/// Process-wide default registry, for callers that don't carry their own.
pub fn default_registry() -> &'static TestRegistry {
    &BUILTIN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_weights_sum_to_one_hundred() {
        let registry = TestRegistry::builtin();
        let total: i32 = Contribution::ALL.iter().map(|c| registry.weight(*c)).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn both_hip_test_types_share_the_hip_slot() {
        let registry = TestRegistry::builtin();
        assert_eq!(
            registry.get("OFA Hips").unwrap().contribution,
            Some(Contribution::HipEvaluation)
        );
        assert_eq!(
            registry.get("PennHIP").unwrap().contribution,
            Some(Contribution::HipEvaluation)
        );
    }

    #[test]
    fn verifier_attributes_resolve_to_test_types() {
        let registry = TestRegistry::builtin();
        assert_eq!(registry.test_for_attribute("hd_score"), Some("OFA Hips"));
        assert_eq!(registry.test_for_attribute("ed_score"), Some("OFA Elbows"));
        assert_eq!(registry.test_for_attribute("dsra_result"), Some("DNA Panel"));
        assert_eq!(registry.test_for_attribute("coat_color"), None);
    }

    #[test]
    fn unknown_test_type_is_not_registered() {
        let registry = TestRegistry::builtin();
        assert!(!registry.contains("Tail Length"));
        assert!(registry.contains("Deworming"));
    }

    #[test]
    fn custom_registry_parses_from_json() {
        let json = r#"{
            "tests": {
                "Hip Evaluation": {"label": "Hip Evaluation", "contribution": "hip_evaluation", "verifier_attribute": "hd_score"},
                "Deworming": {"label": "Deworming", "contribution": "deworming"}
            },
            "weights": {"sire": 20, "dam": 20, "hip_evaluation": 25, "deworming": 20, "vaccination": 15}
        }"#;

        let registry = TestRegistry::from_json_str("inline", json).unwrap();
        assert_eq!(registry.weight(Contribution::HipEvaluation), 25);
        assert_eq!(registry.test_for_attribute("hd_score"), Some("Hip Evaluation"));
        assert!(!registry.contains("OFA Hips"));
    }

    #[test]
    fn malformed_registry_json_is_rejected() {
        let err = TestRegistry::from_json_str("inline", "{\"tests\": []}").unwrap_err();
        assert!(matches!(err, RegistryError::Parse { .. }));
    }
}
