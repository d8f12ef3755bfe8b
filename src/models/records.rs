use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Source tag for records created from a breeder's own document upload.
/// External verifications carry the verifier's name instead.
pub const SOURCE_BREEDER_UPLOAD: &str = "breeder_upload";

/// A dog listed on the marketplace. `trust_score` is derived data: it is
/// written only by the score publisher, never authored by a user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Dog {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub registered_name: String,
    pub call_name: Option<String>,
    pub breed: String,
    pub sex: Option<String>,
    pub dob: Option<NaiveDate>,
    pub registration_number: Option<String>,
    pub trust_score: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One test type's documented result for a dog. At most one current row
/// exists per (dog_id, test_type); uploads update in place.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HealthRecord {
    pub id: Uuid,
    pub dog_id: Uuid,
    pub test_type: String,
    pub result: String,
    pub test_date: DateTime<Utc>,
    pub verified: bool,
    pub source: String,
    pub document_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ancestor attribution (sire or dam) for a dog. At most one row per
/// (dog_id, position).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PedigreeEntry {
    pub id: Uuid,
    pub dog_id: Uuid,
    pub position: String,
    pub ancestor_name: String,
    pub ancestor_registration: Option<String>,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Ancestor slot in a pedigree. Stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PedigreePosition {
    Sire,
    Dam,
}

impl PedigreePosition {
    pub fn as_str(&self) -> &'static str {
        match self {
            PedigreePosition::Sire => "sire",
            PedigreePosition::Dam => "dam",
        }
    }
}

impl std::fmt::Display for PedigreePosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl PedigreeEntry {
    /// Parsed position; rows with an unrecognized value are ignored by scoring.
    pub fn parsed_position(&self) -> Option<PedigreePosition> {
        match self.position.as_str() {
            "sire" => Some(PedigreePosition::Sire),
            "dam" => Some(PedigreePosition::Dam),
            _ => None,
        }
    }
}

/// A litter listing. The scorer only touches the derived
/// `papers_verified` / `health_checked` flags.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Litter {
    pub id: Uuid,
    pub breeder_id: Uuid,
    pub sire_id: Option<Uuid>,
    pub dam_id: Option<Uuid>,
    pub breed: String,
    pub status: String,
    pub papers_verified: bool,
    pub health_checked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
