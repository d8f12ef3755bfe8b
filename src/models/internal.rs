use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The acting user, passed explicitly into every service call.
/// There is no ambient session state anywhere in this crate.
#[derive(Debug, Clone, Copy)]
pub struct Session {
    pub user_id: Uuid,
}

/// A document handed to the reconciler for upload to blob storage.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Normalized result of an external pedigree lookup. This is a preview:
/// nothing is persisted until the caller commits it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PedigreeVerification {
    pub external_id: String,
    pub pedigree_number: Option<String>,
    pub sire: Option<AncestorAttribution>,
    pub dam: Option<AncestorAttribution>,
    pub health_attributes: Vec<VerifiedAttribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AncestorAttribution {
    pub name: String,
    pub registration: Option<String>,
}

/// One named health attribute returned by the verifier, e.g.
/// `hd_score = "HD-A"`. Only attributes mapping to a registered test
/// type become health records on commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedAttribute {
    pub attribute: String,
    pub result: String,
}

impl PedigreeVerification {
    pub fn attribute(&self, name: &str) -> Option<&VerifiedAttribute> {
        self.health_attributes.iter().find(|a| a.attribute == name)
    }
}
