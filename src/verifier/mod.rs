pub mod http;

use async_trait::async_trait;

use crate::models::PedigreeVerification;
use crate::reconcile::ReconcileError;

pub use http::HttpPedigreeVerifier;

/// External pedigree lookup service. Read-only and untrusted: callers
/// must treat every failure as recoverable and never persist anything
/// on the lookup path.
#[async_trait]
pub trait PedigreeVerifier: Send + Sync {
    /// Source name stamped onto records committed from this verifier's
    /// results, e.g. `kennel-registry`.
    fn name(&self) -> &str;

    /// Resolve an external registry id to ancestry and health attributes.
    async fn lookup(&self, external_id: &str) -> Result<PedigreeVerification, ReconcileError>;
}
