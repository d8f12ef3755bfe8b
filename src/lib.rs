pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod reconcile;
pub mod registry;
pub mod scoring;
pub mod storage;
pub mod verifier;

// Re-export commonly used types
pub use models::{
    Dog, DocumentUpload, HealthRecord, PedigreeEntry, PedigreePosition, PedigreeVerification,
    Session, TrustReport,
};

pub use db::{create_pool, health_check, DatabaseError};

pub use registry::{default_registry, Contribution, TestRegistry};

pub use scoring::{badge_for_score, build_health_panel, compute_trust_score, score_breakdown};

pub use reconcile::{
    commit_pedigree_verification, recompute_and_publish, record_health_upload, verify_pedigree,
    CommitOutcome, ReconcileError,
};
