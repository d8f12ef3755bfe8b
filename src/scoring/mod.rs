pub mod calculation;
pub mod report;

pub use calculation::{compute_trust_score, score_breakdown, EarnedContribution, ScoreBreakdown};
pub use report::{badge_for_score, build_health_panel, Badge, HealthPanelEntry, RecordStatus};
