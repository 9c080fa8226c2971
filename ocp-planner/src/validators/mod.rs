//! Post-hoc checks over a finished week

pub mod quality_scorer;
pub mod spam_auditor;

pub use quality_scorer::{QualityScorer, ScoreWeights};
pub use spam_auditor::{AuditReport, SpamAuditor};
