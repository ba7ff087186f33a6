// Category assessment: qualitative status plus an auditable confidence score.

pub mod assessor;
pub mod confidence;

pub use assessor::{assess_category, AssessmentDetail, AssessmentResult, Status};
pub use confidence::{compute_confidence, ConfidenceConfig, ConfidenceFactors, ConfidenceScore};
