// Document scoring: classification plus tiered keyword severity.

pub mod classifier;
pub mod severity;
