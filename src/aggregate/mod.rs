// Aggregation: weekly rollups and historical baselines.

pub mod baseline;
pub mod stats;
pub mod weekly;
