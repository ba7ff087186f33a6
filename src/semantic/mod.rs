// Semantic drift: embedding centroids compared against a baseline.

pub mod drift;
pub mod embeddings;
pub mod traits;
pub mod vectors;
