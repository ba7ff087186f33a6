// Pipelines: storage-facing orchestration around the pure scoring core.

pub mod baseline;
pub mod weekly;
