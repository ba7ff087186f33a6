// Driftwatch: institutional drift scoring for government actions
//
// This is the library root. The scoring core (rules, content, keywords,
// scoring, aggregate, assessment, semantic) is pure; db and pipeline wrap it
// with optional storage.

pub mod aggregate;
pub mod assessment;
pub mod config;
pub mod content;
pub mod db;
pub mod keywords;
pub mod output;
pub mod pipeline;
pub mod rules;
pub mod scoring;
pub mod semantic;
pub mod status;
