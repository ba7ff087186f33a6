// System status display: DB stats, last runs, stored baselines.

use anyhow::Result;
use std::sync::Arc;

use crate::db::Database;
use crate::pipeline::baseline::LAST_BASELINE_KEY;
use crate::pipeline::weekly::LAST_RUN_KEY;

/// Display system status to the terminal.
pub async fn show(db: &Arc<dyn Database>, db_display_path: &str) -> Result<()> {
    // Database file size
    let file_size = std::fs::metadata(db_display_path)
        .map(|m| format_bytes(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());
    println!("Database: {} ({})", db_display_path, file_size);

    let scored = db.get_document_score_count().await?;
    println!("Scored documents: {}", scored);

    match db.get_run_state(LAST_RUN_KEY).await? {
        Some(at) => println!("Last weekly run: {}", at),
        None => {
            println!("Last weekly run: never");
            println!("  Run `driftwatch ingest <file>` to score a batch");
        }
    }

    match db.get_run_state(LAST_BASELINE_KEY).await? {
        Some(id) => {
            let baselines = db.get_baselines(&id).await?;
            let with_floor = baselines
                .iter()
                .filter(|b| b.drift_noise_floor.is_some())
                .count();
            println!(
                "Baseline: {} ({} categories, {} with noise floor)",
                id,
                baselines.len(),
                with_floor
            );
        }
        None => {
            println!("Baseline: not computed");
            println!("  Run `driftwatch baseline` after ingesting historical data");
        }
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
