// Colored terminal output for scores, aggregates, assessments, and drift.
//
// This module handles all terminal-specific formatting. The main.rs command
// handlers delegate here.

use colored::Colorize;

use super::truncate_chars;
use crate::assessment::{AssessmentResult, ConfidenceScore, Status};
use crate::db::models::{CategoryBaseline, DocumentScore, WeeklyAggregate};
use crate::rules::{Category, Tier};
use crate::semantic::drift::SemanticDriftResult;

/// Display per-document scores, highest final score first.
pub fn display_document_scores(scores: &[DocumentScore]) {
    if scores.is_empty() {
        println!("No documents scored.");
        return;
    }

    let mut ranked: Vec<&DocumentScore> = scores.iter().collect();
    ranked.sort_by(|a, b| b.final_score.total_cmp(&a.final_score));

    println!(
        "\n{}",
        format!("=== Document Scores ({} documents) ===", scores.len()).bold()
    );
    println!();
    println!(
        "  {:>6}  {:<22} {:>4}  {:<50}",
        "Final".dimmed(),
        "Class".dimmed(),
        "x".dimmed(),
        "Title".dimmed(),
    );
    println!("  {}", "-".repeat(86).dimmed());

    for s in ranked {
        println!(
            "  {:>6.2}  {:<22} {:>4.1}  {:<50}",
            s.final_score,
            s.document_class.as_str(),
            s.class_multiplier,
            truncate_chars(&s.title, 50),
        );
        for m in &s.matches {
            let note = match &m.downweighted_by {
                Some(term) => format!(" (downweighted by \"{term}\")"),
                None => String::new(),
            };
            println!(
                "          {} {}{}",
                colorize_tier(m.tier),
                m.keyword,
                note.dimmed()
            );
        }
        for sup in &s.suppressed {
            println!(
                "          {} {} {}",
                "suppressed".dimmed(),
                sup.keyword.dimmed(),
                format!("[{}]", sup.reason).dimmed()
            );
        }
    }
    println!();
}

/// Display weekly aggregates as a table.
pub fn display_weekly_aggregates(aggregates: &[WeeklyAggregate]) {
    if aggregates.is_empty() {
        println!("No weekly aggregates.");
        return;
    }

    println!("\n{}", "=== Weekly Aggregates ===".bold());
    println!();
    println!(
        "  {:<12} {:<10} {:>5} {:>8} {:>6} {:>5} {:>5} {:>5}  {}",
        "Category".dimmed(),
        "Week".dimmed(),
        "Docs".dimmed(),
        "Severity".dimmed(),
        "Mix".dimmed(),
        "Cap".dimmed(),
        "Dft".dimmed(),
        "Wrn".dimmed(),
        "Top keywords".dimmed(),
    );
    println!("  {}", "-".repeat(90).dimmed());

    for a in aggregates {
        println!(
            "  {:<12} {:<10} {:>5} {:>8.2} {:>6.2} {:>5.2} {:>5.2} {:>5.2}  {}",
            a.category.as_str(),
            a.week_of,
            a.document_count,
            a.total_severity,
            a.severity_mix,
            a.capture_proportion,
            a.drift_proportion,
            a.warning_proportion,
            truncate_chars(&a.top_keywords.join(", "), 40),
        );
    }
    println!();
}

/// Display an assessment with its confidence breakdown.
pub fn display_assessment(
    category: Category,
    result: &AssessmentResult,
    confidence: &ConfidenceScore,
) {
    println!(
        "\n{} {}",
        format!("=== {category} ===").bold(),
        colorize_status(result.status)
    );
    println!("  {}", result.reason);

    let d = &result.detail;
    println!(
        "  Signals: {} capture, {} drift, {} warning across {} items",
        d.capture_count, d.drift_count, d.warning_count, d.items_reviewed
    );
    if d.has_authoritative {
        println!("  {}", "Authoritative source present".green());
    }
    if d.insufficient_data {
        println!("  {}", "Insufficient data".yellow());
    }
    if !result.matches.is_empty() {
        println!("  Matches: {}", result.matches.join(", "));
    }

    let f = &confidence.factors;
    println!("\n  Confidence: {}", format!("{:.2}", confidence.score).bold());
    println!("    source diversity  {:.2}", f.source_diversity);
    println!("    authority         {:.2}", f.authority_weight);
    println!("    evidence coverage {:.2}", f.evidence_coverage);
    println!("    keyword density   {:.2}", f.keyword_density);
    println!("    agreement         {:.2}", f.ai_agreement);
    println!();
}

/// Display stored baselines.
pub fn display_baselines(baselines: &[CategoryBaseline]) {
    if baselines.is_empty() {
        println!("No baselines computed. Run `driftwatch baseline` first.");
        return;
    }

    println!(
        "\n{}",
        format!("=== Baseline {} ===", baselines[0].baseline_id).bold()
    );
    println!();
    for b in baselines {
        let floor = b
            .drift_noise_floor
            .map(|f| format!("{f:.4}"))
            .unwrap_or_else(|| "n/a".to_string());
        let centroid = match &b.embedding_centroid {
            Some(c) => format!("{} dims", c.len()),
            None => "none".to_string(),
        };
        println!(
            "  {:<12} {} weeks, severity {:.2} ± {:.2}, {:.1} docs/week, mix {:.2}, noise floor {}, centroid {}",
            b.category.as_str(),
            b.week_count,
            b.avg_weekly_severity,
            b.stddev_weekly_severity,
            b.avg_weekly_doc_count,
            b.avg_severity_mix,
            floor,
            centroid,
        );
    }
    println!();
}

/// Display a semantic drift result (or why there is none).
pub fn display_drift(category: Category, result: Option<&SemanticDriftResult>) {
    match result {
        None => {
            println!(
                "{}: no semantic drift available (missing embeddings or baseline centroid)",
                category
            );
        }
        Some(r) => {
            let normalized = r
                .normalized_drift
                .map(|n| format!("{n:.2}x"))
                .unwrap_or_else(|| "n/a".to_string());
            println!(
                "{}: raw {:.4}, normalized {} vs {} ({})",
                category.to_string().bold(),
                r.raw_cosine_drift,
                normalized,
                r.baseline_id,
                r.interpretation
            );
        }
    }
}

fn colorize_tier(tier: Tier) -> colored::ColoredString {
    match tier {
        Tier::Capture => "capture".red().bold(),
        Tier::Drift => "drift".bright_red(),
        Tier::Warning => "warning".yellow(),
    }
}

fn colorize_status(status: Status) -> colored::ColoredString {
    match status {
        Status::Capture => status.as_str().red().bold(),
        Status::Drift => status.as_str().bright_red(),
        Status::Warning => status.as_str().yellow(),
        Status::Stable => status.as_str().green(),
    }
}
