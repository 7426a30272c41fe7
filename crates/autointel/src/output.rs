use autointel_core::{AnalysisReport, ReportSummary, RunOutcome};
use comfy_table::Table;

pub fn print_outcome(outcome: &RunOutcome) {
    let report = &outcome.report;
    println!("Run {} finished: {}", report.run_id, outcome.label());
    if let Some(reason) = &report.abort_reason {
        println!("  Abort reason: {reason}");
    }
    print_report(report);
}

pub fn print_report(report: &AnalysisReport) {
    let mut quality = Table::new();
    quality.set_header(vec![
        "kind",
        "kept",
        "discarded",
        "completeness",
        "validity",
        "decision",
        "repairs",
    ]);
    for q in &report.quality {
        quality.add_row(vec![
            q.kind.to_string(),
            q.kept.to_string(),
            q.discarded.to_string(),
            format!("{:.2}", q.completeness),
            format!("{:.2}", q.validity),
            format!("{:?}", q.decision).to_lowercase(),
            q.repair_attempts.to_string(),
        ]);
    }
    println!("\n--- Quality ---\n{quality}");

    if !report.corpus.is_empty() {
        let mut corpus = Table::new();
        corpus.set_header(vec!["kind", "records", "flagged", "mean sentiment", "top bigrams"]);
        for c in &report.corpus {
            let bigrams = c
                .top_bigrams
                .iter()
                .take(3)
                .map(|n| format!("{} ({})", n.ngram, n.count))
                .collect::<Vec<_>>()
                .join(", ");
            corpus.add_row(vec![
                c.kind.to_string(),
                c.records.to_string(),
                c.flagged_records.to_string(),
                c.mean_sentiment
                    .map(|m| format!("{m:.3}"))
                    .unwrap_or_else(|| "-".to_string()),
                bigrams,
            ]);
        }
        println!("\n--- Corpus ---\n{corpus}");
    }

    if !report.correlations.is_empty() {
        let mut correlations = Table::new();
        correlations.set_header(vec!["slice", "pair", "r", "p", "n", "strength"]);
        for c in report.correlations.iter().chain(report.cross_kind.iter()) {
            correlations.add_row(vec![
                c.slice.clone(),
                c.pair_label(),
                format!("{:.3}", c.coefficient),
                format!("{:.4}", c.p_value),
                c.sample_size.to_string(),
                c.strength.label().to_string(),
            ]);
        }
        println!("\n--- Correlations ---\n{correlations}");
    }

    let insights = &report.insights;
    if !insights.key_findings.is_empty() || !insights.trends.is_empty() {
        println!("\n--- Insights ---");
        for line in insights
            .key_findings
            .iter()
            .chain(&insights.recommendations)
            .chain(&insights.trends)
        {
            println!("  * {line}");
        }
    }

    if !report.warnings.is_empty() {
        println!("\n--- Warnings ---");
        for warning in &report.warnings {
            println!("  ! {warning}");
        }
    }
}

pub fn print_summaries(summaries: &[ReportSummary]) {
    if summaries.is_empty() {
        println!("No reports stored.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["run id", "created at", "status"]);
    for summary in summaries {
        table.add_row(vec![
            summary.run_id.to_string(),
            summary.created_at.to_rfc3339(),
            summary.status.to_string(),
        ]);
    }
    println!("{table}");
}
