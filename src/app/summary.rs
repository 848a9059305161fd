//! Terminal output.

use crate::app::pipeline::FitRun;
use crate::domain::{CandidateModel, Warning};
use crate::error::AppError;
use crate::sufficiency::DataSufficiency;

fn fmt_r2(v: Option<f64>) -> String {
    match v {
        Some(v) => format!("{v:.4}"),
        None => "-".to_string(),
    }
}

fn format_candidate(c: &CandidateModel) -> String {
    format!(
        "  {:<13} {:<36} adj_r2={}\n",
        c.status().as_str(),
        c.formula().to_string(),
        fmt_r2(c.r_squared_adj())
    )
}

fn format_warnings(out: &mut String, warnings: &[Warning]) {
    if warnings.is_empty() {
        return;
    }
    out.push_str("\nWarnings:\n");
    for w in warnings {
        out.push_str(&format!("- {w}\n"));
    }
}

/// Status, selected model, candidate tally and warnings.
pub fn format_method_summary(run: &FitRun, list_candidates: bool) -> String {
    let result = &run.result;
    let mut out = String::new();

    out.push_str(&format!("=== {} ===\n", result.method_name));
    out.push_str(&format!(
        "Rows: n={} | complete={}\n",
        run.rows_read, run.complete_rows
    ));
    out.push_str(&format!("Status: {}\n", result.status));

    if let Some(model) = &result.model {
        out.push_str("\nSelected model:\n");
        out.push_str(&format!("- {} ({})\n", model.formula(), model.model_type()));
        if let Some(params) = model.params() {
            for (name, value) in params.to_map() {
                out.push_str(&format!("- {name:<22} {value:.6}\n"));
            }
        }
        out.push_str(&format!("- adj_r2: {}\n", fmt_r2(result.r_squared_adj)));
    }
    if let Some(m) = &result.totals_metrics {
        out.push_str(&format!(
            "- totals: n={} rmse={:.4} cvrmse={:.4} nmbe={:.4}\n",
            m.merged_length, m.rmse, m.cvrmse, m.nmbe
        ));
    }

    if !result.candidates.is_empty() {
        out.push_str("\nCandidates:\n");
        for (status, count) in result.status_counts() {
            out.push_str(&format!("  {:<13} {count}\n", status.as_str()));
        }
        if list_candidates {
            out.push('\n');
            for c in &result.candidates {
                out.push_str(&format_candidate(c));
            }
        }
    }

    format_warnings(&mut out, &result.warnings);
    out
}

pub fn format_sufficiency(sufficiency: &DataSufficiency) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== {} ===\n", sufficiency.criteria_name));
    out.push_str(&format!("Status: {}\n", sufficiency.status));
    format_warnings(&mut out, &sufficiency.warnings);
    out
}

/// Warnings as a JSON array of `{qualified_name, description, data}` records.
pub fn warnings_json(warnings: &[Warning]) -> Result<String, AppError> {
    let records: Vec<_> = warnings.iter().map(Warning::to_record).collect();
    serde_json::to_string_pretty(&records)
        .map_err(|e| AppError::new(2, format!("Failed to encode warnings as JSON: {e}")))
}
