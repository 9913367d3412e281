//! Console report and the saved LIME explanation report.

use crate::core::error::{Result, XaiError};
use crate::interpretability::InterpretabilityReport;
use crate::metrics_eval::ClassificationMetrics;
use crate::prediction::LimeExplanation;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the saved explanation of the first explained instance.
pub const LIME_REPORT_FILE: &str = "lime_instance1_explanation.html";

/// Interpretability scores with four decimals, then the conclusion.
pub fn format_scores(report: &InterpretabilityReport) -> String {
    let lines = [
        ("SHAP Sparsity Score", report.shap.sparsity),
        ("LIME Sparsity Score", report.lime.sparsity),
        ("SHAP Stability Score", report.shap.stability),
        ("LIME Stability Score", report.lime.stability),
        ("SHAP Fidelity Score", report.shap.fidelity),
        ("LIME Fidelity Score", report.lime.fidelity),
        ("SHAP Interpretability Score (e1)", report.shap.composite),
        ("LIME Interpretability Score (e2)", report.lime.composite),
    ];

    let mut out = String::new();
    for (label, value) in lines {
        let _ = writeln!(out, "{}: {:.4}", label, value);
    }
    let _ = writeln!(out, "Conclusion: {}", report.verdict);
    out
}

/// The two-column performance table.
pub fn format_metrics_table(metrics: &ClassificationMetrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Model Performance Metrics:");
    let _ = writeln!(out, "{:<10} | {:<10}", "Metric", "Score");
    let _ = writeln!(out, "{}", "-".repeat(25));
    for (label, value) in metrics.rows() {
        let _ = writeln!(out, "{:<10} | {:.4}", label, value);
    }
    out
}

/// Full console report: scores, conclusion and performance table.
pub fn format_console_report(report: &InterpretabilityReport, metrics: &ClassificationMetrics) -> String {
    format!("\n{}\n{}", format_scores(report), format_metrics_table(metrics))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Standalone HTML page describing a LIME explanation.
pub fn render_lime_html(explanation: &LimeExplanation, generated_at: chrono::DateTime<chrono::Local>) -> String {
    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html><head><meta charset=\"utf-8\"><title>LIME explanation</title></head><body>");

    let _ = writeln!(html, "<h2>Prediction probabilities</h2><table>");
    for (name, proba) in explanation.class_names.iter().zip(explanation.predict_proba) {
        let _ = writeln!(html, "<tr><td>{}</td><td>{:.2}</td></tr>", escape_html(name), proba);
    }
    let _ = writeln!(html, "</table>");

    let _ = writeln!(
        html,
        "<h2>Explanation for class \"{}\"</h2><table>",
        escape_html(&explanation.class_names[1])
    );
    let _ = writeln!(html, "<tr><th>Feature condition</th><th>Weight</th><th>Supports</th></tr>");
    for (token, weight) in &explanation.entries {
        let class = if *weight > 0.0 { 1 } else { 0 };
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{:.4}</td><td>{}</td></tr>",
            escape_html(token),
            weight,
            escape_html(&explanation.class_names[class])
        );
    }
    let _ = writeln!(html, "</table>");
    let _ = writeln!(
        html,
        "<p>Intercept {:.4}, local prediction {:.4}, surrogate R² {:.4}</p>",
        explanation.intercept, explanation.local_pred, explanation.score
    );

    let _ = writeln!(html, "<h2>Feature values</h2><table>");
    for &feature in &explanation.feature_indices {
        let _ = writeln!(
            html,
            "<tr><td>{}</td><td>{:.2}</td></tr>",
            escape_html(&explanation.feature_names[feature]),
            explanation.instance[feature]
        );
    }
    let _ = writeln!(html, "</table>");

    let _ = writeln!(
        html,
        "<footer>Generated {}</footer>",
        generated_at.format("%Y-%m-%d %H:%M:%S %:z")
    );
    let _ = writeln!(html, "</body></html>");
    html
}

/// Save the LIME explanation of the first explained instance.
pub fn save_lime_report<P: AsRef<Path>>(explanation: &LimeExplanation, output_dir: P) -> Result<PathBuf> {
    prepare_output_dir(output_dir.as_ref())?;
    let path = output_dir.as_ref().join(LIME_REPORT_FILE);
    fs::write(&path, render_lime_html(explanation, chrono::Local::now()))?;
    log::info!("Saved LIME explanation to {}", path.display());
    Ok(path)
}

/// Create the artifact directory. An existing non-directory path is an error.
pub fn prepare_output_dir(dir: &Path) -> Result<()> {
    crate::ensure!(
        !dir.exists() || dir.is_dir(),
        XaiError::report(format!("Output path '{}' is not a directory", dir.display()))
    );
    fs::create_dir_all(dir)?;
    Ok(())
}
