//! End-to-end tests: CSV on disk through to the console report and artifacts.

use std::fs;
use tempfile::TempDir;
use xai_compare::*;

mod common;
use common::*;

fn fast_config(data: &std::path::Path, output: &std::path::Path, kind: ModelKind) -> AnalysisConfig {
    ConfigBuilder::new()
        .data_path(data)
        .output_dir(output)
        .model_kind(kind)
        .n_estimators(15)
        .lime_num_samples(400)
        .dependence_instances(10)
        .num_threads(2)
        .build()
        .unwrap()
}

#[test]
fn test_decision_tree_analysis_from_csv() {
    xai_compare::init();
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("diabetes.csv");
    let output = temp_dir.path().join("output");
    write_diabetes_csv(&data_path, &create_diabetes_dataset(200, 42)).unwrap();

    let pipeline = AnalysisPipeline::new(fast_config(&data_path, &output, ModelKind::DecisionTree)).unwrap();
    let dataset = pipeline.load_dataset().unwrap();
    assert_eq!(dataset.num_rows(), 200);
    assert_eq!(dataset.num_features(), 8);

    let report = pipeline.run_configured(&dataset).unwrap();
    assert_eq!(report.model_name, "DecisionTreeClassifier");
    assert_eq!(report.split_sizes, (160, 40));

    // Eight features, five counted for SHAP.
    assert_approx_eq(report.interpretability.shap.sparsity, 0.375, 1e-12);
    assert_eq!(report.interpretability.shap.fidelity, 1.0);
    assert!(report.interpretability.lime.fidelity <= 1.0);
    assert!(report.lime_explanations[0].num_used_features() <= 5);

    let expected_verdict = Verdict::from_composites(
        report.interpretability.shap.composite,
        report.interpretability.lime.composite,
    );
    assert_eq!(report.interpretability.verdict, expected_verdict);

    let console = report.console_report();
    assert!(console.contains("SHAP Sparsity Score: 0.3750"));
    assert!(console.contains("Conclusion: SHAP is"));
    assert!(console.contains("Metric     | Score"));

    for name in [
        "fig2_correlation_matrix.json",
        "fig3_histograms.json",
        "fig4_scatter_plot.json",
        "fig5_global_importance.json",
        "fig6_mean_shap_summary.json",
        "fig7_shap_bar_summary.json",
        "fig8_dependence_glucose.json",
        "fig8_dependence_bmi.json",
        "fig8_dependence_age.json",
        "fig11_shap_vs_lime_dependence_glucose.json",
        "fig12_shap_vs_lime_dependence_bmi.json",
        "fig13_shap_vs_lime_dependence_age.json",
        "lime_instance1_explanation.html",
    ] {
        assert!(output.join(name).exists(), "missing artifact {}", name);
    }

    let comparison = fs::read_to_string(output.join("fig11_shap_vs_lime_dependence_glucose.json")).unwrap();
    let figure: figures::Figure = serde_json::from_str(&comparison).unwrap();
    assert_eq!(figure.title, "Fig. 11. SHAP vs LIME Dependence Plot for Glucose");
    match figure.data {
        figures::FigureData::Comparison { points, .. } => assert_eq!(points.len(), 10),
        other => panic!("unexpected figure data {:?}", other),
    }
}

#[test]
fn test_random_forest_analysis_without_figures() {
    let temp_dir = TempDir::new().unwrap();
    let data_path = temp_dir.path().join("diabetes.csv");
    let output = temp_dir.path().join("output");
    write_diabetes_csv(&data_path, &create_diabetes_dataset(150, 7)).unwrap();

    let mut config = fast_config(&data_path, &output, ModelKind::RandomForest);
    config.write_figures = false;
    let pipeline = AnalysisPipeline::new(config).unwrap();
    let report = pipeline.run_configured(&pipeline.load_dataset().unwrap()).unwrap();

    assert_eq!(report.model_name, "RandomForestClassifier");
    assert!(report.artifacts.is_empty());
    assert!(!output.exists());

    let metrics = report.metrics;
    for (_, value) in metrics.rows() {
        assert!((0.0..=1.0).contains(&value));
    }

    // SHAP local accuracy holds for the explained rows.
    for (explanation, prob) in report.shap_explanations.iter().zip(report.model_probs) {
        let total: f64 = explanation.entries.iter().map(|(_, phi)| phi).sum();
        assert_approx_eq(explanation.expected_value + total, prob, 1e-9);
    }
}

#[test]
fn test_runs_are_reproducible() {
    let dataset = create_diabetes_dataset(120, 11);
    let temp_dir = TempDir::new().unwrap();
    let mut config = fast_config(temp_dir.path(), temp_dir.path(), ModelKind::RandomForest);
    config.write_figures = false;

    let pipeline = AnalysisPipeline::new(config).unwrap();
    let first = pipeline.run_configured(&dataset).unwrap();
    let second = pipeline.run_configured(&dataset).unwrap();
    assert_eq!(first.interpretability, second.interpretability);
    assert_eq!(first.lime_explanations, second.lime_explanations);
}

#[test]
fn test_missing_file_fails_fast() {
    let temp_dir = TempDir::new().unwrap();
    let config = fast_config(
        &temp_dir.path().join("missing.csv"),
        temp_dir.path(),
        ModelKind::DecisionTree,
    );
    let pipeline = AnalysisPipeline::new(config).unwrap();
    assert!(pipeline.load_dataset().is_err());
}

#[test]
fn test_config_file_round_trip_drives_pipeline() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("xai-compare.toml");
    let mut config = fast_config(temp_dir.path(), temp_dir.path(), ModelKind::DecisionTree);
    config.scoring_weights = ScoringWeights::new(0.5, 0.25, 0.25);
    config.save_to_file(&config_path).unwrap();

    let loaded = AnalysisConfig::load_from_file(&config_path).unwrap();
    assert_eq!(loaded, config);
}
