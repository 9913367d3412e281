//! The analysis pipeline.
//!
//! One pipeline serves every classifier: split the data, fit the model,
//! describe the data and the model with the diagnostic figures, explain two
//! test instances with TreeSHAP and LIME, score both techniques and evaluate
//! the model on the test set.

use crate::config::AnalysisConfig;
use crate::core::constants::FIRST_COMPARISON_FIGURE;
use crate::core::error::{Result, XaiError};
use crate::core::traits::{Classifier, FeatureMatcher, TreeEnsemble};
use crate::core::types::ModelKind;
use crate::dataset::{train_test_split, CsvLoader, Dataset};
use crate::ensemble::RandomForestClassifier;
use crate::figures::{self, ComparisonPoint, Figure, FigureWriter};
use crate::interpretability::{matcher_for, score_lime, score_shap, InterpretabilityReport, ScoringContext};
use crate::metrics_eval::{evaluate_binary_classification, ClassificationMetrics};
use crate::prediction::{
    rank_model_features, ranking_summary, FeatureImportance, LimeExplanation, LimeTabularExplainer, ShapExplainer,
    ShapExplanation,
};
use crate::report::{format_console_report, save_lime_report};
use crate::tree::DecisionTreeClassifier;
use ndarray::{s, Array2, ArrayView2, Axis};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

/// Seed of the LIME neighbourhood of test row `row`.
pub fn instance_seed(base: u64, row: usize) -> u64 {
    base.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(row as u64 + 1)
}

/// Everything one analysis run produced.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// Classifier name
    pub model_name: String,
    /// Number of training and test rows
    pub split_sizes: (usize, usize),
    /// Global importances, largest first
    pub importance: Vec<FeatureImportance>,
    /// SHAP explanations of the two explained test rows
    pub shap_explanations: [ShapExplanation; 2],
    /// LIME explanations of the two explained test rows
    pub lime_explanations: [LimeExplanation; 2],
    /// Model class-1 probabilities of the two explained test rows
    pub model_probs: [f64; 2],
    /// Scores and verdict
    pub interpretability: InterpretabilityReport,
    /// Test-set performance
    pub metrics: ClassificationMetrics,
    /// Figures built during the run
    pub figures: Vec<Figure>,
    /// Artifact files written during the run
    pub artifacts: Vec<PathBuf>,
}

impl AnalysisReport {
    /// The console report.
    pub fn console_report(&self) -> String {
        format_console_report(&self.interpretability, &self.metrics)
    }
}

/// Runs the full analysis for a configuration.
#[derive(Debug, Clone)]
pub struct AnalysisPipeline {
    config: AnalysisConfig,
}

impl AnalysisPipeline {
    /// Validate the configuration and create the pipeline.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(AnalysisPipeline { config })
    }

    /// Pipeline configuration.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Load the configured CSV dataset.
    pub fn load_dataset(&self) -> Result<Dataset> {
        CsvLoader::new(self.config.target_column.clone()).load_csv(&self.config.data_path)
    }

    /// Build the configured classifier and run the analysis with it.
    pub fn run_configured(&self, dataset: &Dataset) -> Result<AnalysisReport> {
        let seed = self.config.random_seed;
        match self.config.model.kind {
            ModelKind::DecisionTree => {
                let mut model = DecisionTreeClassifier::from_config(&self.config.model, seed);
                self.run(&mut model, dataset)
            }
            ModelKind::RandomForest => {
                let mut model = RandomForestClassifier::from_config(&self.config.model, seed);
                self.run(&mut model, dataset)
            }
        }
    }

    /// Run the analysis with `model` on a dedicated thread pool.
    pub fn run<M>(&self, model: &mut M, dataset: &Dataset) -> Result<AnalysisReport>
    where
        M: Classifier + TreeEnsemble,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.effective_num_threads())
            .build()
            .map_err(|e| XaiError::config(format!("Failed to create thread pool: {}", e)))?;

        pool.install(|| self.run_in_pool(model, dataset))
    }

    fn run_in_pool<M>(&self, model: &mut M, dataset: &Dataset) -> Result<AnalysisReport>
    where
        M: Classifier + TreeEnsemble,
    {
        let config = &self.config;
        let start = Instant::now();
        let feature_names = dataset.feature_names();

        let split = train_test_split(dataset, config.test_fraction, config.random_seed)?;
        log::info!(
            "Split {} rows into {} training and {} test rows",
            dataset.num_rows(),
            split.train.num_rows(),
            split.test.num_rows()
        );
        for &row in &config.explained_instances {
            if row >= split.test.num_rows() {
                return Err(XaiError::index_out_of_bounds(row, split.test.num_rows()));
            }
        }

        model.fit(&split.train.features(), &split.train.labels())?;
        let importance = rank_model_features(&*model, feature_names)?;
        log::info!("Fitted {}; top features: {}", model.name(), ranking_summary(&importance, 3));

        let matcher = matcher_for(config.match_strategy);
        let shap = ShapExplainer::new(&*model, dataset.num_features())?;
        let lime = LimeTabularExplainer::new(&split.train.features(), feature_names, config.lime.clone())?;

        let figures = if config.write_figures {
            self.build_figures(
                &*model,
                dataset,
                &split.train,
                &split.test,
                &importance,
                &shap,
                &lime,
                matcher.as_ref(),
            )?
        } else {
            Vec::new()
        };

        let rows = config.explained_instances;
        let test_features = split.test.features();
        let shap_explanations = [
            shap.explain_row(&test_features.row(rows[0]), feature_names)?,
            shap.explain_row(&test_features.row(rows[1]), feature_names)?,
        ];
        let lime_explanations = [
            self.explain_with_lime(&lime, &*model, &test_features, rows[0], config.lime.num_features)?,
            self.explain_with_lime(&lime, &*model, &test_features, rows[1], config.lime.num_features)?,
        ];

        let explained = test_features.select(Axis(0), &rows);
        let proba = model.predict_proba(&explained.view())?;
        let model_probs = [proba[[0, 1]], proba[[1, 1]]];

        let context = ScoringContext {
            feature_names,
            model_probs: &model_probs,
            matcher: matcher.as_ref(),
            weights: &config.scoring_weights,
        };
        let shap_scores = score_shap([&shap_explanations[0], &shap_explanations[1]], config.shap_top_k, &context)?;
        let lime_scores = score_lime([&lime_explanations[0], &lime_explanations[1]], &context)?;
        let interpretability = InterpretabilityReport::new(shap_scores, lime_scores);
        log::info!(
            "Composite scores: SHAP {:.4}, LIME {:.4}",
            shap_scores.composite,
            lime_scores.composite
        );

        let predictions = model.predict(&test_features)?;
        let metrics = evaluate_binary_classification(&predictions.view(), &split.test.labels())?;

        let artifacts = if config.write_figures {
            let writer = FigureWriter::new(&config.output_dir)?;
            let mut written = writer.write_all(&figures)?;
            written.push(save_lime_report(&lime_explanations[0], &config.output_dir)?);
            log::info!("Wrote {} artifacts to {}", written.len(), config.output_dir.display());
            written
        } else {
            Vec::new()
        };

        log::info!("Analysis of {} finished in {:.2?}", model.name(), start.elapsed());

        Ok(AnalysisReport {
            model_name: model.name().to_string(),
            split_sizes: (split.train.num_rows(), split.test.num_rows()),
            importance,
            shap_explanations,
            lime_explanations,
            model_probs,
            interpretability,
            metrics,
            figures,
            artifacts,
        })
    }

    fn explain_with_lime<M: Classifier + ?Sized>(
        &self,
        lime: &LimeTabularExplainer,
        model: &M,
        features: &ArrayView2<'_, f64>,
        row: usize,
        num_features: usize,
    ) -> Result<LimeExplanation> {
        lime.explain_instance(
            &features.row(row),
            model,
            num_features,
            instance_seed(self.config.random_seed, row),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn build_figures<M>(
        &self,
        model: &M,
        dataset: &Dataset,
        train: &Dataset,
        test: &Dataset,
        importance: &[FeatureImportance],
        shap: &ShapExplainer<'_>,
        lime: &LimeTabularExplainer,
        matcher: &dyn FeatureMatcher,
    ) -> Result<Vec<Figure>>
    where
        M: Classifier + TreeEnsemble,
    {
        let config = &self.config;
        let feature_names = dataset.feature_names();
        let [scatter_x, scatter_y] = &config.scatter_features;

        let mut figures = vec![
            figures::correlation_figure(dataset)?,
            figures::histogram_figure(dataset)?,
            figures::scatter_figure(dataset, scatter_x, scatter_y)?,
            figures::global_importance_figure(importance, config.model.kind),
        ];

        let train_shap = shap.shap_values(&train.features())?;
        figures.push(figures::mean_shap_figure(&train_shap, feature_names)?);
        figures.push(figures::shap_bar_figure(&train_shap, feature_names, config.model.kind)?);
        for feature in &config.dependence_features {
            figures.push(figures::dependence_figure(feature, &train.features(), &train_shap, feature_names)?);
        }

        let comparison = self.dependence_comparison(model, test, shap, lime, matcher)?;
        figures.extend(comparison);

        log::info!("Built {} figures", figures.len());
        Ok(figures)
    }

    /// SHAP against LIME contributions of every dependence feature over the
    /// first test rows. Each row is explained once, in parallel.
    fn dependence_comparison<M>(
        &self,
        model: &M,
        test: &Dataset,
        shap: &ShapExplainer<'_>,
        lime: &LimeTabularExplainer,
        matcher: &dyn FeatureMatcher,
    ) -> Result<Vec<Figure>>
    where
        M: Classifier + TreeEnsemble,
    {
        let config = &self.config;
        let n = config.dependence_instances.min(test.num_rows());
        let features = test.features().slice_move(s![..n, ..]);
        let total_features = test.num_features();

        let shap_values: Array2<f64> = shap.shap_values(&features)?;
        let explanations = (0..n)
            .into_par_iter()
            .map(|row| self.explain_with_lime(lime, model, &features, row, total_features))
            .collect::<Result<Vec<_>>>()?;
        log::debug!("Explained {} test rows for the dependence figures", n);

        config
            .dependence_features
            .iter()
            .enumerate()
            .map(|(offset, feature)| {
                let index = test.feature_index(feature)?;
                let points = explanations
                    .iter()
                    .enumerate()
                    .map(|(row, explanation)| ComparisonPoint {
                        feature_value: features[[row, index]],
                        shap: shap_values[[row, index]],
                        lime: explanation.weight_for(feature, matcher),
                    })
                    .collect();
                Ok(figures::comparison_figure(FIRST_COMPARISON_FIGURE + offset, feature, points))
            })
            .collect()
    }
}
