//! Diagnostic figure artifacts.
//!
//! Figures are not rendered. Each one is written as a JSON document holding
//! its title and the series a plotting tool needs, named after the figure
//! number and subject (`fig2_correlation_matrix.json`, ...).

use crate::core::constants::{CLASS_NAMES, HISTOGRAM_BINS};
use crate::core::error::{Result, XaiError};
use crate::core::types::ModelKind;
use crate::dataset::Dataset;
use crate::metrics_eval::{correlation_matrix, histogram, Histogram};
use crate::prediction::{mean_abs_shap, FeatureImportance, ShapExplainer};
use crate::report::prepare_output_dir;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// One histogram of figure 3.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramSeries {
    pub column: String,
    pub histogram: Histogram,
}

/// Points of one class in the scatter figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterGroup {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// A named bar series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Feature value and both techniques' contributions for one instance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComparisonPoint {
    pub feature_value: f64,
    pub shap: f64,
    pub lime: f64,
}

/// Data carried by a figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FigureData {
    /// Square matrix with row and column labels
    Heatmap { labels: Vec<String>, values: Vec<Vec<f64>> },
    /// One histogram per column
    Histograms { series: Vec<HistogramSeries> },
    /// Two-dimensional scatter grouped by a categorical column
    Scatter {
        x_label: String,
        y_label: String,
        hue: String,
        groups: Vec<ScatterGroup>,
    },
    /// Horizontal bars, one category per label
    Bar {
        value_label: String,
        labels: Vec<String>,
        series: Vec<BarSeries>,
    },
    /// SHAP value against feature value, coloured by a second feature
    Dependence {
        feature: String,
        interaction_feature: Option<String>,
        feature_values: Vec<f64>,
        shap_values: Vec<f64>,
        interaction_values: Vec<f64>,
    },
    /// SHAP and LIME contributions against feature value
    Comparison { feature: String, points: Vec<ComparisonPoint> },
}

/// A numbered diagnostic figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub number: usize,
    pub name: String,
    pub title: String,
    pub data: FigureData,
}

impl Figure {
    /// Artifact file name, e.g. `fig8_dependence_bmi.json`.
    pub fn file_name(&self) -> String {
        format!("fig{}_{}.json", self.number, self.name)
    }
}

/// Writes figures as pretty JSON into one directory.
#[derive(Debug, Clone)]
pub struct FigureWriter {
    output_dir: PathBuf,
}

impl FigureWriter {
    /// Create the writer, creating `output_dir` if needed.
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        prepare_output_dir(&output_dir)?;
        Ok(FigureWriter { output_dir })
    }

    /// Output directory.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write one figure and return its path.
    pub fn write(&self, figure: &Figure) -> Result<PathBuf> {
        let path = self.output_dir.join(figure.file_name());
        let writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(writer, figure)?;
        log::debug!("Wrote {}", path.display());
        Ok(path)
    }

    /// Write several figures.
    pub fn write_all(&self, figures: &[Figure]) -> Result<Vec<PathBuf>> {
        figures.iter().map(|figure| self.write(figure)).collect()
    }
}

fn rows_of(matrix: &Array2<f64>) -> Vec<Vec<f64>> {
    matrix.rows().into_iter().map(|row| row.to_vec()).collect()
}

/// Figure 2: correlation of every column, target included.
pub fn correlation_figure(dataset: &Dataset) -> Result<Figure> {
    let (frame, labels) = dataset.frame();
    let corr = correlation_matrix(&frame.view())?;
    Ok(Figure {
        number: 2,
        name: "correlation_matrix".to_string(),
        title: "Fig. 2. Correlation coefficient matrix of diabetes".to_string(),
        data: FigureData::Heatmap {
            labels,
            values: rows_of(&corr),
        },
    })
}

/// Figure 3: equal-width histogram of every column.
pub fn histogram_figure(dataset: &Dataset) -> Result<Figure> {
    let (frame, labels) = dataset.frame();
    let series = labels
        .into_iter()
        .zip(frame.columns())
        .map(|(column, values)| {
            Ok(HistogramSeries {
                column,
                histogram: histogram(&values, HISTOGRAM_BINS)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Figure {
        number: 3,
        name: "histograms".to_string(),
        title: "Fig. 3. Histogram of data set features".to_string(),
        data: FigureData::Histograms { series },
    })
}

/// Figure 4: `x` against `y`, one group per outcome class.
pub fn scatter_figure(dataset: &Dataset, x: &str, y: &str) -> Result<Figure> {
    let xs = dataset.column(x)?;
    let ys = dataset.column(y)?;
    let labels = dataset.labels();

    let groups = (0..2)
        .map(|class| {
            let selected: Vec<usize> = labels
                .iter()
                .enumerate()
                .filter(|(_, &label)| label as usize == class)
                .map(|(i, _)| i)
                .collect();
            ScatterGroup {
                label: class.to_string(),
                x: selected.iter().map(|&i| xs[i]).collect(),
                y: selected.iter().map(|&i| ys[i]).collect(),
            }
        })
        .collect();

    Ok(Figure {
        number: 4,
        name: "scatter_plot".to_string(),
        title: "Fig. 4. Scatter plot of two classes".to_string(),
        data: FigureData::Scatter {
            x_label: x.to_string(),
            y_label: y.to_string(),
            hue: dataset.target_name().to_string(),
            groups,
        },
    })
}

/// Figure 5: model importances, largest first.
pub fn global_importance_figure(ranking: &[FeatureImportance], kind: ModelKind) -> Figure {
    let title = match kind {
        ModelKind::DecisionTree => "Fig. 5. Feature Importance (Decision Tree)",
        ModelKind::RandomForest => "Fig. 5. Global variable importance",
    };

    Figure {
        number: 5,
        name: "global_importance".to_string(),
        title: title.to_string(),
        data: FigureData::Bar {
            value_label: "Importance".to_string(),
            labels: ranking.iter().map(|f| f.name.clone()).collect(),
            series: vec![BarSeries {
                name: "Importance".to_string(),
                values: ranking.iter().map(|f| f.importance).collect(),
            }],
        },
    }
}

/// Figure 6: mean |SHAP| per feature for each class.
pub fn mean_shap_figure(class_one_values: &Array2<f64>, feature_names: &[String]) -> Result<Figure> {
    let series = (0..2)
        .map(|class| {
            let values = ShapExplainer::class_values(class_one_values, class)?;
            Ok(BarSeries {
                name: format!("Class {}", class),
                values: mean_abs_shap(&values).to_vec(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Figure {
        number: 6,
        name: "mean_shap_summary".to_string(),
        title: "Fig. 6. Mean Absolute SHAP Values by Feature and Class".to_string(),
        data: FigureData::Bar {
            value_label: "Mean |SHAP Value|".to_string(),
            labels: feature_names.to_vec(),
            series,
        },
    })
}

/// Figure 7: mean |SHAP| per class, features sorted by their total.
pub fn shap_bar_figure(class_one_values: &Array2<f64>, feature_names: &[String], kind: ModelKind) -> Result<Figure> {
    let per_class = (0..2)
        .map(|class| ShapExplainer::class_values(class_one_values, class).map(|v| mean_abs_shap(&v)))
        .collect::<Result<Vec<_>>>()?;

    let mut order: Vec<usize> = (0..feature_names.len()).collect();
    order.sort_by(|&a, &b| {
        let total_a = per_class[0][a] + per_class[1][a];
        let total_b = per_class[0][b] + per_class[1][b];
        total_b.total_cmp(&total_a)
    });

    let title = match kind {
        ModelKind::DecisionTree => "Fig. 7. SHAP Summary (Decision Tree)",
        ModelKind::RandomForest => "Fig. 7. SHAP value of the model",
    };

    Ok(Figure {
        number: 7,
        name: "shap_bar_summary".to_string(),
        title: title.to_string(),
        data: FigureData::Bar {
            value_label: "mean(|SHAP value|) (average impact on model output magnitude)".to_string(),
            labels: order.iter().map(|&i| feature_names[i].clone()).collect(),
            series: per_class
                .iter()
                .zip(CLASS_NAMES)
                .map(|(means, name)| BarSeries {
                    name: name.to_string(),
                    values: order.iter().map(|&i| means[i]).collect(),
                })
                .collect(),
        },
    })
}

/// The other feature whose values correlate most with `feature`'s SHAP
/// values, used to colour a dependence plot.
pub fn strongest_interaction(
    feature: usize,
    features: &ArrayView2<'_, f64>,
    class_one_values: &Array2<f64>,
) -> Option<usize> {
    let shap = class_one_values.column(feature);
    (0..features.ncols())
        .filter(|&other| other != feature)
        .map(|other| (other, pearson(&features.column(other), &shap).abs()))
        .filter(|(_, r)| r.is_finite())
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(other, _)| other)
}

fn pearson(a: &ArrayView1<'_, f64>, b: &ArrayView1<'_, f64>) -> f64 {
    let n = a.len() as f64;
    let (mean_a, mean_b) = (a.sum() / n, b.sum() / n);
    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        cov += (x - mean_a) * (y - mean_b);
        var_a += (x - mean_a).powi(2);
        var_b += (y - mean_b).powi(2);
    }
    if var_a == 0.0 || var_b == 0.0 {
        return 0.0;
    }
    cov / (var_a.sqrt() * var_b.sqrt())
}

/// Figure 8: SHAP dependence of one feature over the explained rows.
pub fn dependence_figure(
    feature: &str,
    features: &ArrayView2<'_, f64>,
    class_one_values: &Array2<f64>,
    feature_names: &[String],
) -> Result<Figure> {
    if features.dim() != class_one_values.dim() {
        return Err(XaiError::dimension_mismatch(
            format!("{:?} SHAP values", features.dim()),
            format!("{:?} SHAP values", class_one_values.dim()),
        ));
    }
    let index = feature_names
        .iter()
        .position(|name| name == feature)
        .ok_or_else(|| XaiError::dataset(format!("Unknown feature '{}'", feature)))?;

    let interaction = strongest_interaction(index, features, class_one_values);

    Ok(Figure {
        number: 8,
        name: format!("dependence_{}", feature.to_lowercase()),
        title: format!("SHAP Dependence Plot for {}", feature),
        data: FigureData::Dependence {
            feature: feature.to_string(),
            interaction_feature: interaction.map(|i| feature_names[i].clone()),
            feature_values: features.column(index).to_vec(),
            shap_values: class_one_values.column(index).to_vec(),
            interaction_values: interaction
                .map(|i| features.column(i).to_vec())
                .unwrap_or_default(),
        },
    })
}

/// Figures 11 onwards: SHAP against LIME contributions of one feature.
pub fn comparison_figure(number: usize, feature: &str, points: Vec<ComparisonPoint>) -> Figure {
    Figure {
        number,
        name: format!("shap_vs_lime_dependence_{}", feature.to_lowercase()),
        title: format!("Fig. {}. SHAP vs LIME Dependence Plot for {}", number, feature),
        data: FigureData::Comparison {
            feature: feature.to_string(),
            points,
        },
    }
}
