//! xai-compare CLI: score TreeSHAP and LIME explanations of a tree classifier.

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;
use std::path::{Path, PathBuf};
use xai_compare::config::{load_layered, ConfigSource, DEFAULT_CONFIG_FILE};
use xai_compare::{AnalysisPipeline, MatchStrategy, ModelKind};

#[derive(Parser, Debug)]
#[command(name = "xai-compare")]
#[command(about = "Compare the interpretability of SHAP and LIME explanations")]
#[command(version)]
struct Cli {
    /// CSV dataset with a binary outcome column
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Classifier to analyse (decision-tree or random-forest)
    #[arg(short, long)]
    model: Option<ModelKind>,

    /// Configuration file (.toml or .json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory receiving figures and the LIME report
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Skip writing figure and report artifacts
    #[arg(long)]
    no_figures: bool,

    /// Token-to-feature matching (substring or token)
    #[arg(long)]
    match_strategy: Option<MatchStrategy>,

    /// Increase logging verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    fn config_file(&self) -> Option<PathBuf> {
        self.config.clone().or_else(|| {
            let default = Path::new(DEFAULT_CONFIG_FILE);
            default.exists().then(|| default.to_path_buf())
        })
    }

    fn has_overrides(&self) -> bool {
        self.data.is_some()
            || self.model.is_some()
            || self.output_dir.is_some()
            || self.seed.is_some()
            || self.no_figures
            || self.match_strategy.is_some()
    }
}

fn main() {
    let cli = Cli::parse();
    xai_compare::core::initialize_logging_with_level(cli.log_level());

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_file = cli.config_file();
    let (mut config, mut sources) =
        load_layered(config_file.as_deref()).context("failed to load configuration")?;

    if let Some(data) = &cli.data {
        config.data_path = data.clone();
    }
    if let Some(kind) = cli.model {
        config.model.kind = kind;
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(seed) = cli.seed {
        config.random_seed = seed;
    }
    if let Some(strategy) = cli.match_strategy {
        config.match_strategy = strategy;
    }
    if cli.no_figures {
        config.write_figures = false;
    }
    if cli.has_overrides() {
        sources.push(ConfigSource::CommandLine);
    }

    log::info!(
        "xai-compare {} analysing {} with {} (config: {})",
        xai_compare::VERSION,
        config.data_path.display(),
        config.model.kind,
        sources.iter().map(ToString::to_string).collect::<Vec<_>>().join(" < ")
    );

    let pipeline = AnalysisPipeline::new(config).context("invalid configuration")?;
    let dataset = pipeline
        .load_dataset()
        .with_context(|| format!("failed to load {}", pipeline.config().data_path.display()))?;
    let report = pipeline.run_configured(&dataset).context("analysis failed")?;

    print!("{}", report.console_report());
    Ok(())
}
