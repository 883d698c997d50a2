use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};

use maintenance_drift_check::config::MonitorConfig;
use maintenance_drift_check::dataset::Dataset;
use maintenance_drift_check::monitor::{self, CheckPaths};
use maintenance_drift_check::{distribution, logging, performance, report, store};

#[derive(Parser)]
#[command(name = "drift-check")]
#[command(about = "Data drift and model degradation checks for predictive maintenance", long_about = None)]
struct Cli {
    /// JSON file with thresholds and column settings
    #[arg(long, global = true, env = "DRIFT_CHECK_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run drift and degradation checks; exit code reflects overall status
    Check {
        #[arg(long, default_value = "data/processed/processed_data.csv")]
        current: PathBuf,
        #[arg(long, default_value = "data/processed/reference_data.csv")]
        reference: PathBuf,
        #[arg(long, default_value = "models/metrics.json")]
        metrics: PathBuf,
        #[arg(long, default_value = "reports_and_artifacts/drift_report.json")]
        out: PathBuf,
        #[arg(long, value_delimiter = ',')]
        features: Option<Vec<String>>,
    },
    /// Compare feature distributions and write the drift reports
    Drift {
        #[arg(long, default_value = "data/processed/processed_data.csv")]
        current: PathBuf,
        #[arg(long, default_value = "data/processed/reference_data.csv")]
        reference: PathBuf,
        #[arg(long, default_value = "reports_and_artifacts")]
        output_dir: PathBuf,
        #[arg(long, value_delimiter = ',')]
        features: Option<Vec<String>>,
        /// Also write histogram and box-plot summaries
        #[arg(long)]
        distributions: bool,
    },
    /// Store metrics from a labelled dataset as the degradation baseline
    Baseline {
        #[arg(long, default_value = "data/processed/processed_data.csv")]
        data: PathBuf,
        #[arg(long, default_value = "models/metrics.json")]
        out: PathBuf,
    },
}

fn load_config(path: Option<&Path>) -> anyhow::Result<MonitorConfig> {
    match path {
        Some(path) => MonitorConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => Ok(MonitorConfig::default()),
    }
}

fn load_dataset(path: &Path, config: &MonitorConfig) -> anyhow::Result<Dataset> {
    monitor::load_dataset(path, config)
        .with_context(|| format!("failed to read dataset {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(&cli.log_level)?;
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check {
            current,
            reference,
            metrics,
            out,
            features,
        } => {
            if features.is_some() {
                config.feature_columns = features;
            }
            let paths = CheckPaths {
                current,
                reference,
                metrics,
                out,
            };
            let status = monitor::run_check(&paths, &config).with_context(|| {
                format!("drift check on {} failed", paths.current.display())
            })?;
            print!("{}", report::status_summary(&status));

            std::process::exit(status.overall_status.exit_code());
        }
        Commands::Drift {
            current,
            reference,
            output_dir,
            features,
            distributions,
        } => {
            if features.is_some() {
                config.feature_columns = features;
            }
            let current_data = load_dataset(&current, &config)?;
            if store::bootstrap_reference(&current, &reference)? {
                println!(
                    "No reference data found. Saved {} as the new reference.",
                    current.display()
                );
                return Ok(());
            }
            let reference_data = load_dataset(&reference, &config)?;

            let drift_report = monitor::drift_detector(&reference_data, &config)
                .detect(&current_data, config.feature_columns.as_deref());

            store::save_json(&drift_report, &output_dir.join("drift_metrics.json"))?;
            let text = report::generate_report(&drift_report);
            store::save_text(&text, &output_dir.join("drift_report.txt"))?;
            if distributions {
                let summaries = distribution::summarize(&reference_data, &current_data, &drift_report);
                store::save_json(&summaries, &output_dir.join("drift_distributions.json"))?;
            }

            print!("{text}");
        }
        Commands::Baseline { data, out } => {
            let dataset = load_dataset(&data, &config)?;
            let pairs = performance::labelled_pairs(
                &dataset,
                &monitor::model_features(&dataset, &config),
                &config.label_column,
                &config.prediction_column,
            )
            .with_context(|| format!("cannot compute baseline metrics from {}", data.display()))?;
            if pairs.is_empty() {
                anyhow::bail!("no labelled rows in {}", data.display());
            }

            let metrics = performance::classification_metrics(&pairs);
            store::save_baseline(&metrics, &out)?;
            println!(
                "Baseline written to {} (accuracy {:.3}, f1 {:.3} over {} rows).",
                out.display(),
                metrics.accuracy,
                metrics.f1_score,
                pairs.len()
            );
        }
    }

    Ok(())
}
