//! loanlab CLI — run the loan-approval experiments from the terminal.

use std::io::stdout;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use loanlab_core::{Column, Frame};
use loanlab_experiments::{
    cat_encoding_test, cv_scores, default_roster, default_thresholds,
    evaluate_discrimination_thresholds, feature_selection_test, grid_search_model,
    imputation_test, load_results_from_folder, randomized_search_roster, save_records,
    summarize_results, ExperimentConfig,
};
use loanlab_models::{Classifier, ParamValue, RandomForestClassifier};
use loanlab_preprocess::TablePreprocessor;
use loanlab_report::{
    category_counts_chart, importance_chart, missing_values_chart, numeric_histograms,
    print_chart, print_table, threshold_plot, zero_values_chart,
};
use loanlab_select::ParamGrid;

/// Loan-approval model experimentation workbench
#[derive(Parser, Debug)]
#[command(name = "loanlab", version, about, long_about = None)]
struct Cli {
    /// Experiment configuration file (TOML); defaults apply if omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dataset diagnostics: missing values, zeros, histograms, categories
    Inspect {
        /// Loan table CSV
        data: PathBuf,
        /// Histogram bin count
        #[arg(long, default_value_t = 10)]
        bins: usize,
    },
    /// Baseline cross-validated scores for the default roster
    Cv {
        data: PathBuf,
        /// Target column holding 0/1 approval labels
        #[arg(short, long, default_value = "approved")]
        target: String,
        /// CSV to append the result table to
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Compare numeric imputation strategies across the roster
    Impute {
        data: PathBuf,
        #[arg(short, long, default_value = "approved")]
        target: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Compare categorical encoders across the roster
    Encode {
        data: PathBuf,
        #[arg(short, long, default_value = "approved")]
        target: String,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Sweep feature-selection importance thresholds
    Select {
        data: PathBuf,
        #[arg(short, long, default_value = "approved")]
        target: String,
        /// Importance cutoffs to sweep
        #[arg(long, value_delimiter = ',', default_values_t = [0.0, 0.005, 0.01, 0.02, 0.05])]
        thresholds: Vec<f64>,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Exhaustive grid search for the random forest
    Grid {
        data: PathBuf,
        #[arg(short, long, default_value = "approved")]
        target: String,
        /// Where the best-configuration JSON lands
        #[arg(short, long)]
        artifact: Option<PathBuf>,
    },
    /// Randomized search across the roster
    Random {
        data: PathBuf,
        #[arg(short, long, default_value = "approved")]
        target: String,
        /// Parameter combinations sampled per model
        #[arg(short, long, default_value_t = 10)]
        n_iter: usize,
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Discrimination-threshold curves for the roster
    Thresholds {
        data: PathBuf,
        #[arg(short, long, default_value = "approved")]
        target: String,
    },
    /// Aggregate every result CSV in a folder
    Summarize {
        /// Directory of experiment result tables
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };

    run(cli.command, &config)
}

fn run(command: Commands, config: &ExperimentConfig) -> Result<()> {
    let mut out = stdout();
    match command {
        Commands::Inspect { data, bins } => {
            let frame = loanlab_io::read_frame(&data)?;
            print_chart(&mut out, "Missing values per column", &missing_values_chart(&frame))?;
            print_chart(&mut out, "Zero values per numeric column", &zero_values_chart(&frame))?;
            for (name, chart) in numeric_histograms(&frame, bins) {
                print_chart(&mut out, &format!("Distribution of {name}"), &chart)?;
            }
            for name in frame.categorical_names() {
                let chart = category_counts_chart(&frame, &name)?;
                print_chart(&mut out, &format!("Categories of {name}"), &chart)?;
            }
        }
        Commands::Cv { data, target, out: path } => {
            let (frame, y) = load_dataset(&data, &target)?;
            let models = default_roster(config.seed);
            let records = cv_scores(&models, &frame, &y, config)?;
            save_records(&records, path.as_deref())?;
            print_table(
                &mut out,
                "Cross-validated ROC AUC",
                &cols(&["Model", "Parameters", "ROC_AUC", "Time"]),
                &records
                    .iter()
                    .map(|r| {
                        vec![
                            r.model.clone(),
                            r.parameters.clone(),
                            r.roc_auc.to_string(),
                            r.time.to_string(),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )?;
        }
        Commands::Impute { data, target, out: path } => {
            let (frame, y) = load_dataset(&data, &target)?;
            let models = default_roster(config.seed);
            let records = imputation_test(&models, &frame, &y, config)?;
            save_records(&records, path.as_deref())?;
            print_table(
                &mut out,
                "Imputation comparison",
                &cols(&["Model", "Parameters", "Imputer", "ROC_AUC", "Time"]),
                &records
                    .iter()
                    .map(|r| {
                        vec![
                            r.model.clone(),
                            r.parameters.clone(),
                            r.imputer.clone(),
                            r.roc_auc.to_string(),
                            r.time.to_string(),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )?;
        }
        Commands::Encode { data, target, out: path } => {
            let (frame, y) = load_dataset(&data, &target)?;
            let models = default_roster(config.seed);
            let records = cat_encoding_test(&models, &frame, &y, config)?;
            save_records(&records, path.as_deref())?;
            print_table(
                &mut out,
                "Categorical encoding comparison",
                &cols(&["Model", "Parameters", "Encoder", "ROC_AUC", "Time"]),
                &records
                    .iter()
                    .map(|r| {
                        vec![
                            r.model.clone(),
                            r.parameters.clone(),
                            r.encoder.clone(),
                            r.roc_auc.to_string(),
                            r.time.to_string(),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )?;
        }
        Commands::Select { data, target, thresholds, out: path } => {
            let (frame, y) = load_dataset(&data, &target)?;
            let models = default_roster(config.seed);
            let mut reference = RandomForestClassifier::new();
            reference.seed = config.seed;
            let records =
                feature_selection_test(&models, &mut reference, &thresholds, &frame, &y, config)?;
            save_records(&records, path.as_deref())?;
            print_table(
                &mut out,
                "Feature-selection sweep",
                &cols(&["Model", "Parameters", "Threshold", "Selected %", "ROC_AUC", "Time"]),
                &records
                    .iter()
                    .map(|r| {
                        vec![
                            r.model.clone(),
                            r.parameters.clone(),
                            r.threshold.to_string(),
                            r.selected_pct.to_string(),
                            r.roc_auc.to_string(),
                            r.time.to_string(),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )?;

            // The sweep leaves the reference forest fitted on the full
            // preprocessed table; chart what drove the selection.
            let mut prep = TablePreprocessor::general();
            prep.fit(&frame, &y)?;
            if let Some(importances) = reference.feature_importances() {
                print_chart(
                    &mut out,
                    "Reference feature importances",
                    &importance_chart(prep.feature_names(), importances),
                )?;
            }
        }
        Commands::Grid { data, target, artifact } => {
            let (frame, y) = load_dataset(&data, &target)?;
            let mut forest = RandomForestClassifier::new();
            forest.seed = config.seed;
            let best =
                grid_search_model(&forest, &forest_grid(), &frame, &y, config, artifact.as_deref())?;
            println!("best mean ROC AUC: {best}");
        }
        Commands::Random { data, target, n_iter, out: path } => {
            let (frame, y) = load_dataset(&data, &target)?;
            let entries: Vec<(Box<dyn Classifier>, ParamGrid)> = default_roster(config.seed)
                .into_iter()
                .map(|model| {
                    let grid = roster_grid(&model.name());
                    (model, grid)
                })
                .collect();
            let records = randomized_search_roster(&entries, n_iter, &frame, &y, config)?;
            save_records(&records, path.as_deref())?;
            print_table(
                &mut out,
                "Randomized search ranking",
                &cols(&["Model", "Best_Params", "ROC_AUC", "Time"]),
                &records
                    .iter()
                    .map(|r| {
                        vec![
                            r.model.clone(),
                            r.best_params.clone(),
                            r.roc_auc.to_string(),
                            r.time.to_string(),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )?;
        }
        Commands::Thresholds { data, target } => {
            let (frame, y) = load_dataset(&data, &target)?;
            let models = default_roster(config.seed);
            let thresholds = default_thresholds();
            let curves =
                evaluate_discrimination_thresholds(&models, &frame, &y, &thresholds, config)?;
            for curve in curves {
                let (max_f1_at, _) = curve.max_f1().unwrap_or((0.5, 0.0));
                let plot = threshold_plot(
                    &curve.thresholds,
                    &curve.f1,
                    &curve.precision,
                    &curve.recall,
                    &curve.g_mean,
                    curve.optimal_threshold().unwrap_or(0.5),
                    max_f1_at,
                );
                print_chart(
                    &mut out,
                    &format!("Discrimination thresholds for {}", curve.model),
                    &plot,
                )?;
            }
        }
        Commands::Summarize { dir } => {
            let rows = load_results_from_folder(&dir)?;
            let summary = summarize_results(&rows);
            print_table(
                &mut out,
                "Experiment summary",
                &cols(&[
                    "Model", "Count", "Max", "Mean", "Min", "Mean_Time", "Min_Time", "Max_Time",
                ]),
                &summary
                    .iter()
                    .map(|r| {
                        vec![
                            r.model.clone(),
                            r.count.to_string(),
                            r.max_score.to_string(),
                            r.mean_score.to_string(),
                            r.min_score.to_string(),
                            r.mean_time.to_string(),
                            r.min_time.to_string(),
                            r.max_time.to_string(),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )?;
        }
    }
    Ok(())
}

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

/// Read the loan table and split off the numeric 0/1 target column.
fn load_dataset(path: &PathBuf, target: &str) -> Result<(Frame, Vec<f64>)> {
    let frame = loanlab_io::read_frame(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let (features, label_column) = frame.split_off_column(target)?;
    let y = match label_column {
        Column::Numeric(values) => values,
        Column::Categorical(_) => {
            bail!("target column '{target}' must be numeric 0/1 labels")
        }
    };
    if y.iter().any(|v| *v != 0.0 && *v != 1.0) {
        bail!("target column '{target}' holds values other than 0 and 1");
    }
    Ok((features, y))
}

fn forest_grid() -> ParamGrid {
    ParamGrid::new()
        .with(
            "n_estimators",
            vec![ParamValue::Int(100), ParamValue::Int(200), ParamValue::Int(400)],
        )
        .with(
            "max_features",
            vec![ParamValue::Str("sqrt".into()), ParamValue::Str("all".into())],
        )
        .with(
            "min_samples_leaf",
            vec![ParamValue::Int(1), ParamValue::Int(5), ParamValue::Int(10)],
        )
        .with(
            "class_weight",
            vec![
                ParamValue::Str("balanced".into()),
                ParamValue::Str("none".into()),
            ],
        )
}

/// Default search space per roster model.
fn roster_grid(model: &str) -> ParamGrid {
    match model {
        "LogisticRegression" => ParamGrid::new()
            .with(
                "learning_rate",
                vec![
                    ParamValue::Float(0.01),
                    ParamValue::Float(0.05),
                    ParamValue::Float(0.1),
                    ParamValue::Float(0.5),
                ],
            )
            .with(
                "max_iter",
                vec![ParamValue::Int(200), ParamValue::Int(500), ParamValue::Int(1000)],
            )
            .with(
                "l2",
                vec![
                    ParamValue::Float(0.0),
                    ParamValue::Float(0.001),
                    ParamValue::Float(0.01),
                ],
            ),
        "RandomForestClassifier" => forest_grid().with(
            "max_samples",
            vec![
                ParamValue::Float(0.5),
                ParamValue::Float(0.8),
                ParamValue::Float(1.0),
            ],
        ),
        "GradientBoostingClassifier" => ParamGrid::new()
            .with(
                "n_estimators",
                vec![ParamValue::Int(50), ParamValue::Int(100), ParamValue::Int(200)],
            )
            .with(
                "learning_rate",
                vec![
                    ParamValue::Float(0.05),
                    ParamValue::Float(0.1),
                    ParamValue::Float(0.2),
                ],
            )
            .with(
                "max_depth",
                vec![ParamValue::Int(2), ParamValue::Int(3), ParamValue::Int(4)],
            ),
        // The bagging variants share tree-count and depth knobs
        _ => ParamGrid::new()
            .with(
                "n_estimators",
                vec![ParamValue::Int(10), ParamValue::Int(20), ParamValue::Int(50)],
            )
            .with(
                "max_depth",
                vec![ParamValue::Int(8), ParamValue::Int(16), ParamValue::Int(24)],
            )
            .with(
                "min_samples_leaf",
                vec![ParamValue::Int(1), ParamValue::Int(3), ParamValue::Int(5)],
            ),
    }
}
