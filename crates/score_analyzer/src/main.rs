//! Credit Scoring Analyzer CLI
//!
//! Offline steps run after a model has been trained: score calibration,
//! feature impact analysis and front-end defaults generation.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use credit_score_analyzer::questionnaire::Questionnaire;
use credit_score_analyzer::{
    analyze_features, build_questions, calibrate, load_predictor, optimize_defaults, sensitivity,
    Dataset, FrontendBundle, LabelSet, DEFAULT_TOP_FEATURES,
};
use credit_score_core::{
    load_feature_mapping, save_feature_mapping, ScoringMetadata, ScoringParams, StandardScaler,
};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "score-analyzer")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline calibration and questionnaire generation for the credit scoring model", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fit the standardization parameters on the dataset
    FitScaler {
        /// Input CSV dataset path (ID_code,target,var_0..var_199)
        #[arg(short, long)]
        data: PathBuf,

        /// Output scaler path
        #[arg(short, long, default_value = "models/scaler.json")]
        output: PathBuf,
    },

    /// Fit the probability→score bounds and write the scoring metadata
    Calibrate {
        #[command(flatten)]
        inputs: Inputs,

        /// Output metadata path
        #[arg(short, long, default_value = "models/model_metadata.json")]
        output: PathBuf,
    },

    /// Measure per-feature score impact and build the questionnaire
    Analyze {
        #[command(flatten)]
        inputs: Inputs,

        /// Scoring metadata providing the score bounds
        #[arg(long, default_value = "models/model_metadata.json")]
        metadata: PathBuf,

        /// Number of features to analyse
        #[arg(long, default_value_t = DEFAULT_TOP_FEATURES)]
        top: usize,

        /// Optional question labels (JSON keyed by var_N)
        #[arg(long)]
        labels: Option<PathBuf>,

        /// Output feature mapping path
        #[arg(short, long, default_value = "models/feature_mapping.json")]
        output: PathBuf,

        /// Output questionnaire path
        #[arg(long, default_value = "models/questionnaire.json")]
        questionnaire: PathBuf,
    },

    /// Generate the front-end default profile and question list
    Defaults {
        #[command(flatten)]
        inputs: Inputs,

        #[arg(long, default_value = "models/model_metadata.json")]
        metadata: PathBuf,

        /// Feature mapping written by `analyze`
        #[arg(long, default_value = "models/feature_mapping.json")]
        mapping: PathBuf,

        #[arg(long)]
        labels: Option<PathBuf>,

        /// TypeScript output path
        #[arg(long, default_value = "generated-defaults.ts")]
        ts_output: PathBuf,

        /// Optional JSON output path
        #[arg(long)]
        json_output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct Inputs {
    /// Input CSV dataset path (ID_code,target,var_0..var_199)
    #[arg(short, long)]
    data: PathBuf,

    /// Trained model path
    #[arg(short, long, default_value = "models/model.json")]
    model: PathBuf,

    /// Fitted scaler path
    #[arg(short, long, default_value = "models/scaler.json")]
    scaler: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Credit Scoring Analyzer v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::FitScaler { data, output } => run_fit_scaler(&data, &output),
        Command::Calibrate { inputs, output } => run_calibrate(&inputs, &output),
        Command::Analyze {
            inputs,
            metadata,
            top,
            labels,
            output,
            questionnaire,
        } => run_analyze(&inputs, &metadata, top, labels.as_deref(), &output, &questionnaire),
        Command::Defaults {
            inputs,
            metadata,
            mapping,
            labels,
            ts_output,
            json_output,
        } => run_defaults(
            &inputs,
            &metadata,
            &mapping,
            labels.as_deref(),
            &ts_output,
            json_output.as_deref(),
        ),
    }
}

fn load_dataset(path: &Path) -> Result<Dataset> {
    info!("Loading dataset from: {}", path.display());
    let dataset = Dataset::from_csv(path).context("Failed to load dataset")?;
    info!(
        "Loaded {} samples ({} accepted, {} rejected)",
        dataset.len(),
        dataset.accepted().len(),
        dataset.rejected().len()
    );
    Ok(dataset)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

fn load_scoring(path: &Path) -> Result<ScoringMetadata> {
    if path.exists() {
        ScoringMetadata::load_json(path)
            .with_context(|| format!("Failed to read scoring metadata {}", path.display()))
    } else {
        warn!(
            "Scoring metadata {} not found; using reference score bounds",
            path.display()
        );
        Ok(ScoringMetadata::new("unknown", ScoringParams::default()))
    }
}

fn load_labels(path: Option<&Path>) -> Result<LabelSet> {
    match path {
        Some(path) => {
            let labels = LabelSet::load_json(path)
                .with_context(|| format!("Failed to read labels {}", path.display()))?;
            info!("Loaded {} question labels", labels.len());
            Ok(labels)
        }
        None => Ok(LabelSet::default()),
    }
}

fn run_fit_scaler(data: &Path, output: &Path) -> Result<()> {
    let dataset = load_dataset(data)?;
    let scaler = StandardScaler::fit(&dataset.features).context("Failed to fit scaler")?;
    ensure_parent(output)?;
    scaler
        .save_json(output)
        .context("Failed to write scaler file")?;
    info!("✓ Scaler saved to {}", output.display());
    Ok(())
}

fn run_calibrate(inputs: &Inputs, output: &Path) -> Result<()> {
    let dataset = load_dataset(&inputs.data)?;
    let predictor =
        load_predictor(&inputs.model, &inputs.scaler).context("Failed to load model")?;

    let calibration = calibrate(&predictor, &dataset).context("Calibration failed")?;
    if let Some(distribution) = &calibration.metadata.score_distribution {
        info!("Score distribution:");
        info!("  Accepted median: {:.1}/100", distribution.accepted_median);
        info!("  Rejected median: {:.1}/100", distribution.rejected_median);
        info!(
            "  Accepted P25/P75: {:.1} / {:.1}",
            distribution.accepted_p25, distribution.accepted_p75
        );
    }

    ensure_parent(output)?;
    calibration
        .metadata
        .save_json(output)
        .context("Failed to write scoring metadata")?;
    info!("✓ Scoring metadata saved to {}", output.display());
    Ok(())
}

fn run_analyze(
    inputs: &Inputs,
    metadata: &Path,
    top: usize,
    labels: Option<&Path>,
    output: &Path,
    questionnaire_path: &Path,
) -> Result<()> {
    let dataset = load_dataset(&inputs.data)?;
    let predictor =
        load_predictor(&inputs.model, &inputs.scaler).context("Failed to load model")?;
    let scoring = load_scoring(metadata)?.scoring_params();
    let labels = load_labels(labels)?;

    let records = analyze_features(&predictor, &dataset, scoring, top)
        .context("Feature analysis failed")?;

    info!("Feature      | Impact (pts) | Direction | Optimal value");
    for record in records.iter().take(10) {
        info!(
            "{:12} | {:12.1} | {:9} | {:.2}",
            record.feature,
            record.impact_points,
            record.direction.as_str(),
            record.optimal_value
        );
    }

    ensure_parent(output)?;
    save_feature_mapping(output, &records).context("Failed to write feature mapping")?;
    info!("✓ Feature mapping saved to {}", output.display());

    let questions = build_questions(&records, &labels);
    let questionnaire = Questionnaire::group(questions, |index| {
        dataset.describe(index).map_or(0.0, |summary| summary.std)
    });
    ensure_parent(questionnaire_path)?;
    questionnaire
        .save_json(questionnaire_path)
        .context("Failed to write questionnaire")?;
    info!(
        "✓ Questionnaire saved to {} ({} demographic, {} financial, {} history)",
        questionnaire_path.display(),
        questionnaire.demographic.len(),
        questionnaire.financial.len(),
        questionnaire.history.len()
    );
    Ok(())
}

fn run_defaults(
    inputs: &Inputs,
    metadata: &Path,
    mapping: &Path,
    labels: Option<&Path>,
    ts_output: &Path,
    json_output: Option<&Path>,
) -> Result<()> {
    let dataset = load_dataset(&inputs.data)?;
    let predictor =
        load_predictor(&inputs.model, &inputs.scaler).context("Failed to load model")?;
    let metadata = load_scoring(metadata)?;
    let scoring = metadata.scoring_params();
    let records = load_feature_mapping(mapping)
        .with_context(|| format!("Failed to read feature mapping {}", mapping.display()))?;
    let labels = load_labels(labels)?;

    let profile = optimize_defaults(
        &predictor,
        &dataset,
        &records,
        scoring,
        metadata.recommended_thresholds,
    )
    .context("Default profile optimisation failed")?;

    let report = sensitivity(&predictor, scoring, &profile.features, &records)
        .context("Sensitivity check failed")?;
    info!("Default profile score: {:.1}/100", report.default_score);
    info!(
        "  With top features degraded: {:.1}/100 ({:+.1})",
        report.degraded_score,
        report.degraded_score - report.default_score
    );
    info!(
        "  With top features improved: {:.1}/100 ({:+.1})",
        report.improved_score,
        report.improved_score - report.default_score
    );

    let bundle = FrontendBundle::new(
        scoring,
        metadata.recommended_thresholds,
        profile.features,
        profile.result.score,
        build_questions(&records, &labels),
    );

    ensure_parent(ts_output)?;
    bundle
        .write_typescript(ts_output)
        .context("Failed to write TypeScript defaults")?;
    info!("✓ TypeScript defaults saved to {}", ts_output.display());

    if let Some(json_output) = json_output {
        ensure_parent(json_output)?;
        bundle
            .write_json(json_output)
            .context("Failed to write JSON defaults")?;
        info!("✓ JSON defaults saved to {}", json_output.display());
    }
    Ok(())
}
