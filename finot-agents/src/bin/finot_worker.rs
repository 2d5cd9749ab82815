use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

use extractors::ocr::{OcrEngine, OcrPipeline, Preprocessor, TesseractCli};
use finot_agents::analysis::{AnalysisKind, AnalysisService};
use finot_agents::config::WorkerConfig;
use finot_agents::jobs::{spawn_process_message, ProcessMessageJob};
use finot_agents::llm::{ChatCompletion, OpenAiChatClient};
use finot_agents::pipeline::ExtractionPipeline;
use finot_agents::storage::{ReceiptRepository, SqliteStore};
use finot_agents::transcription::WhisperTranscriber;

#[derive(Parser, Debug)]
#[command(name = "finot-worker", about = "Extract transactions from text, receipts and voice notes")]
struct Cli {
    /// Config file (defaults to the per-user worker.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Also write daily-rolling logs into this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract transactions from a text message
    Text {
        #[arg(long)]
        user_id: i64,
        text: String,
        /// Classify first and only extract transaction-like messages
        #[arg(long)]
        route: bool,
    },
    /// Extract a transaction from a receipt photo
    Image {
        #[arg(long)]
        user_id: i64,
        path: PathBuf,
        /// Register the file as a receipt before processing
        #[arg(long)]
        store_receipt: bool,
    },
    /// Extract transactions from a voice note
    Audio {
        #[arg(long)]
        user_id: i64,
        path: PathBuf,
    },
    /// Classify the intent of a text message
    Classify { text: String },
    /// Run a process-message job from a JSON file ("-" for stdin)
    Job { path: PathBuf },
    /// Run an analysis over the user's stored transactions
    Analyze {
        #[arg(long)]
        user_id: i64,
        #[arg(value_enum)]
        kind: AnalyzeKind,
        /// Current balance for `predict` (computed from history when omitted)
        #[arg(long)]
        balance: Option<i64>,
        /// Free-text scenario for `simulate`
        #[arg(long)]
        scenario: Option<String>,
        /// Fixed daily cut in rupiah for `simulate`, instead of a scenario
        #[arg(long, conflicts_with = "scenario")]
        daily_cut: Option<i64>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AnalyzeKind {
    Insight,
    Saving,
    Health,
    Weekly,
    Monthly,
    Predict,
    Simulate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref())?;

    let (config, config_path) =
        WorkerConfig::load(cli.config.as_deref()).context("Failed to load worker config")?;
    tracing::info!("Loaded config from {}", config_path.display());

    let api_key = config
        .api_key()
        .with_context(|| format!("Missing API key in {}", config_path.display()))?
        .to_string();

    let db_path = config.database.resolved_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let store = Arc::new(
        SqliteStore::open(&db_path).with_context(|| format!("Failed to open db at {}", db_path.display()))?,
    );

    let llm: Arc<dyn ChatCompletion> = Arc::new(
        OpenAiChatClient::with_timeout(api_key.clone(), config.llm.timeout())?
            .base_url(config.llm.base_url.clone())
            .model(config.llm.model.clone())
            .max_completion_tokens(config.llm.max_completion_tokens)
            .retry_policy(config.llm.retry_policy()),
    );

    let transcriber = Arc::new(
        WhisperTranscriber::new(api_key, Duration::from_secs(config.transcription.timeout_secs))?
            .base_url(config.llm.base_url.clone())
            .model(config.transcription.model.clone())
            .language(config.transcription.language.clone())
            .retry_policy(config.llm.retry_policy()),
    );

    let recognizer = Arc::new(
        TesseractCli::new(config.ocr.tesseract.clone(), config.ocr.languages.clone())
            .with_timeout(config.ocr.timeout()),
    );
    let ocr = OcrPipeline::new(
        Preprocessor::new(config.ocr.target_height),
        OcrEngine::new(recognizer),
    );

    let pipeline = Arc::new(ExtractionPipeline::new(
        llm.clone(),
        store.clone(),
        ocr,
        transcriber,
    ));

    match cli.command {
        Command::Text {
            user_id,
            text,
            route,
        } => {
            if route {
                print_json(&pipeline.route_text_message(user_id, &text).await)
            } else {
                print_json(&pipeline.process_text_message(user_id, &text).await)
            }
        }
        Command::Image {
            user_id,
            path,
            store_receipt,
        } => {
            let receipt_id = if store_receipt {
                Some(
                    store
                        .create_receipt(user_id, &path.display().to_string())
                        .await
                        .context("Failed to register receipt")?,
                )
            } else {
                None
            };
            print_json(&pipeline.process_image_message(user_id, &path, receipt_id).await)
        }
        Command::Audio { user_id, path } => {
            print_json(&pipeline.process_audio_message(user_id, &path).await)
        }
        Command::Classify { text } => print_json(&pipeline.classify_intent(&text).await),
        Command::Job { path } => {
            let job = read_job(&path)?;
            let envelope = spawn_process_message(pipeline.clone(), job)
                .await
                .context("Job task failed")?;
            print_json(&envelope)
        }
        Command::Analyze {
            user_id,
            kind,
            balance,
            scenario,
            daily_cut,
        } => {
            let kind = match kind {
                AnalyzeKind::Insight => AnalysisKind::DailyInsight,
                AnalyzeKind::Saving => AnalysisKind::SavingRecommendation,
                AnalyzeKind::Health => AnalysisKind::FinancialHealth,
                AnalyzeKind::Weekly => AnalysisKind::WeeklyAnalysis,
                AnalyzeKind::Monthly => AnalysisKind::MonthlyAnalysis,
                AnalyzeKind::Predict => AnalysisKind::BalancePrediction {
                    current_balance: balance,
                },
                AnalyzeKind::Simulate => match daily_cut {
                    Some(daily_cut) => AnalysisKind::FixedCutSimulation { daily_cut },
                    None => AnalysisKind::SavingSimulation {
                        scenario: scenario.unwrap_or_default(),
                    },
                },
            };
            let report = AnalysisService::new(llm, store)
                .run(user_id, kind)
                .await
                .context("Analysis failed")?;
            print_json(&report)
        }
    }
}

fn read_job(path: &Path) -> Result<ProcessMessageJob> {
    let raw = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read job from stdin")?
    } else {
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?
    };
    serde_json::from_str(&raw).context("Invalid job JSON")
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "finot-worker.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .with_writer(non_blocking),
                )
                .try_init()?;
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(stderr_layer)
                .try_init()?;
            Ok(None)
        }
    }
}
