use std::path::{Path, PathBuf};

use bela_cli::bootstrap::{self, RuntimeConfig};
use bela_cli::commands;
use bela_cli::config::AppConfig;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bela", about = "BELA transcript linker and validator")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to the configuration file. Built-in defaults apply when omitted.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Validate configuration file and exit.
    ValidateConfig,
    /// Link a JSON tier document and print its diagnostics report.
    Check {
        document: PathBuf,
        /// Exit with an error when the report contains errors.
        #[arg(long)]
        strict: bool,
    },
    /// Print the language-mix timeline of a document.
    Mix {
        document: PathBuf,
        /// Ignore chunks starting after this time (milliseconds).
        #[arg(long)]
        to_ms: Option<u64>,
    },
    /// Print the cross-speaker turns of a document.
    Turns {
        document: PathBuf,
        /// Overrides `[turns] threshold_ms`.
        #[arg(long)]
        threshold_ms: Option<u64>,
    },
    /// Tokenize one piece of transcript text.
    Tokenize {
        text: String,
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Summarize a tab-separated row transcript.
    Rows {
        file: PathBuf,
        #[arg(long)]
        to_ms: Option<u64>,
        /// Language assigned to utterances without an overlapping tag.
        #[arg(long, default_value = "")]
        default_language: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let runtime = load_runtime(cli.config.as_deref())?;
    init_tracing(&runtime.log_level, &runtime.log_format)?;

    let output = match cli.command {
        Command::ValidateConfig => {
            let source = cli
                .config
                .as_deref()
                .map_or_else(|| "<defaults>".to_owned(), |p| p.display().to_string());
            println!("Config valid: {source}");
            return Ok(());
        }
        Command::Check { document, strict } => {
            let report = commands::check(&runtime, &document)?;
            let errors = report["errors"].as_array().map_or(0, Vec::len);
            print_json(&report)?;
            anyhow::ensure!(!strict || errors == 0, "{errors} error(s) found in {}", document.display());
            return Ok(());
        }
        Command::Mix { document, to_ms } => commands::mix(&runtime, &document, to_ms)?,
        Command::Turns {
            document,
            threshold_ms,
        } => commands::turns(&runtime, &document, threshold_ms)?,
        Command::Tokenize { text, language } => {
            commands::tokenize(&runtime, &text, language.as_deref())?
        }
        Command::Rows {
            file,
            to_ms,
            default_language,
        } => commands::rows(&file, to_ms, &default_language)?,
    };
    print_json(&output)
}

fn load_runtime(path: Option<&Path>) -> anyhow::Result<RuntimeConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)
            .map_err(|e| anyhow::anyhow!("Error reading config {}: {e}", path.display()))?,
        None => AppConfig::default(),
    };
    bootstrap::into_runtime(config).map_err(|e| anyhow::anyhow!("Config invalid: {e:#}"))
}

fn init_tracing(level: &str, format: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("BELA_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let result = match format {
        "json" => builder.json().try_init(),
        _ => builder.try_init(),
    };
    result.map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), value)?;
    println!();
    Ok(())
}
