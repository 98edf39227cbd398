// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, info, warn};
use std::io::Write;
use std::path::{Path, PathBuf};

use video2srt::app_config::{Config, LogLevel, TranslationMode};
use video2srt::language_utils::{AUTO_LANGUAGE, language_display_name, validate_language_code};
use video2srt::{TimedSegment, TranslatorManager};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

/// CLI Wrapper for TranslationMode to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliTranslationMode {
    #[value(alias = "per_segment")]
    PerSegment,
    Block,
}

impl From<CliTranslationMode> for TranslationMode {
    fn from(cli_mode: CliTranslationMode) -> Self {
        match cli_mode {
            CliTranslationMode::PerSegment => TranslationMode::PerSegment,
            CliTranslationMode::Block => TranslationMode::Block,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a JSON list of timed segments
    Translate(TranslateArgs),

    /// Print translator health and configuration problems
    Check {
        /// Configuration file path
        #[arg(short, long)]
        config_path: Option<PathBuf>,
    },

    /// Generate shell completions for video2srt
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// JSON file holding an array of `{start, end, text}` segments
    #[arg(value_name = "SEGMENTS")]
    input_path: PathBuf,

    /// Target language code (e.g., 'en', 'es', 'zh')
    #[arg(short, long)]
    target_language: String,

    /// Source language code, or 'auto'
    #[arg(short, long, default_value = AUTO_LANGUAGE)]
    source_language: String,

    /// Translator tried first (e.g., 'google', 'openai', 'ollama')
    #[arg(short, long)]
    preferred: Option<String>,

    /// Configuration file path
    #[arg(short, long)]
    config_path: Option<PathBuf>,

    /// Output file; the result is printed to stdout when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Translation strategy
    #[arg(short, long, value_enum)]
    mode: Option<CliTranslationMode>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// video2srt - translation of timed speech segments
///
/// Translates the segments produced by a speech recognizer into another
/// language while keeping their timing, using a prioritized list of
/// translation providers with retry and fallback.
#[derive(Parser, Debug)]
#[command(name = "video2srt")]
#[command(version)]
#[command(about = "Translate timed speech segments with provider fallback")]
#[command(long_about = "video2srt translates timed speech segments and keeps their timing.

EXAMPLES:
    video2srt translate segments.json -t zh                # Translate to Chinese
    video2srt translate segments.json -t fr -p openai      # Try OpenAI first
    video2srt translate segments.json -t de -m per-segment # One call per segment
    video2srt check -c conf.json                           # Show translator health
    video2srt completions bash > video2srt.bash            # Generate bash completions

CONFIGURATION:
    The configuration is read from --config, then from ./conf.json, then from
    the per-user configuration directory. Built-in defaults are used when none
    of them exists.

SUPPORTED TRANSLATORS:
    google      - Google web translation endpoint (no key required)
    baidu       - Baidu general translation API (requires app_id and secret_key)
    openai      - OpenAI-compatible chat API (requires API key)
    ollama      - Local Ollama server (default: http://localhost:11434)
    simple      - Offline placeholder that tags text with the target language
    passthrough - Returns the text unchanged")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "\x1B[{}m{} {} {}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Trace is the ceiling; the effective level is set once the config is known
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "video2srt", &mut std::io::stdout());
            Ok(())
        }
        Commands::Check { config_path } => run_check(config_path.as_deref()),
        Commands::Translate(args) => run_translate(args).await,
    }
}

/// Default configuration file in the working directory
const LOCAL_CONFIG: &str = "conf.json";

/// Load the configuration from `explicit`, `./conf.json`, the per-user location, or defaults
fn load_config(explicit: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::from_file(path);
    }

    if Path::new(LOCAL_CONFIG).exists() {
        return Config::from_file(LOCAL_CONFIG);
    }

    match Config::default_path() {
        Some(path) if path.exists() => {
            debug!("Using configuration from {}", path.display());
            Config::from_file(&path)
        }
        _ => {
            debug!("No configuration file found, using defaults");
            Ok(Config::default())
        }
    }
}

fn run_check(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    log::set_max_level(config.log_level.to_level_filter());
    config.validate()?;

    let manager = TranslatorManager::from_config(&config);
    let stats = manager.translator_stats();
    println!("{}", serde_json::to_string_pretty(&stats).context("Failed to serialize translator stats")?);

    if manager.available_translators().is_empty() {
        return Err(anyhow!("No translator is available with this configuration"));
    }
    Ok(())
}

async fn run_translate(options: TranslateArgs) -> Result<()> {
    let mut config = load_config(options.config_path.as_deref())?;

    if let Some(level) = options.log_level {
        config.log_level = level.into();
    }
    if let Some(mode) = options.mode {
        config.translation.mode = mode.into();
    }
    log::set_max_level(config.log_level.to_level_filter());
    config.validate()?;

    validate_language_code(&options.target_language, false)?;
    validate_language_code(&options.source_language, true)?;

    let content = std::fs::read_to_string(&options.input_path)
        .with_context(|| format!("Failed to read segments: {}", options.input_path.display()))?;
    let segments: Vec<TimedSegment> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse segments: {}", options.input_path.display()))?;

    for (index, segment) in segments.iter().enumerate() {
        if let Err(e) = segment.validate() {
            warn!("Segment {} is invalid: {}", index + 1, e);
        }
    }

    info!(
        "Translating {} segments from {} to {} ({} mode)",
        segments.len(),
        language_display_name(&options.source_language),
        language_display_name(&options.target_language),
        config.translation.mode
    );

    let mut manager = TranslatorManager::from_config(&config);
    let result = manager
        .translate_with_retry(
            &segments,
            &options.target_language,
            &options.source_language,
            options.preferred.as_deref(),
        )
        .await?;

    info!("Translated {} segments with '{}'", result.len(), result.translator_name);
    for (name, stats) in manager.translator_stats() {
        if stats.total_requests > 0 {
            debug!(
                "{}: {} requests, {:.0}% success, {:.2}s average",
                name,
                stats.total_requests,
                stats.success_rate * 100.0,
                stats.avg_response_time
            );
        }
    }

    let json = serde_json::to_string_pretty(&result).context("Failed to serialize translation result")?;
    match &options.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write output file: {}", path.display()))?,
        None => println!("{}", json),
    }

    Ok(())
}
