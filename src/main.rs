// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{warn, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use crate::app_config::Config;
use crate::pipeline::CancelSignal;
use app_controller::Controller;

mod app_config;
mod app_controller;
mod chunk;
mod errors;
mod file_utils;
mod media_loader;
mod pipeline;
mod subtitle_track;
mod transcoder;
mod transcription_service;

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Slice a video per chunk and burn each chunk's subtitles (default command)
    Run(RunArgs),

    /// Slice a video per chunk without burning subtitles
    Slice(RunArgs),

    /// Transcribe an audio file into a chunk JSON document
    Transcribe(TranscribeArgs),

    /// Generate shell completions for clipcue
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Input video file
    #[arg(value_name = "VIDEO_PATH")]
    video_path: PathBuf,

    /// Chunk JSON document describing time ranges and segments
    #[arg(value_name = "CHUNKS_PATH")]
    chunks_path: PathBuf,

    /// Load the video into memory and pipe it to the engine's stdin
    /// instead of handing over the file path
    #[arg(long)]
    pipe: bool,

    /// Write the ordered artifact list as a JSON manifest
    #[arg(long, value_name = "MANIFEST_PATH")]
    manifest: Option<PathBuf>,

    /// Directory for sliced and subtitled clips
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of chunks transcoded at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

#[derive(Parser, Debug)]
struct TranscribeArgs {
    /// Input audio file
    #[arg(value_name = "AUDIO_PATH")]
    audio_path: PathBuf,

    /// Where to write the chunk JSON document (stdout when absent)
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// ISO 639-1 language hint for the recognizer
    #[arg(long)]
    language: Option<String>,

    /// Model identifier passed to the transcription service
    #[arg(short, long)]
    model: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// clipcue - chunk-based video segmentation and subtitle overlay
#[derive(Parser, Debug)]
#[command(name = "clipcue")]
#[command(version = "0.1.0")]
#[command(about = "Slices videos per transcription chunk and burns subtitles onto each clip")]
#[command(long_about = "clipcue cuts a source video into one clip per transcription chunk, \
renders each chunk's segments into an SRT track, and burns that track onto the clip with ffmpeg.

EXAMPLES:
    clipcue movie.mp4 chunks.json                # Slice and burn using default config
    clipcue run --pipe movie.mp4 chunks.json     # Pipe the video bytes to ffmpeg's stdin
    clipcue slice movie.mp4 chunks.json          # Slice only, no subtitle burn
    clipcue transcribe speech.mp3 -o chunks.json # Build chunks from an audio file
    clipcue run --manifest out.json movie.mp4 chunks.json
    clipcue completions bash > clipcue.bash      # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default
    one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input video file
    #[arg(value_name = "VIDEO_PATH")]
    video_path: Option<PathBuf>,

    /// Chunk JSON document describing time ranges and segments
    #[arg(value_name = "CHUNKS_PATH")]
    chunks_path: Option<PathBuf>,

    /// Load the video into memory and pipe it to the engine's stdin
    #[arg(long)]
    pipe: bool,

    /// Write the ordered artifact list as a JSON manifest
    #[arg(long, value_name = "MANIFEST_PATH")]
    manifest: Option<PathBuf>,

    /// Directory for sliced and subtitled clips
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Number of chunks transcoded at the same time
    #[arg(long)]
    concurrency: Option<usize>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
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
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");

            let color = match record.level() {
                Level::Error => "\x1B[1;31m",
                Level::Warn => "\x1B[1;33m",
                Level::Info => "\x1B[1;32m",
                Level::Debug => "\x1B[1;36m",
                Level::Trace => "\x1B[1;35m",
            };

            let mut stderr = std::io::stderr();
            let _ = writeln!(stderr, "{}{} {}\x1B[0m", color, now, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger once with info level by default;
    // the level is updated after loading the config if needed
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "clipcue", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Run(args)) => run_pipeline(args, false).await,
        Some(Commands::Slice(args)) => run_pipeline(args, true).await,
        Some(Commands::Transcribe(args)) => run_transcribe(args).await,
        None => {
            // Default behavior - treat top-level args as the run command
            let video_path = cli
                .video_path
                .ok_or_else(|| anyhow!("VIDEO_PATH is required when no subcommand is specified"))?;
            let chunks_path = cli
                .chunks_path
                .ok_or_else(|| anyhow!("CHUNKS_PATH is required when no subcommand is specified"))?;

            let run_args = RunArgs {
                video_path,
                chunks_path,
                pipe: cli.pipe,
                manifest: cli.manifest,
                output_dir: cli.output_dir,
                concurrency: cli.concurrency,
                config_path: cli.config_path,
                log_level: cli.log_level,
            };
            run_pipeline(run_args, false).await
        }
    }
}

/// Load `conf.json` (creating it with defaults when absent) and apply
/// the CLI's log level.
fn load_or_create_config(config_path: &str, log_level: &Option<CliLogLevel>) -> Result<Config> {
    if let Some(cmd_log_level) = log_level {
        log::set_max_level(level_filter(&cmd_log_level.clone().into()));
    }

    let mut config: Config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .context(format!("Failed to open config file: {}", config_path))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader)
            .context(format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!(
            "Config file not found at '{}', creating default config.",
            config_path
        );
        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json).context(format!(
            "Failed to write default config to file: {}",
            config_path
        ))?;
        config
    };

    if let Some(level) = log_level {
        config.log_level = level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(level_filter(&config.log_level));

    Ok(config)
}

/// Wire Ctrl-C to a cancellation signal shared with the pipelines
fn spawn_ctrl_c_handler(cancel: &CancelSignal) {
    let handle = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after in-flight chunk work");
            handle.cancel();
        }
    });
}

async fn run_pipeline(options: RunArgs, slice_only: bool) -> Result<()> {
    let mut config = load_or_create_config(&options.config_path, &options.log_level)?;

    // Override config with CLI options if provided
    if let Some(output_dir) = &options.output_dir {
        config.pipeline.output_dir = output_dir.clone();
        config.pipeline.subtitle_dir = output_dir.join("srt");
    }
    if let Some(concurrency) = options.concurrency {
        config.pipeline.concurrency = concurrency;
    }
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    let cancel = CancelSignal::new();
    spawn_ctrl_c_handler(&cancel);

    if slice_only {
        controller
            .run_slice(
                &options.video_path,
                &options.chunks_path,
                options.pipe,
                options.manifest.as_deref(),
                cancel,
            )
            .await?;
    } else {
        controller
            .run(
                &options.video_path,
                &options.chunks_path,
                options.pipe,
                options.manifest.as_deref(),
                cancel,
            )
            .await?;
    }

    Ok(())
}

async fn run_transcribe(options: TranscribeArgs) -> Result<()> {
    let mut config = load_or_create_config(&options.config_path, &options.log_level)?;

    if let Some(language) = &options.language {
        config.transcription.language = Some(language.clone());
    }
    if let Some(model) = &options.model {
        config.transcription.model = model.clone();
    }
    config.validate().context("Configuration validation failed")?;

    let controller = Controller::with_config(config)?;
    controller
        .run_transcribe(&options.audio_path, options.out.as_deref())
        .await?;

    Ok(())
}
