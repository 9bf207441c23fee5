// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};

use redub::app_config::{self, Config};
use redub::{Controller, RunMode};

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Dub every subtitle/video pair of a folder (default command)
    Dub(DubArgs),

    /// Generate shell completions for redub
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Clone)]
struct DubArgs {
    /// Folder with translated subtitles next to their videos
    #[arg(short, long, value_name = "FOLDER")]
    input: PathBuf,

    /// Folder receiving the dubbed videos
    #[arg(short, long, value_name = "FOLDER")]
    output: PathBuf,

    /// Dub language code (e.g., 'est', 'et')
    #[arg(short, long)]
    language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Stop once the composite audio track is written
    #[arg(long, conflicts_with = "mux_only")]
    audio_only: bool,

    /// Only mux previously generated audio tracks
    #[arg(long)]
    mux_only: bool,
}

impl DubArgs {
    fn run_mode(&self) -> RunMode {
        if self.audio_only {
            RunMode::AudioOnly
        } else if self.mux_only {
            RunMode::MuxOnly
        } else {
            RunMode::Full
        }
    }
}

/// redub - text-to-speech re-dubbing of videos from translated subtitles
#[derive(Parser, Debug)]
#[command(name = "redub")]
#[command(version = "0.1.0")]
#[command(about = "Re-dub videos with synthesized speech from translated subtitles")]
#[command(long_about = "redub speaks every cue of translated subtitles with a text-to-speech voice, \
aligns the speech to the video and mixes it over the original audio.

EXAMPLES:
    redub -i /movies -o /dubbed                  # Dub a folder with the default config
    redub -i /movies -o /dubbed -l est           # Dub into Estonian
    redub -i /movies -o /dubbed --audio-only     # Only produce the mixed audio tracks
    redub -i /movies -o /dubbed --mux-only       # Mux previously produced audio tracks
    redub completions bash > redub.bash          # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. If the config file doesn't
    exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Folder with translated subtitles next to their videos
    #[arg(short, long, value_name = "FOLDER")]
    input: Option<PathBuf>,

    /// Folder receiving the dubbed videos
    #[arg(short, long, value_name = "FOLDER")]
    output: Option<PathBuf>,

    /// Dub language code (e.g., 'est', 'et')
    #[arg(short, long)]
    language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Stop once the composite audio track is written
    #[arg(long, conflicts_with = "mux_only")]
    audio_only: bool,

    /// Only mux previously generated audio tracks
    #[arg(long)]
    mux_only: bool,
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
        log::set_boxed_logger(Box::new(CustomLogger::new(LevelFilter::Trace)))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI colour for a log level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌", "1;31"),
            Level::Warn => ("🚧", "1;33"),
            Level::Info => ("🎙️", "1;32"),
            Level::Debug => ("🔍", "1;36"),
            Level::Trace => ("📋", "1;35"),
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
            let (emoji, colour) = Self::decoration(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                colour, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Info until the config or the command line says otherwise
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "redub", &mut std::io::stdout());
            Ok(())
        }
        Some(Commands::Dub(args)) => run_dub(args).await,
        None => {
            // Top-level arguments behave like the dub subcommand
            let (input, output) = cli.input.zip(cli.output).ok_or_else(|| {
                anyhow!("--input and --output are required when no subcommand is specified")
            })?;

            let args = DubArgs {
                input,
                output,
                language: cli.language,
                config_path: cli.config_path,
                log_level: cli.log_level,
                audio_only: cli.audio_only,
                mux_only: cli.mux_only,
            };
            run_dub(args).await
        }
    }
}

async fn run_dub(options: DubArgs) -> Result<()> {
    if let Some(cmd_log_level) = &options.log_level {
        let level: app_config::LogLevel = cmd_log_level.clone().into();
        log::set_max_level(level.to_level_filter());
    }

    let config = load_config(&options)?;
    config.validate().context("Configuration validation failed")?;

    if options.log_level.is_none() {
        log::set_max_level(config.log_level.to_level_filter());
    }

    if !options.input.is_dir() {
        return Err(anyhow!("Input folder does not exist: {:?}", options.input));
    }

    let language_name = redub::get_language_name(&config.target_language).unwrap_or_default();
    info!("Dubbing {:?} into {} ({})", options.input, language_name, config.target_language);

    let controller = Controller::with_config(config)?;
    let summary = controller
        .run_folder(&options.input, &options.output, options.run_mode())
        .await?;

    if summary.failed > 0 {
        warn!("{} item(s) failed, see {:?}", summary.failed, options.output.join(redub::app_controller::ISSUES_LOG_FILE));
    }

    Ok(())
}

/// Load the config file, creating a default one when missing, then apply CLI overrides
fn load_config(options: &DubArgs) -> Result<Config> {
    let config_path = &options.config_path;
    let mut config = if Path::new(config_path).exists() {
        let file = File::open(config_path)
            .with_context(|| format!("Failed to open config file: {}", config_path))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", config_path))?
    } else {
        warn!("Config file not found at '{}', creating default config.", config_path);

        let config = Config::default();
        let config_json = serde_json::to_string_pretty(&config)
            .context("Failed to serialize default config to JSON")?;
        std::fs::write(config_path, config_json)
            .with_context(|| format!("Failed to write default config to file: {}", config_path))?;
        config
    };

    if let Some(language) = &options.language {
        config.target_language = language.clone();
    }

    if let Some(log_level) = &options.log_level {
        config.log_level = log_level.clone().into();
    }

    Ok(config)
}
