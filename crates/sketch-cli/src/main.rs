use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use rhai::Engine;
use sketch_core::scripting::{register_rhai_api, run_script};
use sketch_core::{share, MemoryHost, SessionConfig};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the Rhai sketch
    #[arg(value_name = "SCRIPT")]
    script: PathBuf,

    /// JSON file with the composition settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Composition name
    #[arg(long)]
    name: Option<String>,

    /// Composition width
    #[arg(long)]
    width: Option<f64>,

    /// Composition height
    #[arg(long)]
    height: Option<f64>,

    /// Duration in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Frame rate
    #[arg(long)]
    fps: Option<f64>,

    /// Write the JSON summary here instead of stdout
    #[arg(long, value_name = "FILE")]
    summary: Option<PathBuf>,

    /// Log level
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_logging(level: LogLevel, format: LogFormat) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.to_string().parse()?)
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }
    Ok(())
}

/// Reads the config file, if any, and applies the command-line overrides.
fn load_config(cli: &Cli) -> Result<SessionConfig> {
    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => SessionConfig::default(),
    };
    if let Some(name) = &cli.name {
        config.name = name.clone();
    } else if cli.config.is_none() {
        if let Some(stem) = cli.script.file_stem() {
            config.name = stem.to_string_lossy().into_owned();
        }
    }
    if let Some(width) = cli.width {
        config.width = width;
    }
    if let Some(height) = cli.height {
        config.height = height;
    }
    if let Some(duration) = cli.duration {
        config.duration = duration;
    }
    if let Some(fps) = cli.fps {
        config.frame_rate = fps;
    }
    Ok(config)
}

fn read_config(path: &Path) -> Result<SessionConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    info!("Script: {:?}", cli.script);
    info!(
        width = config.width,
        height = config.height,
        frames = config.total_frames(),
        "Composition '{}'",
        config.name
    );

    let script = fs::read_to_string(&cli.script)
        .with_context(|| format!("reading script {}", cli.script.display()))?;

    let mut engine = Engine::new();
    register_rhai_api(&mut engine);

    let handle = run_script(&engine, &script, share(MemoryHost::default()), config)?;
    let summary = handle
        .lock()
        .map_err(|e| anyhow!("{}", e))?
        .summary()?;
    let json = serde_json::to_string_pretty(&summary)?;

    match &cli.summary {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
            info!("Summary written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_level, cli.log_format) {
        eprintln!("Failed to initialise logging: {}", e);
        std::process::exit(1);
    }

    info!("Initializing sketch...");
    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("sketch").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_take_the_script_name() {
        let config = load_config(&cli(&["waves.rhai"])).unwrap();
        assert_eq!(config.name, "waves");
        assert_eq!(config.width, 1920.0);
        assert_eq!(config.frame_rate, 24.0);
    }

    #[test]
    fn config_file_with_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"name": "intro", "width": 640, "height": 360, "duration": 2}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let config = load_config(&cli(&["a.rhai", "--config", &path, "--fps", "12"])).unwrap();
        assert_eq!(config.name, "intro");
        assert_eq!(config.width, 640.0);
        assert_eq!(config.total_frames(), 24);

        let config = load_config(&cli(&["a.rhai", "--config", &path, "--name", "x"])).unwrap();
        assert_eq!(config.name, "x");
    }

    #[test]
    fn malformed_config_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let path = file.path().to_str().unwrap().to_string();
        let err = load_config(&cli(&["a.rhai", "--config", &path])).unwrap_err();
        assert!(err.to_string().contains("parsing config"));
    }

    #[test]
    fn runs_a_script_and_writes_the_summary() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("dots.rhai");
        fs::write(&script, "fn setup(b) { b.ellipse(10, 10, 5, 5); }").unwrap();
        let out = dir.path().join("summary.json");

        let args = cli(&[
            script.to_str().unwrap(),
            "--duration",
            "0.5",
            "--summary",
            out.to_str().unwrap(),
        ]);
        run(&args).unwrap();

        let summary: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(summary["composition"]["name"], "dots");
        assert_eq!(summary["layers"].as_array().unwrap().len(), 1);
    }
}
