//! RenderForge worker - claims render jobs and runs them to a terminal
//! state.
//!
//! Usage:
//!   rf-worker poll               Poll the job store continuously
//!   rf-worker run <JOB.json>     Process one job description and exit
//!
//! Configuration lives in a TOML file (created with defaults on first
//! run); the store URL and service key can also come from RF_STORE_URL
//! and RF_SERVICE_KEY.

use std::fs;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use rf_core::config::{ConfigManager, EngineSettings, Settings};
use rf_core::engines::{
    EngineClient, Engines, FfmpegEncoder, HttpAvatarEngine, HttpLipSyncEngine, HttpVideoEngine,
    HttpVoiceEngine, NullAvatarEngine, NullEncoder, NullLipSyncEngine, NullVideoEngine,
    NullVoiceEngine, VoiceFallbackChain, VoiceSynthesizer,
};
use rf_core::models::JobDescription;
use rf_core::orchestrator::{JobLifecycle, PipelineExecutor, Worker};
use rf_core::store::{HttpJobStore, JobStore, MemoryJobStore};

#[derive(Parser)]
#[command(
    name = "rf-worker",
    about = "RenderForge render job worker",
    version
)]
struct Cli {
    /// Path to the TOML settings file
    #[arg(long, env = "RF_CONFIG", default_value = ".config/renderforge.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the job store continuously, one job at a time
    Poll,

    /// Process one job description and exit with its terminal result
    Run {
        /// Path to a JSON job description, or "-" for stdin
        job: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ConfigManager::new(&cli.config);
    config.load_or_create().context("loading configuration")?;
    config
        .ensure_dirs_exist()
        .context("creating configured directories")?;
    let settings = config.settings().clone();

    let _guard = init_tracing(&settings, cli.verbose);
    tracing::info!(
        version = rf_core::version(),
        config = %cli.config.display(),
        "rf-worker starting"
    );

    let engines = build_engines(&settings).context("constructing engine adapters")?;
    let executor = PipelineExecutor::new(engines);
    let poll_interval = Duration::from_secs(settings.store.poll_interval_secs);

    match cli.command {
        Commands::Poll => {
            let store: Arc<dyn JobStore> = Arc::new(
                HttpJobStore::from_settings(&settings.store)
                    .context("configuring job store client")?,
            );
            let lifecycle = JobLifecycle::new(store, executor, settings);
            let worker = Worker::new(lifecycle, poll_interval);
            worker.run_polling();
            Ok(())
        }
        Commands::Run { job } => {
            let raw = read_job_input(&job)?;
            let description: JobDescription =
                serde_json::from_str(&raw).context("parsing job description")?;

            let store = Arc::new(MemoryJobStore::new());
            store.insert(description.into_record());

            let lifecycle =
                JobLifecycle::new(store as Arc<dyn JobStore>, executor, settings);
            let worker = Worker::new(lifecycle, poll_interval);

            let outcome = worker
                .poll_once()?
                .ok_or_else(|| anyhow::anyhow!("job was not claimed"))?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            if outcome.success() {
                Ok(())
            } else {
                std::process::exit(1);
            }
        }
    }
}

/// Read the job description from a file or stdin.
fn read_job_input(path: &PathBuf) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("reading job description from stdin")?;
        Ok(raw)
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("reading job description {}", path.display()))
    }
}

/// Initialize tracing with stderr output and a daily-rolling file log.
fn init_tracing(
    settings: &Settings,
    verbose: bool,
) -> tracing_appender::non_blocking::WorkerGuard {
    let default_filter = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let file_appender =
        tracing_appender::rolling::daily(&settings.paths.logs_folder, "rf-worker.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    guard
}

/// Construct the engine adapter set from settings.
///
/// `engines.use_null_engines` swaps every engine for its stub variant so
/// the pipeline runs without real backends.
fn build_engines(settings: &Settings) -> anyhow::Result<Engines> {
    if settings.engines.use_null_engines {
        return Ok(build_null_engines(settings));
    }

    let voice = build_voice_chain(&settings.engines)?;
    let connect_timeout = Duration::from_secs(settings.engines.connect_timeout_secs);

    Ok(Engines {
        voice: Box::new(voice),
        avatar: Box::new(HttpAvatarEngine::new(EngineClient::new(
            "avatar",
            settings.engines.avatar_url.as_str(),
            connect_timeout,
        )?)),
        lipsync: Box::new(HttpLipSyncEngine::new(EngineClient::new(
            "lipsync",
            settings.engines.lipsync_url.as_str(),
            connect_timeout,
        )?)),
        video: Box::new(HttpVideoEngine::new(EngineClient::new(
            "video",
            settings.engines.video_url.as_str(),
            connect_timeout,
        )?)),
        encoder: Box::new(FfmpegEncoder::new(
            settings.engines.ffmpeg_path.clone(),
            settings.render.clone(),
        )),
    })
}

fn build_null_engines(settings: &Settings) -> Engines {
    let cache = PathBuf::from(&settings.paths.work_root).join("null-engines");
    let fps = settings.render.fps;
    tracing::warn!("null engines enabled; all stages produce placeholder artifacts");

    Engines {
        voice: Box::new(VoiceFallbackChain::new(
            vec![Box::new(NullVoiceEngine::new(cache.join("voice")))],
            settings.engines.default_voice.clone(),
        )),
        avatar: Box::new(NullAvatarEngine::new(cache.join("avatar"))),
        lipsync: Box::new(NullLipSyncEngine::new(cache.join("lipsync"), fps)),
        video: Box::new(NullVideoEngine::new(cache.join("video"))),
        encoder: Box::new(NullEncoder),
    }
}

/// Build the ordered voice fallback chain from the configured URLs.
///
/// An empty list yields an empty chain, which reports the fatal "no
/// synthesis backend configured" error on first use rather than at
/// startup - other job types keep working.
fn build_voice_chain(engines: &EngineSettings) -> anyhow::Result<VoiceFallbackChain> {
    let connect_timeout = Duration::from_secs(engines.connect_timeout_secs);
    let mut backends: Vec<Box<dyn VoiceSynthesizer>> = Vec::new();
    for (idx, url) in engines.voice_urls.iter().enumerate() {
        let name = format!("voice-{}", idx);
        let client = EngineClient::new(name, url.as_str(), connect_timeout)?;
        backends.push(Box::new(HttpVoiceEngine::new(client)));
    }

    Ok(VoiceFallbackChain::new(
        backends,
        engines.default_voice.clone(),
    ))
}
