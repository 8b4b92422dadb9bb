use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use gps_recorder::{
    create_router, AppState, Clock, Config, EventNotifier, LocationBackendFactory, LocationSource,
    NoopNotifier, Phase, Recorder, SystemClock, ToggleCoordinator, ToggleOutcome, TracingNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "gps-recorder", about = "Record GPS sessions to CSV logs")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/gps-recorder")]
    config: String,

    /// Override recording.output_dir
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP remote control
    Serve {
        /// Override service.http.bind
        #[arg(long)]
        bind: Option<String>,
        /// Override service.http.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Record one session locally for a fixed time
    Record {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
    },
}

fn build_recorder(cfg: &Config, output_dir: Option<PathBuf>) -> Result<Arc<Recorder>> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock::new());
    let backend = LocationBackendFactory::create(cfg.source_kind()?, Arc::clone(&clock));
    let source = Arc::new(LocationSource::new(backend, cfg.recording.feed_capacity));

    let mut recorder_config = cfg.recorder_config()?;
    if let Some(dir) = output_dir {
        recorder_config.output_dir = dir;
    }

    let notifier: Arc<dyn EventNotifier> = if cfg.events.enabled {
        Arc::new(TracingNotifier)
    } else {
        Arc::new(NoopNotifier)
    };

    let recorder = Recorder::new(recorder_config, source, clock)
        .context("Invalid recorder configuration")?
        .with_notifier(notifier);
    Ok(Arc::new(recorder))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("GPS Recorder v0.1.0");
    info!("Loaded config: {}", cfg.service.name);

    let recorder = build_recorder(&cfg, cli.output_dir)?;
    info!("Session logs go to {:?}", recorder.output_dir());

    match cli.command {
        Command::Serve { bind, port } => {
            let coordinator = ToggleCoordinator::new();
            recorder.attach(&coordinator)?;

            let bind = bind.unwrap_or(cfg.service.http.bind);
            let port = port.unwrap_or(cfg.service.http.port);
            let addr = format!("{}:{}", bind, port);

            let app = create_router(AppState::new(Arc::clone(&recorder), coordinator.clone()));
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("Failed to bind {}", addr))?;
            info!("Remote control listening on http://{}", addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await?;

            recorder.detach(&coordinator);
            if recorder.phase() == Phase::Recording {
                recorder.toggle().await?;
            }
        }
        Command::Record { seconds } => {
            recorder.toggle().await?;
            info!("Recording for {} seconds", seconds);

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(seconds)) => {}
                _ = tokio::signal::ctrl_c() => info!("Interrupted"),
            }

            if let ToggleOutcome::Stopped(summary) = recorder.toggle().await? {
                match &summary.log_path {
                    Some(path) => println!(
                        "Saved {} samples ({} batches) to {}",
                        summary.samples_written,
                        summary.batches_written,
                        path.display()
                    ),
                    None => println!("Save failed ({} samples seen)", summary.sample_count),
                }
            }
        }
    }

    Ok(())
}
