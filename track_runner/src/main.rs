mod config;
mod directory;
mod simulation;

use anyhow::Context;
use config::{RunnerConfig, SourceConfig};
use directory::DirectoryFrameSource;
use fuzzy_line_follower::core_modules::annotate::annotate;
use fuzzy_line_follower::{ActuatorSink, ControlLoop, FrameSource, LoopSummary, MotorCommand};
use simulation::{SimulatedCamera, SimulatedDrive, TrackWorld};
use std::convert::Infallible;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

type BoxedSource = Box<dyn FrameSource>;
type BoxedSink = Box<dyn ActuatorSink<Error = Infallible>>;

/// Stands in for motors when replaying recordings: commands are only logged.
struct LoggedActuator;

impl ActuatorSink for LoggedActuator {
    type Error = Infallible;

    fn apply(&mut self, command: MotorCommand) -> Result<(), Infallible> {
        info!(left = command.left, right = command.right, "motor command");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // --- 1. Configuration ---
    let config = match std::env::args().nth(1) {
        Some(path) => RunnerConfig::load(&path)?,
        None => {
            info!("no config given, running the simulated track");
            RunnerConfig::default()
        }
    };

    // --- 2. Stop Signal ---
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("stop requested");
                stop.store(true, Ordering::SeqCst);
            }
        });
    }

    // --- 3. Control Loop ---
    // The loop is synchronous; keep it off the async workers.
    let summary = tokio::task::spawn_blocking(move || run(config, &stop))
        .await
        .context("control loop task panicked")??;

    info!(
        ticks = summary.ticks,
        frames_without_line = summary.frames_without_line,
        stopped = summary.stopped,
        "processing complete"
    );
    Ok(())
}

fn run(config: RunnerConfig, stop: &AtomicBool) -> anyhow::Result<LoopSummary> {
    let mut control = ControlLoop::with_config(config.controller)?;

    let (mut source, mut sink): (BoxedSource, BoxedSink) = match &config.source {
        SourceConfig::Directory { path, orientation } => {
            let recorded = DirectoryFrameSource::new(path, *orientation)?;
            info!(frames = recorded.remaining(), dir = %path.display(), "replaying recorded frames");
            let source: BoxedSource = Box::new(recorded);
            let sink: BoxedSink = Box::new(LoggedActuator);
            (source, sink)
        }
        SourceConfig::Simulated { ticks, initial_offset } => {
            let world = Arc::new(Mutex::new(TrackWorld::new(*initial_offset)));
            info!(ticks, initial_offset, "simulating straight track");
            let source: BoxedSource = Box::new(SimulatedCamera::new(world.clone(), *ticks));
            let sink: BoxedSink = Box::new(SimulatedDrive::new(world));
            (source, sink)
        }
    };

    if let Some(dir) = &config.annotate_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let mut reports = match &config.report_path {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => None,
    };

    let summary = control.run_observed(source.as_mut(), sink.as_mut(), stop, |frame, tick| {
        if let Some(dir) = &config.annotate_dir {
            let path = dir.join(format!("tick_{:06}.png", tick.report.tick));
            if let Err(e) = annotate(frame, &tick.extraction).save(&path) {
                warn!(path = %path.display(), error = %e, "could not write annotated frame");
            }
        }
        if let Some(out) = reports.as_mut() {
            let written = serde_json::to_writer(&mut *out, &tick.report)
                .map_err(std::io::Error::from)
                .and_then(|_| out.write_all(b"\n"));
            if let Err(e) = written {
                warn!(error = %e, "could not write tick report");
            }
        }
    })?;

    if let Some(mut out) = reports {
        out.flush().context("flushing tick reports")?;
    }
    Ok(summary)
}
