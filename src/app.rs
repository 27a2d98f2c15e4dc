use crate::config::{Args, Config};
use crate::input::spawn_listener;
use crate::params::ParameterStore;
use crate::render::{Terminal, TerminalProbe};
use crate::resize::ResizeFlag;
use crate::sim::{Simulation, SimulationLoop};
use anyhow::{Context, Result};
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// The terminal belongs to the renderer, so logs only go to a file.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("could not create log file {}", path.display()))?;
    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .try_init()
        .context("could not install tracing subscriber")?;
    Ok(())
}

pub(crate) fn run() -> Result<()> {
    let config = Config::from_args(Args::parse()).context("invalid configuration")?;
    if let Some(path) = &config.log_file {
        init_logging(path)?;
    }

    let params = Arc::new(ParameterStore::new(
        config.temperature,
        config.probability,
        config.fps,
        config.min_fps,
        config.max_fps,
    ));
    let resize = ResizeFlag::new();

    // Signals from outside the terminal (kill, SIGTERM) only drop the flag.
    {
        let params = Arc::clone(&params);
        ctrlc::set_handler(move || params.request_stop())
            .context("could not install termination handler")?;
    }

    let (height, width) = config.size.resolve(&TerminalProbe);
    let sim = Simulation::new(height, width, StdRng::seed_from_u64(config.seed))
        .context("could not allocate the initial grid")?;
    tracing::info!(
        height,
        width,
        seed = config.seed,
        temperature = config.temperature,
        probability = config.probability,
        fps = config.fps,
        "starting simulation"
    );

    let term = Terminal::begin().context("could not prepare the terminal")?;
    let listener = spawn_listener(Arc::clone(&params), resize.clone())
        .context("could not start the input listener")?;

    let mut sim_loop = SimulationLoop::new(sim, Arc::clone(&params), resize, config.size, TerminalProbe, term);
    let outcome = sim_loop.run();

    // Make sure the listener sees the stop even when the loop failed.
    params.request_stop();
    if listener.join().is_err() {
        tracing::warn!("input listener panicked");
    }
    drop(sim_loop);

    let sweeps = outcome?;
    tracing::info!(sweeps, "shut down cleanly");
    Ok(())
}
