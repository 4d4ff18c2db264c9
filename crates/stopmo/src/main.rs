//! stopmo - headless stop-motion timeline player and punch-in recorder
//!
//! This is the main entry point. It:
//! 1. Loads the YAML config and applies command line overrides
//! 2. Opens the audio output and starts the project scheduler
//! 3. Queues the frame import (chaining to the soundtrack)
//! 4. Connects the MIDI control surface, if one is configured
//! 5. Reads console commands from stdin until `quit` or EOF
//!
//! ## Command line flags
//!
//! See [`cli::USAGE`]. `--list-devices` prints audio outputs and MIDI ports.

mod cli;
mod commands;
mod config;

use std::io::BufRead;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use stopmo_core::audio::{list_output_devices, AudioSink, CpalSink, NullSink};
use stopmo_core::clip::PassthroughCodec;
use stopmo_core::config::{default_config_path, load_config};
use stopmo_core::{Project, Scheduler};
use stopmo_midi::{ControlSurfaceRouter, MidiFeedback, MidiInputHandler};

use cli::CliArgs;
use commands::{Command, Console, Flow};
use config::StopmoConfig;

/// Router channel depth; the midir callback drops events when it is full
const EVENT_QUEUE_DEPTH: usize = 256;

fn main() -> Result<()> {
    let cli = CliArgs::parse(std::env::args().skip(1))?;

    // Initialize logger - set RUST_LOG=debug for verbose output
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    if cli.help {
        println!("{}", cli::USAGE);
        return Ok(());
    }
    if cli.version {
        println!("stopmo {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    if cli.list_devices {
        list_devices();
        return Ok(());
    }

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config: StopmoConfig = load_config(&config_path);
    config.apply_cli(&cli);

    prepare_paths(&config)?;
    config.project.validate().context("invalid project settings")?;

    let sink: Arc<dyn AudioSink> = if config.audio.null_output {
        log::info!("Audio: using null output");
        Arc::new(NullSink)
    } else {
        Arc::new(CpalSink::new(config.audio.device.clone()))
    };
    let project = Arc::new(Project::new(config.project, sink, Arc::new(PassthroughCodec)));
    project.configure_import(config.import.clone())?;

    let mut scheduler = Scheduler::start(project.clone()).context("failed to start scheduler")?;
    if config.import.input_dir.is_some() {
        project.queue_video_import();
    } else if config.import.audio_path.is_some() {
        project.queue_audio_import();
    }

    let (event_tx, event_rx) = flume::bounded(EVENT_QUEUE_DEPTH);
    let midi_input = config.midi.input_port.as_deref().and_then(|pattern| {
        match MidiInputHandler::connect(pattern, event_tx.clone()) {
            Ok(handler) => {
                log::info!("MIDI: listening on {}", handler.port_name());
                Some(handler)
            }
            Err(e) => {
                log::warn!("MIDI: input unavailable: {}", e);
                None
            }
        }
    });

    let mut router = ControlSurfaceRouter::new(project.clone(), &config.midi);
    if let Some(pattern) = config.midi.feedback_port() {
        match MidiFeedback::connect(pattern) {
            Ok(feedback) => router = router.with_feedback(Box::new(feedback)),
            Err(e) => log::warn!("MIDI: feedback output unavailable: {}", e),
        }
    }
    let router_handle = router.spawn(event_rx).context("failed to start router")?;

    let console = Console::new(project.clone(), event_tx, config.midi.target);
    let result = run_console(&console);

    // Closing every sender ends the router thread
    drop(console);
    drop(midi_input);
    if router_handle.join().is_err() {
        log::error!("Router: thread panicked");
    }

    project.stop();
    scheduler.terminate();
    result
}

fn run_console(console: &Console) -> Result<()> {
    println!("stopmo ready, type 'help' for commands");
    for line in std::io::stdin().lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{}", e);
                continue;
            }
        };
        match console.execute(command) {
            Ok((Flow::Quit, _)) => break,
            Ok((Flow::Continue, Some(text))) => println!("{}", text),
            Ok((Flow::Continue, None)) => {}
            Err(e) => eprintln!("error: {:#}", e),
        }
    }
    Ok(())
}

/// Output directory is required and created on demand; the soundtrack must exist
fn prepare_paths(config: &StopmoConfig) -> Result<()> {
    let Some(output_dir) = &config.import.output_dir else {
        bail!("No output directory (-o) specified\nusage: {}", cli::USAGE);
    };
    if output_dir.exists() {
        if !output_dir.is_dir() {
            bail!("{}: not a directory", output_dir.display());
        }
    } else {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("mkdir {}", output_dir.display()))?;
        log::info!("Created output directory {:?}", output_dir);
    }
    if let Some(audio) = &config.import.audio_path {
        if !audio.is_file() {
            bail!("{}: No such file", audio.display());
        }
    }
    Ok(())
}

fn list_devices() {
    println!("Audio outputs:");
    match list_output_devices() {
        Ok(devices) if devices.is_empty() => println!("  (none)"),
        Ok(devices) => {
            for device in devices {
                println!("  {}", device);
            }
        }
        Err(e) => println!("  unavailable: {}", e),
    }

    println!("MIDI ports:");
    let ports = stopmo_midi::list_devices();
    if ports.is_empty() {
        println!("  (none)");
    }
    for port in ports {
        println!("  {}", port);
    }
}
