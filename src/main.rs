// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/glowbarn-rs

//! Brankas - Safe Security Console
//!
//! Subscribes to the safe's MQTT topics, fuses sensor readings with face and
//! voice classifier results, and redraws a verdict table in the terminal.
//!
//! Operator commands are read from stdin, one per line:
//! `capture`, `record`, `alarm-off`, `reset`, `open`.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use brankas::{
    core::{OperatorCommand, RefreshScheduler},
    media::{HttpMediaSource, UnavailableModel},
    sensors::SafeSimulator,
    streaming::ProtocolVariant,
    ui::{NoticeLevel, TextRenderer},
    Config, Console, IngressQueue, LoopbackBus, MediaHandler, MqttBus, Publisher, VERSION,
};

/// Brankas - Safe Security Console
#[derive(Parser, Debug)]
#[command(name = "brankas")]
#[command(version = VERSION)]
#[command(about = "Fuses safe telemetry and face/voice results into security verdicts")]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MQTT broker host
    #[arg(long)]
    broker: Option<String>,

    /// MQTT broker port
    #[arg(long)]
    port: Option<u16>,

    /// Use the legacy per-sensor topic protocol
    #[arg(long)]
    legacy: bool,

    /// Play a scripted safe alongside the console
    #[arg(long)]
    demo: bool,

    /// Run without a broker; published messages loop back locally
    #[arg(long)]
    offline: bool,

    /// Keep previous frames instead of clearing the terminal
    #[arg(long)]
    no_clear: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Enable trace-level logging
    #[arg(long)]
    trace: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_create(&config_path)?;

    // Initialize logging
    let log_level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        config.log_level.parse().unwrap_or(Level::INFO)
    };

    // Frames go to stdout, logs to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(args.debug)
        .with_line_number(args.debug)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Brankas v{} - Safe Security Console", VERSION);
    info!("Configuration loaded from {:?}", config_path);

    // Override with command line args
    if args.demo {
        config.demo_mode = true;
    }
    if args.legacy {
        config.protocol.variant = ProtocolVariant::Legacy;
    }
    if let Some(broker) = args.broker.clone() {
        config.bus.broker = broker;
    }
    if let Some(port) = args.port {
        config.bus.port = port;
    }

    info!("Demo mode: {}", config.demo_mode);

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(run(config, args.offline, !args.no_clear));

    // The blocking stdin reader may still be parked on a read
    rt.shutdown_timeout(Duration::from_millis(200));
    result
}

async fn run(config: Config, offline: bool, clear_screen: bool) -> Result<()> {
    let queue = Arc::new(IngressQueue::new());
    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    let mqtt = if offline {
        if !config.demo_mode {
            warn!("Offline without --demo: nothing will arrive on the bus");
        }
        None
    } else {
        let subscriptions = config
            .protocol
            .subscriptions()
            .into_iter()
            .map(String::from)
            .collect();
        match MqttBus::connect(&config.bus, subscriptions, Arc::clone(&queue)).await {
            Ok(bus) => Some(Arc::new(bus)),
            Err(e) => {
                error!("Could not reach the broker: {}", e);
                return Err(e.into());
            }
        }
    };

    let publisher: Arc<dyn Publisher> = match &mqtt {
        Some(bus) => bus.clone(),
        None => Arc::new(LoopbackBus::new(Arc::clone(&queue))),
    };

    // No model runtime is linked in; every capture classifies as a model error
    let models = Arc::new(UnavailableModel::new("not installed"));
    let media = MediaHandler::new(
        Arc::new(HttpMediaSource::new(config.media.fetch_timeout())?),
        models.clone(),
        models,
        Arc::clone(&publisher),
        &config.protocol.face_result_topic,
        &config.protocol.voice_result_topic,
    );

    if config.demo_mode {
        let simulator = SafeSimulator::new(config.protocol.clone(), Duration::from_millis(700));
        tokio::spawn(simulator.run(Arc::clone(&publisher), shutdown_tx.subscribe()));
    }

    let (command_tx, command_rx) = mpsc::channel(16);
    tokio::spawn(read_commands(command_tx));

    let mut console = Console::new(&config, Arc::clone(&queue), publisher, media);
    match &mqtt {
        Some(bus) => console.post_notice(NoticeLevel::Info, format!("Connected to {}", bus.broker())),
        None => console.post_notice(NoticeLevel::Info, "Offline: publishes loop back locally"),
    }
    let mut renderer = TextRenderer::new(std::io::stdout()).with_clear_screen(clear_screen);
    let scheduler = RefreshScheduler::new(config.console.idle_refresh());

    let console_shutdown = shutdown_tx.subscribe();
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received, cleaning up...");
            let _ = signal_tx.send(());
        }
    });

    info!("Press Ctrl+C to shutdown");
    console
        .run(&mut renderer, scheduler, command_rx, console_shutdown)
        .await;

    if let Some(bus) = mqtt {
        if let Err(e) = bus.disconnect().await {
            warn!("{}", e);
        }
    }

    info!("Brankas shutdown complete");
    Ok(())
}

/// Forward operator commands typed on stdin to the console
async fn read_commands(commands: mpsc::Sender<OperatorCommand>) {
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line.parse::<OperatorCommand>() {
            Ok(command) => {
                if commands.send(command).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                let names: Vec<_> = OperatorCommand::ALL.iter().map(|c| c.name()).collect();
                warn!("{} (try: {})", e, names.join(", "));
            }
        }
    }
}
