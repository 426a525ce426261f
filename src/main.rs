use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use loopwatch_lib::bootstrap::{init_tracing_subscriber, resolve_config, wire_service};
use loopwatch_lib::replay::{parse_records, replay};

/// Extra wait after one throttle interval so the final delivery completes.
const FLUSH_MARGIN: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "loopwatch")]
#[command(about = "Paired watch management and watch state sync", long_about = None)]
struct Cli {
    /// Config file (defaults to <config dir>/loopwatch/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List paired devices
    Devices,
    /// Apply a device selection response
    Pair {
        /// Selection payload (JSON array of devices)
        #[arg(short, long)]
        response: String,
    },
    /// Forget every paired device
    Forget,
    /// Replay a JSON-lines telemetry file through the sync pipeline
    Replay {
        /// Input file path
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = resolve_config(cli.config.as_deref())?;
    init_tracing_subscriber(&config.log_dir)?;

    let wired = wire_service(&config)
        .await
        .context("Failed to start watch sync service")?;
    let service = &wired.service;

    match cli.command {
        Commands::Devices => {
            let devices = service.list_devices().await;
            if devices.is_empty() {
                println!("no paired devices");
            }
            for device in devices {
                println!("{}\t{}\t{}", device.id, device.model_name, device.friendly_name);
            }
        }
        Commands::Pair { response } => {
            let devices = service.handle_selection_response(&response).await;
            println!("paired {} device(s)", devices.len());
            for device in devices {
                println!("{}\t{}", device.id, device.display_name());
            }
        }
        Commands::Forget => {
            service.forget_devices().await;
            println!("paired devices cleared");
        }
        Commands::Replay { file } => {
            let reader = File::open(&file)
                .map(BufReader::new)
                .with_context(|| format!("Failed to open replay file: {}", file.display()))?;
            let records = parse_records(reader)?;
            let summary = replay(service, &records).await;

            tokio::time::sleep(wired.settings.throttle_interval + FLUSH_MARGIN).await;

            let sent = wired.transport.sent_messages();
            println!(
                "replayed {} glucose batch(es), {} decision(s), {} inbound message(s), {} skipped",
                summary.glucose_batches,
                summary.dosing_decisions,
                summary.inbound_messages,
                summary.skipped
            );
            println!("{} message(s) delivered", sent.len());
            if let Some(last) = sent.last() {
                println!("{}", serde_json::to_string_pretty(&last.message)?);
            }
        }
    }

    service.shutdown();
    Ok(())
}
