//! CLI for trying out lighting effects against simulated devices.
//!
//! Effects come from a JSON config file (or a built-in victory effect) and
//! are applied to an in-memory room of lights.
//!
//! Run with: cargo run --example effects_cli -- --help

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use lumen_bridge::{
    Brand, Brightness, Color, CommandKind, Device, DeviceAdapter, DeviceType, EffectDispatcher,
    Engine, EngineConfig, GameEvent, LightCommand, PowerMode, VirtualAdapter,
};

#[derive(Parser)]
#[command(name = "effects-cli")]
#[command(about = "Drive simulated lights with game events", long_about = None)]
struct Cli {
    /// Engine config file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the simulated devices
    Devices,

    /// Print the effective configuration
    Config,

    /// Send one event and watch the lights until restorations fire
    Send {
        /// Event type, e.g. match:victory
        event: String,

        /// Player that triggered the event
        #[arg(short, long)]
        player: Option<String>,

        /// How long to keep watching, in milliseconds
        #[arg(short, long, default_value = "6000")]
        watch: u64,
    },

    /// Replay events from a file with one JSON event per line
    Replay {
        file: PathBuf,

        /// Pause between events, in milliseconds
        #[arg(short, long, default_value = "500")]
        delay: u64,
    },

    /// Switch one device on or off
    Power {
        device: String,
        #[arg(value_parser = ["on", "off"])]
        state: String,
    },
}

const DEFAULT_CONFIG: &str = r##"{
    "effects": [{
        "eventType": "match:victory",
        "command": {"type": "setColor", "params": {"color": "#00FF00"}},
        "durationMs": 5000,
        "priority": 10,
        "restorePreviousState": true
    }, {
        "eventType": "player:kill",
        "command": {"type": "setBrightness", "params": {"brightness": 100}},
        "durationMs": 1000,
        "restorePreviousState": true
    }]
}"##;

fn room() -> VirtualAdapter {
    VirtualAdapter::new("demo")
        .with_device(
            Device::new("desk", "Desk Lamp", Brand::Govee)
                .with_type(DeviceType::Light)
                .with_color(Color::rgb(255, 255, 255))
                .with_brightness(Brightness::clamped(80)),
        )
        .with_device(
            Device::new("strip", "Monitor Strip", Brand::PhilipsHue)
                .with_type(DeviceType::Strip)
                .with_color(Color::rgb(40, 0, 120))
                .with_brightness(Brightness::clamped(60)),
        )
        .with_device(
            Device::new("plug", "Fan Plug", Brand::Other)
                .with_type(DeviceType::Plug)
                .with_power(true),
        )
}

async fn print_devices(adapter: &VirtualAdapter) -> Result<(), Box<dyn std::error::Error>> {
    for device in adapter.get_devices().await? {
        let color = device
            .color
            .map(|c| c.to_string())
            .unwrap_or_else(|| "-".to_string());
        let brightness = device
            .brightness
            .map(|b| format!("{}%", b.value()))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:6} {:14} {:6} power={:?} color={} brightness={}",
            device.id,
            device.name,
            device.device_type.to_string(),
            device.power(),
            color,
            brightness
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_str(&std::fs::read_to_string(path)?)?,
        None => EngineConfig::from_json_str(DEFAULT_CONFIG)?,
    };

    let adapter = Arc::new(room());
    let mut manager = config.light_manager();
    manager.add_shared_adapter(adapter.clone());
    let manager = Arc::new(manager);

    match cli.command {
        Commands::Devices => {
            adapter.initialize().await?;
            println!("Simulated devices:");
            print_devices(&adapter).await?;
        }

        Commands::Config => {
            println!("{}", config.to_json_string()?);
        }

        Commands::Power { device, state } => {
            manager.initialize().await.into_result()?;
            let power = PowerMode::from(state == "on");
            manager
                .execute_command(&LightCommand::new(&device, CommandKind::from(power)))
                .await?;
            print_devices(&adapter).await?;
        }

        Commands::Send {
            event,
            player,
            watch,
        } => {
            let engine = Engine::spawn(EffectDispatcher::new(manager.clone()));
            engine.initialize().await?.into_result()?;
            for effect in config.effects() {
                engine.add_effect(effect).await?;
            }

            println!("Before:");
            print_devices(&adapter).await?;

            let mut event = GameEvent::new(&event);
            if let Some(player) = &player {
                event = event.with_player(player);
            }
            let report = engine.handle_event(event).await?;
            match report.effect {
                Some(id) => println!("\nEffect {} applied to {:?}", id, report.applied),
                None => println!("\nNo effect matched {}", report.event_type),
            }
            for (device, err) in &report.failed {
                eprintln!("  {}: {}", device, err);
            }
            print_devices(&adapter).await?;

            tokio::time::sleep(Duration::from_millis(watch)).await;
            println!(
                "\nAfter {}ms ({} restorations pending):",
                watch,
                engine.pending_restorations().await?
            );
            print_devices(&adapter).await?;
            engine.shutdown().await?;
        }

        Commands::Replay { file, delay } => {
            let engine = Engine::spawn(EffectDispatcher::new(manager.clone()));
            engine.initialize().await?.into_result()?;
            for effect in config.effects() {
                engine.add_effect(effect).await?;
            }

            let contents = std::fs::read_to_string(&file)?;
            for line in contents.lines().filter(|l| !l.trim().is_empty()) {
                let event = GameEvent::from_json(line)?;
                let report = engine.handle_event(event).await?;
                println!(
                    "{:14} applied={} failed={}",
                    report.event_type,
                    report.applied.len(),
                    report.failed.len()
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            print_devices(&adapter).await?;
            engine.shutdown().await?;
        }
    }

    Ok(())
}
