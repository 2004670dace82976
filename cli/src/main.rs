//! Fleet charging CLI runner
//!
//! Simulates one vehicle's charging session in real time and prints the
//! session's notifications and charging events as they happen.
//!
//! ```sh
//! # Run with default config (~/.config/fleet-charging/config.toml)
//! fleet-charging
//!
//! # Custom vehicle, charge straight away
//! fleet-charging --nickname Sparky --model "BMW i3" --initial-charge 40 --override
//!
//! # Validate config without starting
//! fleet-charging --check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};

use fleet_charging::config::AppConfig;
use fleet_charging::domain::vehicle::{format_charge_percentage, ChargeBand};
use fleet_charging::domain::{ChargingEventType, NewVehicle, Vehicle};
use fleet_charging::notifications::{Event, NotificationLevel};
use fleet_charging::support::shutdown::listen_for_shutdown_signals;
use fleet_charging::{
    create_event_bus, default_config_path, init_tracing, AppError, FleetService,
    InMemoryVehicleStore, ShutdownSignal,
};

/// Fleet charging: smart charging simulator for electric vehicles.
#[derive(Parser, Debug)]
#[command(
    name = "fleet-charging",
    version,
    about = "Smart charging simulator for an electric vehicle fleet",
    long_about = "Plugs a simulated vehicle in and runs its charging session: \
                  automatic scheduling to 85%, override charging to 100%, \
                  and suspension until the next morning.\n\n\
                  Default config: ~/.config/fleet-charging/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "FLEET_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Override the simulated vehicle's nickname.
    #[arg(long)]
    nickname: Option<String>,

    /// Override the simulated vehicle's model.
    #[arg(long)]
    model: Option<String>,

    /// Override the starting battery level, in percent.
    #[arg(long)]
    initial_charge: Option<f64>,

    /// Start an override charge right after plugging in.
    #[arg(long = "override")]
    override_charge: bool,

    /// Exit once a charge completes instead of waiting for Ctrl+C.
    #[arg(long)]
    until_complete: bool,

    /// Validate the configuration file and exit without starting.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let (mut config, load_error) = match AppConfig::load(&config_path) {
        Ok(cfg) => (cfg, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(ref nickname) = cli.nickname {
        config.vehicle.nickname = nickname.clone();
    }
    if let Some(ref model) = cli.model {
        config.vehicle.model = model.clone();
    }
    if let Some(charge) = cli.initial_charge {
        config.vehicle.initial_charge = charge;
    }

    init_tracing(&config.logging);
    match load_error {
        None => info!("Configuration loaded from {}", config_path.display()),
        Some(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }
    config.validate()?;

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("✅ Configuration is valid");
        println!("   Config file    : {}", config_path.display());
        println!("   Vehicle        : {} ({})", config.vehicle.nickname, config.vehicle.model);
        println!("   Initial charge : {}%", format_charge_percentage(config.vehicle.initial_charge));
        println!("   Auto-schedule  : {}s", config.charging.auto_schedule_delay_secs);
        println!("   Log level      : {}", config.logging.level);
        return Ok(());
    }

    run(config, cli.override_charge, cli.until_complete).await?;
    Ok(())
}

async fn run(
    config: AppConfig,
    override_charge: bool,
    until_complete: bool,
) -> Result<(), AppError> {
    let vehicle = Vehicle::register(
        NewVehicle::new(
            &config.vehicle.nickname,
            &config.vehicle.model,
            config.vehicle.battery_capacity,
        ),
        config.vehicle.initial_charge,
    );
    let slug = vehicle.slug();

    let event_bus = create_event_bus();
    let shutdown = ShutdownSignal::new();
    let fleet = FleetService::new(
        Arc::new(InMemoryVehicleStore::with_vehicles([vehicle])),
        event_bus.clone(),
        shutdown.clone(),
    )
    .with_config(config.charging.clone());

    let mut subscriber = fleet.watch_vehicle(&slug).await?;
    tokio::spawn(listen_for_shutdown_signals(shutdown.clone()));

    let session = fleet.open_session(&slug).await?;
    info!("🚗 Simulating {} ({})", slug, config.vehicle.model);

    session.plug_in().await?;
    if override_charge {
        session.trigger_override().await?;
    }

    info!("🚀 Press Ctrl+C to stop.");
    let mut last_whole_percent = session.snapshot().state_of_charge().floor();
    // Set once a charge completes; the completion toast follows its event.
    let mut exit_after_toast = false;

    loop {
        tokio::select! {
            _ = shutdown.wait() => break,
            message = subscriber.recv() => {
                let Some(message) = message else { break };
                match message.event {
                    Event::Notification(n) => {
                        let icon = match n.level {
                            NotificationLevel::Info => "ℹ️ ",
                            NotificationLevel::Success => "✅",
                            NotificationLevel::Warning => "⚠️ ",
                        };
                        println!("{} {}", icon, n.message);
                        if exit_after_toast {
                            break;
                        }
                    }
                    Event::ChargingEventRecorded(recorded) => {
                        println!(
                            "   [{}] {}",
                            recorded.event.timestamp.format("%H:%M:%S"),
                            recorded.event.description
                        );
                        if recorded.event.event_type == ChargingEventType::Completion {
                            exit_after_toast = until_complete;
                        }
                    }
                    Event::ChargeLevelChanged(level) => {
                        let whole = level.state_of_charge.floor();
                        if whole > last_whole_percent {
                            last_whole_percent = whole;
                            println!(
                                "🔋 {}% ({})",
                                format_charge_percentage(level.state_of_charge),
                                ChargeBand::from_charge(level.state_of_charge)
                            );
                        }
                    }
                    Event::ChargerStatusChanged(_) => {}
                }
            }
        }
    }

    let snapshot = session.snapshot();
    println!(
        "Final: {} at {}%, {} events recorded",
        snapshot.charger_state.status(),
        format_charge_percentage(snapshot.state_of_charge()),
        snapshot.events.len()
    );
    if subscriber.missed() > 0 {
        println!("({} updates were not shown, output fell behind)", subscriber.missed());
    }

    fleet.shutdown();
    Ok(())
}
