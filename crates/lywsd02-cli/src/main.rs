use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use lywsd02_core::{ADVERTISED_NAME, TemperatureUnit};

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "lywsd02")]
#[command(author, version, about = "CLI for the Xiaomi LYWSD02 clock/hygrometer", long_about = None)]
struct Cli {
    /// Device to connect to (advertised name or address)
    #[arg(short, long, global = true)]
    device: Option<String>,

    /// Scan timeout in seconds
    #[arg(short, long, global = true)]
    timeout: Option<u64>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Temperature unit argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum UnitArg {
    Celsius,
    Fahrenheit,
}

impl From<UnitArg> for TemperatureUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Celsius => TemperatureUnit::Celsius,
            UnitArg::Fahrenheit => TemperatureUnit::Fahrenheit,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for nearby LYWSD02 devices
    Scan {
        /// List all BLE devices, not just LYWSD02 units
        #[arg(long)]
        all: bool,
    },

    /// Read the device clock and UTC offset
    Time,

    /// Set the device clock to the current local time
    SetTime,

    /// Read the temperature unit shown on the display
    Units,

    /// Set the temperature unit shown on the display
    SetUnits {
        /// Unit to display
        #[arg(value_enum)]
        unit: UnitArg,
    },

    /// Read a one-shot temperature/humidity sample
    Read,

    /// Read a historical min/max record
    History,

    /// Show or update the saved defaults
    Config {
        /// Set the default device identifier
        #[arg(long)]
        device: Option<String>,

        /// Set the default scan timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load().unwrap_or_else(|e| {
        tracing::warn!("Ignoring unreadable config: {e:#}");
        Config::default()
    });

    // Resolution order: flag, then config file, then built-in default.
    let device = cli
        .device
        .or_else(|| config.device.clone())
        .unwrap_or_else(|| ADVERTISED_NAME.to_string());
    let scan_timeout = Duration::from_secs(cli.timeout.or(config.scan_timeout).unwrap_or(10));

    match cli.command {
        Commands::Scan { all } => commands::cmd_scan(scan_timeout, all, cli.format).await,
        Commands::Time => commands::cmd_time(&device, scan_timeout, cli.format).await,
        Commands::SetTime => commands::cmd_set_time(&device, scan_timeout).await,
        Commands::Units => commands::cmd_units(&device, scan_timeout, cli.format).await,
        Commands::SetUnits { unit } => {
            commands::cmd_set_units(&device, scan_timeout, unit.into()).await
        }
        Commands::Read => commands::cmd_read(&device, scan_timeout, cli.format).await,
        Commands::History => commands::cmd_history(&device, scan_timeout, cli.format).await,
        Commands::Config { device, timeout } => cmd_config(config, device, timeout),
    }
}

fn cmd_config(mut config: Config, device: Option<String>, timeout: Option<u64>) -> Result<()> {
    let changed = device.is_some() || timeout.is_some();
    if let Some(device) = device {
        config.device = Some(device);
    }
    if let Some(timeout) = timeout {
        config.scan_timeout = Some(timeout);
    }
    if changed {
        config.save()?;
    }

    if let Some(path) = Config::path() {
        println!("Config file: {}", path.display());
    }
    println!(
        "Default device:  {}",
        config.device.as_deref().unwrap_or(ADVERTISED_NAME)
    );
    println!(
        "Scan timeout:    {}s",
        config.scan_timeout.unwrap_or(10)
    );
    Ok(())
}
