use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use commstate_lib::config::{self, Settings};
use commstate_lib::host::{Context, LogFacade, StateSink};
use commstate_lib::serial::SystemOpener;
use commstate_lib::{Plugin, SessionConfig};

/// Watch a serial port's modem status lines and drive RTS/DTR from stdin.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Settings file (defaults to the executable path with a .cfg extension)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Serial port, overriding the settings file
    #[arg(long)]
    port: Option<String>,

    /// Device name used for the state variable
    #[arg(long)]
    name: Option<String>,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_ms: u64,

    /// Baud rate used when opening the port
    #[arg(long, default_value_t = 9600)]
    baud: u32,

    /// Write the effective settings back to the settings file
    #[arg(long)]
    save: bool,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,
}

/// Prints state variable changes to stdout.
struct StdoutSink;

impl StateSink for StdoutSink {
    fn set_variable(&self, name: &str, value: &str) {
        println!("{}={}", name, value);
    }

    fn clear_variable(&self, name: &str) {
        println!("{} cleared", name);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_ports {
        for port in SystemOpener::available_ports().context("Failed to enumerate serial ports")? {
            println!("{}", port);
        }
        return Ok(());
    }

    let settings_path = args.config.clone().unwrap_or_else(config::default_config_path);
    let device_name = args.name.clone().unwrap_or_else(config::default_device_name);
    let session_config = SessionConfig::new(Settings::default().com_port, device_name)
        .with_poll_interval(Duration::from_millis(args.poll_ms));
    let context = Context::new(Arc::new(StdoutSink), Arc::new(LogFacade));
    let opener = Arc::new(SystemOpener::new().with_baud_rate(args.baud));

    let plugin = Arc::new(Plugin::with_opener(session_config, context, &settings_path, opener));
    if let Some(port) = &args.port {
        plugin.set_port(port)?;
    }
    if args.save {
        plugin
            .save_settings()
            .with_context(|| format!("Failed to save settings to {}", settings_path.display()))?;
    }

    log::info!("Monitoring {} (variable {})", plugin.port(), plugin.session().variable_name());
    plugin.connect();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                let worker = Arc::clone(&plugin);
                let code = tokio::task::spawn_blocking(move || worker.send_message_text(&line)).await?;
                println!("{}", code);
            }
        }
    }

    let worker = Arc::clone(&plugin);
    tokio::task::spawn_blocking(move || worker.disconnect()).await?;
    Ok(())
}
