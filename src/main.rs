//! ledgate - operator console for the LED controller gateway.
//!
//! Opens the device, starts the diagnostic listener and reads commands
//! from stdin until EOF or Ctrl+C.

use std::time::Duration;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ledgate::transport::serial::{DEFAULT_BAUD_RATE, DEFAULT_READ_TIMEOUT};
use ledgate::{
    CallerId, DEFAULT_LOG_WINDOW, ErrorKind, Gateway, GatewayConfig, PRESETS, SerialTransport,
    list_ports, render_entries,
};

#[derive(Debug, Parser)]
#[command(name = "ledgate", version, about = "Drive an RGB LED controller over serial")]
struct Cli {
    /// Serial port of the controller (e.g. /dev/ttyACM0 or COM4)
    #[arg(short, long, env = "LEDGATE_PORT", required_unless_present = "list_ports")]
    port: Option<String>,

    /// Baud rate
    #[arg(short, long, env = "LEDGATE_BAUD", default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Read timeout per poll, in milliseconds
    #[arg(long, env = "LEDGATE_READ_TIMEOUT_MS", default_value_t = millis(DEFAULT_READ_TIMEOUT))]
    read_timeout_ms: u64,

    /// Number of device diagnostics kept
    #[arg(long, env = "LEDGATE_LOG_CAPACITY", default_value_t = ledgate::diagnostics::DEFAULT_LOG_CAPACITY)]
    log_capacity: usize,

    /// Only accept requests from this caller id (0 disables the check)
    #[arg(long, env = "AUTHORIZED_CHAT_ID")]
    authorized_caller: Option<CallerId>,

    /// Caller id used for console input (defaults to the authorized caller)
    #[arg(long, env = "LEDGATE_CALLER_ID")]
    caller_id: Option<CallerId>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

const HELP: &str = "\
Commands:
  R<0-255> G<0-255> B<0-255>   set colour, e.g. R255 G0 B128
  L<0-255>                     set brightness, e.g. L128
  /logs [seconds]              show recent device diagnostics (default 30s)
  /presets                     show ready-made commands
  /help                        show this help";

#[tokio::main]
async fn main() -> ledgate::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    if cli.list_ports {
        for port in list_ports()? {
            println!("{port}");
        }
        return Ok(());
    }

    let Some(port) = cli.port else {
        // clap enforces the port unless --list-ports is given
        return Ok(());
    };

    let config = GatewayConfig::new(port)
        .baud_rate(cli.baud)
        .read_timeout(Duration::from_millis(cli.read_timeout_ms))
        .log_capacity(cli.log_capacity)
        .authorized_caller(cli.authorized_caller);
    let caller = cli
        .caller_id
        .or(config.authorized_caller)
        .unwrap_or_default();

    let mut gateway = Gateway::serial(config);
    let state = gateway.start().await;
    tracing::info!("gateway started, link {}", state);
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&gateway, line.trim(), caller).await,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("stdin read failed: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    gateway.shutdown().await
}

async fn handle_line(gateway: &Gateway<SerialTransport>, line: &str, caller: CallerId) {
    if line.is_empty() {
        return;
    }

    if let Some(rest) = line.strip_prefix("/logs") {
        show_logs(gateway, rest.trim(), caller).await;
        return;
    }

    match line {
        "/help" | "/start" => println!("{HELP}"),
        "/presets" => println!("{}", PRESETS.join("\n")),
        text => match gateway.submit_command(text, caller).await {
            Ok(sent) => println!("ok: {}", sent.confirmation),
            Err(e) => println!("error: {}", describe(e.kind())),
        },
    }
}

async fn show_logs(gateway: &Gateway<SerialTransport>, arg: &str, caller: CallerId) {
    let window = if arg.is_empty() {
        DEFAULT_LOG_WINDOW
    } else if let Ok(secs) = arg.parse::<u64>() {
        Duration::from_secs(secs)
    } else {
        println!("error: /logs takes a number of seconds");
        return;
    };

    match gateway.recent_logs(window, caller).await {
        Ok(entries) => match render_entries(&entries) {
            Some(text) => println!("{text}"),
            None => println!("no device logs in the last {}s", window.as_secs()),
        },
        Err(e) => println!("error: {}", describe(e.kind())),
    }
}

const fn describe(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::UnrecognizedFormat => {
            "unrecognized command, use `R<0-255> G<0-255> B<0-255>` or `L<0-255>`"
        }
        ErrorKind::OutOfRange => "values must be between 0 and 255",
        ErrorKind::Unauthorized => "you are not allowed to control this device",
        ErrorKind::LinkUnavailable | ErrorKind::ReadFailure => {
            "no connection to the device, check the cable, port and power"
        }
    }
}
