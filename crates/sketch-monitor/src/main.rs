//! Serial monitor for the demo firmware.
//!
//! Prints every line the board logs on UART0 until the firmware prints
//! `exit` or the timeout runs out. Exit status is 0 on the exit line, 2 on
//! timeout and 1 when the port fails.

mod monitor;

use std::io::{self, Read, Write};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use log::{error, info, warn};
use thiserror_no_std::Error;

use monitor::{LineMonitor, Stop};

/// How long one port read blocks before the deadline is checked again.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Debug, Parser)]
#[command(version, about = "Print the ESP32 demo log from a serial port")]
struct Args {
    /// Serial port; defaults to the only port present
    #[arg(long)]
    port: Option<String>,

    #[arg(long, default_value_t = 115_200)]
    baudrate: u32,

    /// Seconds before giving up
    #[arg(long, default_value_t = 60)]
    timeout: u64,
}

#[derive(Error, Debug)]
enum MonitorError {
    #[error("no port given and {found} serial ports present")]
    AmbiguousPort { found: usize },
    #[error("could not list serial ports: {details}")]
    Enumerate { details: String },
    #[error("could not open {port}: {details}")]
    Open { port: String, details: String },
    #[error("read from {port} failed: {details}")]
    Read { port: String, details: String },
}

fn resolve_port(requested: Option<&str>) -> Result<String, MonitorError> {
    if let Some(port) = requested {
        return Ok(port.to_owned());
    }
    let ports = serialport::available_ports().map_err(|e| MonitorError::Enumerate {
        details: e.to_string(),
    })?;
    match ports.as_slice() {
        [only] => Ok(only.port_name.clone()),
        _ => Err(MonitorError::AmbiguousPort { found: ports.len() }),
    }
}

fn run(args: &Args) -> Result<Stop, MonitorError> {
    let port_name = resolve_port(args.port.as_deref())?;
    let mut port = serialport::new(&port_name, args.baudrate)
        .timeout(READ_TIMEOUT)
        .open()
        .map_err(|e| MonitorError::Open {
            port: port_name.clone(),
            details: e.to_string(),
        })?;
    info!(
        "Monitoring {} at {} baud for {} s",
        port_name, args.baudrate, args.timeout
    );

    let mut monitor = LineMonitor::new(Duration::from_secs(args.timeout), Instant::now());
    let mut out = io::stdout().lock();
    let mut buf = [0u8; 256];

    while !monitor.expired(Instant::now()) {
        match port.read(&mut buf) {
            Ok(n) => {
                let stop = monitor.feed(&buf[..n], |line| {
                    let _ = writeln!(out, "{line}");
                });
                if let Some(stop) = stop {
                    return Ok(stop);
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {}
            Err(e) => {
                return Err(MonitorError::Read {
                    port: port_name,
                    details: e.to_string(),
                });
            }
        }
    }

    if !monitor.partial().is_empty() {
        let _ = writeln!(out, "{}", String::from_utf8_lossy(monitor.partial()));
    }
    Ok(Stop::Timeout)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(Stop::ExitLine) => {
            info!("Firmware finished");
            ExitCode::SUCCESS
        }
        Ok(Stop::Timeout) => {
            warn!("No exit line after {} s", args.timeout);
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
