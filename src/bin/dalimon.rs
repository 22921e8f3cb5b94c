//! DALI bus monitor
//!
//! Attaches to a Lunatone USB bridge and prints every captured bus frame as
//! a decoded, timestamped line.
//!
//! Usage:
//!   dalimon
//!   dalimon --absolute            # prefix each line with local wall time
//!   RUST_LOG=debug dalimon        # raw packet logging
//!
//! Output columns: [local time |] relative timestamp (s) | delta to the
//! previous frame (s) | raw frame hex | decoded command.

use clap::Parser;
use dalimon::{
    CaptureSession, CarryoverPolicy, DeviceContext, MonitorError, ProtocolDecoder, UsbTransport,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Print DALI bus traffic", long_about = None)]
struct Args {
    /// Prefix each line with the local wall-clock time
    #[arg(long)]
    absolute: bool,

    /// Apply device-type context only to the next forward frame
    /// (closer to the standard; default mirrors the bus as observed)
    #[arg(long)]
    strict: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), MonitorError> {
    let transport = UsbTransport::open_default()?;
    let mut session = CaptureSession::new(Arc::new(transport));
    session.start_capture()?;
    info!("Capture running, waiting for bus traffic");

    let decoder = if args.strict {
        ProtocolDecoder::with_carryover(CarryoverPolicy::Strict)
    } else {
        ProtocolDecoder::new()
    };
    let mut ctx = DeviceContext::new();
    let mut last_timestamp = 0.0f64;

    loop {
        let frame = session.next_frame()?;
        let delta = if last_timestamp != 0.0 {
            frame.timestamp - last_timestamp
        } else {
            0.0
        };

        if args.absolute {
            print!("{} | ", chrono::Local::now().format("%H:%M:%S"));
        }
        match decoder.decode(&frame, &ctx) {
            Some(cmd) => {
                println!(
                    "{:10.3} | {:8.3} | {} | {}",
                    frame.timestamp, delta, frame, cmd.label
                );
                ctx.advance(cmd.next_device_type);
            }
            // Bus errors carry no command to decode; print them as-is
            None => println!("{:10.3} | {:8.3} | {}", frame.timestamp, delta, frame),
        }
        last_timestamp = frame.timestamp;
    }
}
