//! Passive DALI bus analyzer
//!
//! This library captures raw traffic from a DALI lighting-control bus through
//! a USB bridge device and turns each captured unit into a structured,
//! human-readable command with timing information.
//!
//! # Architecture
//!
//! - **codec**: bit-exact translation between the bridge's fixed 64-byte
//!   packets and logical 8/16/24-bit bus frames, plus the status sub-code
//!   classifier
//! - **decode**: stateful protocol decoder resolving a raw frame plus the
//!   carried device-type context into an addressed, opcode-resolved command
//! - **capture**: polling worker thread delivering captured frames through a
//!   bounded hand-off queue, in arrival order, without loss
//! - **transport**: minimal driver abstraction (USB behind it) so the
//!   framing/decode core runs against a scripted transport in tests
//!
//! # Example
//!
//! ```no_run
//! use dalimon::{CaptureSession, DeviceContext, ProtocolDecoder, UsbTransport};
//! use std::sync::Arc;
//!
//! let transport = UsbTransport::open_default()?;
//! let mut session = CaptureSession::new(Arc::new(transport));
//! session.start_capture()?;
//!
//! let decoder = ProtocolDecoder::new();
//! let mut ctx = DeviceContext::new();
//! let frame = session.next_frame()?;
//! if let Some(cmd) = decoder.decode(&frame, &ctx) {
//!     println!("{:8.3} | {} | {}", frame.timestamp, frame, cmd.label);
//!     ctx.advance(cmd.next_device_type);
//! }
//! # Ok::<(), dalimon::MonitorError>(())
//! ```

use thiserror::Error;

pub mod capture;
pub mod codec;
pub mod decode;
pub mod frame;
pub mod transport;

pub use capture::{CaptureSession, QUEUE_CAPACITY};
pub use codec::{classify_status, decode_packet, encode_frame, PacketEvent, SequenceCounter};
pub use decode::{
    CarryoverPolicy, DaliAddress, DecodedCommand, DeviceContext, DeviceType, ProtocolDecoder,
};
pub use frame::{BusErrorKind, FrameKind, FrameWidth, RawFrame};
pub use transport::{Transport, TransportError, UsbTransport};

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("DALI commands must be 1-3 bytes long, got {0}")]
    InvalidCommandLength(usize),

    #[error("transport error: {0}")]
    Transport(#[from] transport::TransportError),

    #[error("capture worker is already running")]
    AlreadyRunning,

    #[error("capture stopped")]
    CaptureStopped,
}

pub type Result<T> = std::result::Result<T, MonitorError>;
