//! Transport driver abstraction
//!
//! The capture pipeline talks to the bridge through this minimal interface
//! so the framing/decode core compiles and tests against a scripted
//! transport with no hardware attached. The USB driver lives in
//! [`usb`]; a serial bridge would implement the same trait.

pub mod usb;

pub use usb::UsbTransport;

use std::time::Duration;

/// Error type for transport operations
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("DALI interface not found")]
    DeviceNotFound,

    #[error("read timed out")]
    Timeout,

    #[error("device disconnected")]
    Disconnected,

    #[error("could not determine read or write endpoint")]
    EndpointDiscovery,

    #[error("USB error: {0}")]
    Usb(#[from] rusb::Error),
}

/// Abstract bridge driver
///
/// Methods take `&self`: the capture worker reads while the session owner
/// writes, mirroring the independent IN/OUT endpoints of the real device.
/// Implementations are expected to be internally synchronized.
pub trait Transport: Send + Sync {
    /// Read one packet, waiting at most `timeout`
    ///
    /// Returns [`TransportError::Timeout`] when nothing arrived in time
    /// (not a failure; the polling loop continues) and
    /// [`TransportError::Disconnected`] when the device is gone (fatal).
    fn read(&self, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    /// Write raw bytes to the bridge, returning the count written
    fn write(&self, data: &[u8]) -> Result<usize, TransportError>;
}
