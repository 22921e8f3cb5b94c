//! Core data types for captured bus traffic

use std::fmt;

/// Width of a logical DALI bus frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameWidth {
    /// 8-bit backward frame (reply)
    Bits8,
    /// 16-bit forward frame (control gear)
    Bits16,
    /// 24-bit forward frame (control devices)
    Bits24,
}

impl FrameWidth {
    /// Frame width in bits
    pub fn bits(self) -> u8 {
        match self {
            FrameWidth::Bits8 => 8,
            FrameWidth::Bits16 => 16,
            FrameWidth::Bits24 => 24,
        }
    }
}

/// Bus fault category reported by the bridge, classified from its
/// status sub-code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusErrorKind {
    /// Transient condition the bus recovered from
    Recoverable,
    /// Framing violation on the wire
    Frame,
    /// Anything the bridge reports that is neither of the above
    General,
}

impl fmt::Display for BusErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BusErrorKind::Recoverable => write!(f, "BUS ERROR (recovered)"),
            BusErrorKind::Frame => write!(f, "BUS ERROR (frame)"),
            BusErrorKind::General => write!(f, "BUS ERROR (general)"),
        }
    }
}

/// Payload of one captured unit
///
/// A packet that is neither a bus frame nor a status report never becomes a
/// `RawFrame` at all — `codec::decode_packet` reports it separately and the
/// capture worker drops it, so invalid traffic cannot reach the queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameKind {
    /// A forward or backward frame observed on the bus
    Command { width: FrameWidth, payload: u32 },
    /// A bus fault reported by the bridge
    BusError(BusErrorKind),
}

/// One unit delivered by the transport layer
///
/// `timestamp` is seconds since the capture session started, stamped from
/// the host clock at receipt. Frames are constructed once by the capture
/// worker and never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFrame {
    pub kind: FrameKind,
    pub timestamp: f64,
}

impl RawFrame {
    pub fn command(width: FrameWidth, payload: u32, timestamp: f64) -> Self {
        Self {
            kind: FrameKind::Command { width, payload },
            timestamp,
        }
    }

    pub fn bus_error(kind: BusErrorKind, timestamp: f64) -> Self {
        Self {
            kind: FrameKind::BusError(kind),
            timestamp,
        }
    }
}

impl fmt::Display for RawFrame {
    /// Width-appropriate hex rendering, for the monitor's raw-data column
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            FrameKind::Command {
                width: FrameWidth::Bits8,
                payload,
            } => write!(f, "    {:02X}", payload),
            FrameKind::Command {
                width: FrameWidth::Bits16,
                payload,
            } => write!(f, "  {:04X}", payload),
            FrameKind::Command {
                width: FrameWidth::Bits24,
                payload,
            } => write!(f, "{:06X}", payload),
            FrameKind::BusError(kind) => write!(f, "{}", kind),
        }
    }
}
