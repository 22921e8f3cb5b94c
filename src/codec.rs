//! Bridge packet framing
//!
//! The USB bridge exchanges fixed 64-byte packets with the host. The two
//! directions use independent byte layouts:
//!
//! Host → bridge (transmit):
//! ```text
//! dr sn -- ty -- ec ad oc  (rest zero)
//! 12 01 00 03 00 00 ff 08
//! ```
//!
//! Bridge → host (receive):
//! ```text
//! dr ty -- ec ad oc st st sn  (rest zero)
//! 11 73 00 00 ff 93 ff ff 00
//! ```
//!
//! The bridge also echoes every host-originated transmission back with the
//! `0x12` direction byte; echoes are reported to the caller but never become
//! bus frames. Receive frame types carry the `0x70` mask on top of the
//! transmit type codes.

use crate::frame::{BusErrorKind, FrameWidth, RawFrame};
use crate::MonitorError;
use tracing::debug;

/// Fixed size of every packet exchanged with the bridge
pub const PACKET_SIZE: usize = 64;

/// Direction byte: packet originated on the bus side
pub const DIRECTION_FROM_BUS: u8 = 0x11;
/// Direction byte: packet originated on the host side (echo when received)
pub const DIRECTION_TO_BUS: u8 = 0x12;

const TYPE_8BIT: u8 = 0x02;
const TYPE_16BIT: u8 = 0x03;
const TYPE_24BIT: u8 = 0x06;
const TYPE_STATUS: u8 = 0x07;
const RECEIVE_MASK: u8 = 0x70;

/// Outcome of decoding one received packet
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PacketEvent {
    /// A bus frame or bridge-reported bus fault, to be queued
    Frame(RawFrame),
    /// Echo of a host-originated transmission; logged, never queued
    Echo { seq: u8 },
    /// Not a packet this core understands; logged, never queued
    Unrecognized,
}

/// Session-scoped sequence counter for outbound packets
///
/// Starts at 1 and wraps modulo 256, so the value after 255 is 0.
#[derive(Debug)]
pub struct SequenceCounter {
    next: u8,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Take the next sequence number
    pub fn next(&mut self) -> u8 {
        let seq = self.next;
        self.next = self.next.wrapping_add(1);
        seq
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode a logical 1-3 byte bus command into an outbound bridge packet
pub fn encode_frame(cmd: &[u8], seq: u8) -> Result<[u8; PACKET_SIZE], MonitorError> {
    let (ty, ec, ad, oc) = match cmd {
        [oc] => (TYPE_8BIT, 0, 0, *oc),
        [ad, oc] => (TYPE_16BIT, 0, *ad, *oc),
        [ec, ad, oc] => (TYPE_24BIT, *ec, *ad, *oc),
        _ => return Err(MonitorError::InvalidCommandLength(cmd.len())),
    };

    let mut packet = [0u8; PACKET_SIZE];
    packet[0] = DIRECTION_TO_BUS;
    packet[1] = seq;
    packet[3] = ty;
    packet[5] = ec;
    packet[6] = ad;
    packet[7] = oc;

    debug!(
        "DALI[OUT]: SN=0x{:02X} TY=0x{:02X} EC=0x{:02X} AD=0x{:02X} OC=0x{:02X}",
        seq, ty, ec, ad, oc
    );

    Ok(packet)
}

/// Decode one received bridge packet
///
/// `timestamp` is the capture-relative instant the packet was read; it is
/// carried unchanged onto the emitted frame.
pub fn decode_packet(data: &[u8], timestamp: f64) -> PacketEvent {
    if data.len() < 9 {
        return PacketEvent::Unrecognized;
    }

    match data[0] {
        DIRECTION_FROM_BUS => {
            debug!(
                "DALI[IN]: SN=0x{:02X} TY=0x{:02X} EC=0x{:02X} AD=0x{:02X} OC=0x{:02X}",
                data[8], data[1], data[3], data[4], data[5]
            );
            let frame = match data[1] {
                ty if ty == RECEIVE_MASK | TYPE_8BIT => {
                    RawFrame::command(FrameWidth::Bits8, u32::from(data[5]), timestamp)
                }
                ty if ty == RECEIVE_MASK | TYPE_16BIT => RawFrame::command(
                    FrameWidth::Bits16,
                    u32::from(data[5]) | u32::from(data[4]) << 8,
                    timestamp,
                ),
                ty if ty == RECEIVE_MASK | TYPE_24BIT => RawFrame::command(
                    FrameWidth::Bits24,
                    u32::from(data[5]) | u32::from(data[4]) << 8 | u32::from(data[3]) << 16,
                    timestamp,
                ),
                ty if ty == RECEIVE_MASK | TYPE_STATUS => {
                    RawFrame::bus_error(classify_status(data[5]), timestamp)
                }
                _ => return PacketEvent::Unrecognized,
            };
            PacketEvent::Frame(frame)
        }
        DIRECTION_TO_BUS => PacketEvent::Echo { seq: data[8] },
        _ => PacketEvent::Unrecognized,
    }
}

/// Classify a bridge status sub-code into a bus fault category
///
/// Total over all byte values; every input maps to a defined kind.
pub fn classify_status(subcode: u8) -> BusErrorKind {
    match subcode {
        0x04 => BusErrorKind::Recoverable,
        0x03 => BusErrorKind::Frame,
        _ => BusErrorKind::General,
    }
}
