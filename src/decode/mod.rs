//! Protocol decoder
//!
//! Resolves a captured bus frame plus the current device-type context into an
//! addressed, opcode-resolved command. The decoder is pure: the context is a
//! value owned by the caller and threaded explicitly through successive
//! decode calls, never shared process state.
//!
//! Forward-frame address byte layout (the payload's upper byte):
//! ```text
//! 0AAA AAAS   short address 0-63
//! 100G GGGS   group address 0-15
//! 1111 110S   broadcast unaddressed
//! 1111 111S   broadcast
//! 101x xxxx / 110x xxxx   special commands
//! ```
//! The selector bit `S` picks the command family: set means the opcode byte
//! resolves through a lookup table, clear means a direct-value command
//! (direct arc power on 16-bit frames, event data on 24-bit frames).

mod tables;

use crate::frame::{FrameKind, FrameWidth, RawFrame};
use std::fmt;
use tracing::trace;

/// Bus device class whose extended command set re-interprets the opcode
/// space of a following frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceType {
    /// No device-type context active
    #[default]
    None,
    Fluorescent,
    Emergency,
    Led,
    Switching,
    Colour,
    /// A device type this analyzer has no opcode table for
    Other(u8),
}

impl DeviceType {
    /// Map the operand of ENABLE DEVICE TYPE to a device class
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => DeviceType::Fluorescent,
            1 => DeviceType::Emergency,
            6 => DeviceType::Led,
            7 => DeviceType::Switching,
            8 => DeviceType::Colour,
            other => DeviceType::Other(other),
        }
    }

    /// The standard's device-type number; `None` has no number
    pub fn code(&self) -> Option<u8> {
        match self {
            DeviceType::None => None,
            DeviceType::Fluorescent => Some(0),
            DeviceType::Emergency => Some(1),
            DeviceType::Led => Some(6),
            DeviceType::Switching => Some(7),
            DeviceType::Colour => Some(8),
            DeviceType::Other(code) => Some(*code),
        }
    }
}

/// Device-type context carried between decode calls
///
/// Created once per decode session; the owner feeds each decoded command's
/// `next_device_type` back in via [`DeviceContext::advance`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceContext {
    active: DeviceType,
}

impl DeviceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// The device type that applies to the next decoded command
    pub fn active(&self) -> DeviceType {
        self.active
    }

    /// Carry a decode result forward to the next call
    pub fn advance(&mut self, next: DeviceType) {
        self.active = next;
    }
}

/// Addressing mode of a forward frame, derived from the top bits of the
/// address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaliAddress {
    Short(u8),
    Group(u8),
    Broadcast,
    BroadcastUnaddressed,
    Special,
}

impl DaliAddress {
    /// Fixed-width display tag for the monitor's address column
    pub fn tag(&self) -> String {
        match self {
            DaliAddress::Short(a) => format!("A{:02}", a),
            DaliAddress::Group(g) => format!("G{:02}", g),
            DaliAddress::Broadcast => "BC".to_string(),
            DaliAddress::BroadcastUnaddressed => "BC unadr.".to_string(),
            DaliAddress::Special => String::new(),
        }
    }
}

/// How device-type context carries over to the frame after an
/// ENABLE DEVICE TYPE command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CarryoverPolicy {
    /// The context applies to the very next decoded command, whatever it is,
    /// and is consumed by it. Matches the observed bus behavior.
    #[default]
    Unconditional,
    /// The context survives backward (8-bit) frames and applies to the next
    /// forward frame only, closer to the standard's semantics.
    Strict,
}

/// Immutable result of decoding one command frame
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCommand {
    /// Addressing mode; `None` for backward frames, which carry no address
    pub address: Option<DaliAddress>,
    /// Raw opcode byte (the reply value for backward frames)
    pub opcode: u8,
    /// Human-readable rendering: address tag left-justified to 10 columns,
    /// then the resolved command name
    pub label: String,
    /// Device-type context the next decode call must use
    pub next_device_type: DeviceType,
}

impl fmt::Display for DecodedCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Address byte of the 16-bit ENABLE DEVICE TYPE special command
const ENABLE_DEVICE_TYPE: u8 = 0xC1;

/// Width of the address column in rendered labels
const TAG_COLUMNS: usize = 10;

fn compose(tag: &str, name: &str) -> String {
    format!("{:<width$}{}", tag, name, width = TAG_COLUMNS)
}

fn placeholder(opcode: u8) -> String {
    format!("--- 0x{:02X}", opcode)
}

/// Classify the address byte; `None` means the special-command region
fn classify_address(addr: u8) -> Option<DaliAddress> {
    match addr {
        0xFE | 0xFF => Some(DaliAddress::Broadcast),
        0xFC | 0xFD => Some(DaliAddress::BroadcastUnaddressed),
        a if a & 0x80 == 0 => Some(DaliAddress::Short((a >> 1) & 0x3F)),
        a @ 0x80..=0x9F => Some(DaliAddress::Group((a >> 1) & 0x0F)),
        // 0xA0-0xCB special commands, 0xCC-0xFB reserved
        _ => None,
    }
}

/// The stateless decode engine
///
/// Carries only configuration; all mutable decode state lives in the
/// caller-owned [`DeviceContext`].
#[derive(Debug, Default)]
pub struct ProtocolDecoder {
    carryover: CarryoverPolicy,
}

impl ProtocolDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_carryover(carryover: CarryoverPolicy) -> Self {
        Self { carryover }
    }

    /// Decode one captured frame under the given context
    ///
    /// Returns `None` for bus-error frames (they are rendered directly by
    /// the consumer). For command frames of every width and every device
    /// type this returns `Some` with a non-empty label; an opcode with no
    /// table entry degrades to a placeholder rather than failing.
    pub fn decode(&self, frame: &RawFrame, ctx: &DeviceContext) -> Option<DecodedCommand> {
        let (width, payload) = match frame.kind {
            FrameKind::Command { width, payload } => (width, payload),
            FrameKind::BusError(_) => return None,
        };

        trace!("decode: width={} payload=0x{:06X}", width.bits(), payload);

        let cmd = match width {
            FrameWidth::Bits8 => self.decode_backward(payload as u8, ctx),
            FrameWidth::Bits16 => self.decode_gear(payload as u16, ctx),
            FrameWidth::Bits24 => self.decode_device(payload),
        };
        Some(cmd)
    }

    /// 8-bit backward frame: a reply value, no address byte
    fn decode_backward(&self, value: u8, ctx: &DeviceContext) -> DecodedCommand {
        let next_device_type = match self.carryover {
            // Replies do not consume an enable under strict semantics
            CarryoverPolicy::Strict => ctx.active(),
            CarryoverPolicy::Unconditional => DeviceType::None,
        };
        DecodedCommand {
            address: None,
            opcode: value,
            label: compose("", &format!("ANSWER 0x{:02X} = {}", value, value)),
            next_device_type,
        }
    }

    /// 16-bit forward frame: control-gear command
    fn decode_gear(&self, payload: u16, ctx: &DeviceContext) -> DecodedCommand {
        let addr = (payload >> 8) as u8;
        let opcode = payload as u8;

        match classify_address(addr) {
            Some(address) => {
                let name = if addr & 0x01 != 0 {
                    // Opcode-table family: device-type table first, then the
                    // standard command set
                    tables::device_type_16(ctx.active(), opcode)
                        .or_else(|| tables::standard_16(opcode))
                        .unwrap_or_else(|| placeholder(opcode))
                } else {
                    // Direct-value family, no table lookup
                    format!("DAPC {}", opcode)
                };
                DecodedCommand {
                    label: compose(&address.tag(), &name),
                    address: Some(address),
                    opcode,
                    next_device_type: DeviceType::None,
                }
            }
            None => {
                let name = tables::special_16(addr, opcode).unwrap_or_else(|| placeholder(opcode));
                let next_device_type = if addr == ENABLE_DEVICE_TYPE {
                    DeviceType::from_code(opcode)
                } else {
                    DeviceType::None
                };
                DecodedCommand {
                    address: Some(DaliAddress::Special),
                    opcode,
                    label: compose("", &name),
                    next_device_type,
                }
            }
        }
    }

    /// 24-bit forward frame: control-device command or event message
    fn decode_device(&self, payload: u32) -> DecodedCommand {
        let addr = (payload >> 16) as u8;
        let instance = (payload >> 8) as u8;
        let opcode = payload as u8;

        let (address, name) = match classify_address(addr) {
            Some(address) => {
                let name = if addr & 0x01 != 0 {
                    tables::device_24(instance, opcode).unwrap_or_else(|| placeholder(opcode))
                } else {
                    // Event messages carry data, not an opcode
                    format!("EVENT 0x{:04X}", payload & 0xFFFF)
                };
                (address, name)
            }
            None => (DaliAddress::Special, placeholder(opcode)),
        };

        DecodedCommand {
            label: compose(&address.tag(), &name),
            address: Some(address),
            opcode,
            next_device_type: DeviceType::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame16(payload: u16) -> RawFrame {
        RawFrame::command(FrameWidth::Bits16, u32::from(payload), 0.0)
    }

    fn decode16(payload: u16, device_type: DeviceType) -> DecodedCommand {
        let mut ctx = DeviceContext::new();
        ctx.advance(device_type);
        ProtocolDecoder::new()
            .decode(&frame16(payload), &ctx)
            .expect("command frame must decode")
    }

    #[test]
    fn test_address_classification_is_exact() {
        let opcode = 0x90u16;
        assert_eq!(
            decode16(0xFF00 | opcode, DeviceType::None).address,
            Some(DaliAddress::Broadcast)
        );
        assert_eq!(
            decode16(0xFD00 | opcode, DeviceType::None).address,
            Some(DaliAddress::BroadcastUnaddressed)
        );
        for s in 0..0x40u16 {
            assert_eq!(
                decode16((0x0100 + (s << 9)) | opcode, DeviceType::None).address,
                Some(DaliAddress::Short(s as u8)),
                "short address {}",
                s
            );
        }
        for g in 0..0x10u16 {
            assert_eq!(
                decode16((0x8100 + (g << 9)) | opcode, DeviceType::None).address,
                Some(DaliAddress::Group(g as u8)),
                "group address {}",
                g
            );
        }
    }

    // refer to iec62386 207 table 6
    const DT6_COMMANDS: &[(&str, u8)] = &[
        ("REFERENCE SYSTEM POWER", 0xE0),
        ("SELECT DIMMING CURVE (DTR0)", 0xE3),
        ("SET FAST FADE TIME (DTR0)", 0xE4),
        ("QUERY CONTROL GEAR TYPE", 0xED),
        ("QUERY DIMMING CURVE", 0xEE),
        ("QUERY FEATURES", 0xF0),
        ("QUERY LOAD DECREASE", 0xF4),
        ("QUERY LOAD INCREASE", 0xF5),
        ("QUERY THERMAL SHUTDOWN", 0xF7),
        ("QUERY THERMAL OVERLOAD", 0xF8),
        ("QUERY REFERENCE RUNNING", 0xF9),
        ("QUERY REFERENCE MEASUREMENT FAILED", 0xFA),
        ("QUERY FAST FADE TIME", 0xFD),
        ("QUERY MIN FAST FADE TIME", 0xFE),
        ("QUERY EXTENDED VERSION NUMBER", 0xFF),
    ];

    #[test]
    fn test_led_commands_under_every_address_mode() {
        for &(name, opcode) in DT6_COMMANDS {
            let opcode = u16::from(opcode);
            let cmd = decode16(0xFF00 + opcode, DeviceType::Led);
            assert_eq!(cmd.label, format!("{:<10}{}", "BC", name));

            let cmd = decode16(0xFD00 + opcode, DeviceType::Led);
            assert_eq!(cmd.label, format!("{:<10}{}", "BC unadr.", name));

            for s in 0..0x40u16 {
                let cmd = decode16(0x0100 + (s << 9) + opcode, DeviceType::Led);
                assert_eq!(cmd.label, format!("{:<10}{}", format!("A{:02}", s), name));
            }
            for g in 0..0x10u16 {
                let cmd = decode16(0x8100 + (g << 9) + opcode, DeviceType::Led);
                assert_eq!(cmd.label, format!("{:<10}{}", format!("G{:02}", g), name));
            }
        }
    }

    const DT6_UNDEFINED: &[u8] = &[
        0xE1, 0xE2, 0xE5, 0xE6, 0xE7, 0xE8, 0xE9, 0xEA, 0xEB, 0xEC, 0xEF, 0xF2, 0xF3, 0xF6, 0xFB,
        0xFC,
    ];

    #[test]
    fn test_led_undefined_opcodes_render_placeholder() {
        for &opcode in DT6_UNDEFINED {
            let opcode = u16::from(opcode);
            for (payload, tag) in [
                (0xFF00 + opcode, "BC".to_string()),
                (0xFD00 + opcode, "BC unadr.".to_string()),
                (0x0100 + (5 << 9) + opcode, "A05".to_string()),
                (0x8100 + (3 << 9) + opcode, "G03".to_string()),
            ] {
                let cmd = decode16(payload, DeviceType::Led);
                let expected = format!("{:<10}---", tag);
                assert!(
                    cmd.label.starts_with(&expected),
                    "opcode 0x{:02X}: {:?}",
                    opcode,
                    cmd.label
                );
            }
        }
    }

    #[test]
    fn test_decode_never_fails_for_any_width_or_device_type() {
        let decoder = ProtocolDecoder::new();
        let device_types = [
            DeviceType::None,
            DeviceType::Fluorescent,
            DeviceType::Emergency,
            DeviceType::Led,
            DeviceType::Switching,
            DeviceType::Colour,
            DeviceType::Other(42),
        ];
        let frames = [
            RawFrame::command(FrameWidth::Bits8, 0x00, 0.0),
            RawFrame::command(FrameWidth::Bits8, 0xFF, 0.0),
            RawFrame::command(FrameWidth::Bits16, 0xA1FE, 0.0),
            RawFrame::command(FrameWidth::Bits16, 0xCD42, 0.0),
            RawFrame::command(FrameWidth::Bits16, 0x0000, 0.0),
            RawFrame::command(FrameWidth::Bits24, 0xFFFE30, 0.0),
            RawFrame::command(FrameWidth::Bits24, 0x01FE00, 0.0),
            RawFrame::command(FrameWidth::Bits24, 0x02AA55, 0.0),
        ];
        for device_type in device_types {
            let mut ctx = DeviceContext::new();
            ctx.advance(device_type);
            for frame in &frames {
                let cmd = decoder.decode(frame, &ctx).expect("must decode");
                assert!(!cmd.label.trim().is_empty(), "{:?} {:?}", device_type, frame);
            }
        }
    }

    #[test]
    fn test_direct_arc_power_family_skips_tables() {
        let cmd = decode16(0xFE80, DeviceType::Led);
        assert_eq!(cmd.label, format!("{:<10}DAPC 128", "BC"));
        // Selector bit clear on a short address
        let cmd = decode16(0x0AFF, DeviceType::None);
        assert_eq!(cmd.address, Some(DaliAddress::Short(5)));
        assert_eq!(cmd.label, format!("{:<10}DAPC 255", "A05"));
    }

    #[test]
    fn test_enable_device_type_sets_carryover() {
        let cmd = decode16(0xC106, DeviceType::None);
        assert_eq!(cmd.address, Some(DaliAddress::Special));
        assert_eq!(cmd.next_device_type, DeviceType::Led);
        assert_eq!(cmd.label, format!("{:<10}ENABLE DEVICE TYPE 6", ""));

        // Any other command resets the context
        let cmd = decode16(0xFF00, DeviceType::Led);
        assert_eq!(cmd.next_device_type, DeviceType::None);
    }

    #[test]
    fn test_context_threading_matches_bus_order() {
        let decoder = ProtocolDecoder::new();
        let mut ctx = DeviceContext::new();

        for frame in [
            frame16(0xC106), // ENABLE DEVICE TYPE 6
            frame16(0xFFE0), // broadcast REFERENCE SYSTEM POWER
            frame16(0xFFE0), // same opcode, context now consumed
        ] {
            let cmd = decoder.decode(&frame, &ctx).unwrap();
            ctx.advance(cmd.next_device_type);
        }
        // After the sequence the context is back to none and 0xE0 is dark
        let cmd = decoder.decode(&frame16(0xFFE0), &ctx).unwrap();
        assert!(cmd.label.contains("---"));
    }

    #[test]
    fn test_strict_carryover_survives_backward_frames() {
        let strict = ProtocolDecoder::with_carryover(CarryoverPolicy::Strict);
        let mut ctx = DeviceContext::new();

        let enable = strict.decode(&frame16(0xC106), &ctx).unwrap();
        ctx.advance(enable.next_device_type);

        // An answer frame in between does not consume the enable
        let answer = strict
            .decode(&RawFrame::command(FrameWidth::Bits8, 0x42, 0.0), &ctx)
            .unwrap();
        ctx.advance(answer.next_device_type);
        assert_eq!(ctx.active(), DeviceType::Led);

        let cmd = strict.decode(&frame16(0xFFE0), &ctx).unwrap();
        assert!(cmd.label.ends_with("REFERENCE SYSTEM POWER"));

        // Default policy consumes it
        let lax = ProtocolDecoder::new();
        let mut ctx = DeviceContext::new();
        ctx.advance(DeviceType::Led);
        let answer = lax
            .decode(&RawFrame::command(FrameWidth::Bits8, 0x42, 0.0), &ctx)
            .unwrap();
        assert_eq!(answer.next_device_type, DeviceType::None);
    }

    #[test]
    fn test_bus_error_frames_are_not_decoded() {
        let decoder = ProtocolDecoder::new();
        let ctx = DeviceContext::new();
        let frame = RawFrame::bus_error(crate::frame::BusErrorKind::Frame, 1.0);
        assert_eq!(decoder.decode(&frame, &ctx), None);
    }

    #[test]
    fn test_device_frame_decodes_device_command() {
        let decoder = ProtocolDecoder::new();
        let ctx = DeviceContext::new();
        // Broadcast, instance 0xFE, QUERY DEVICE STATUS
        let frame = RawFrame::command(FrameWidth::Bits24, 0xFFFE30, 0.0);
        let cmd = decoder.decode(&frame, &ctx).unwrap();
        assert_eq!(cmd.address, Some(DaliAddress::Broadcast));
        assert_eq!(cmd.label, format!("{:<10}QUERY DEVICE STATUS", "BC"));

        // Selector bit clear: event message
        let frame = RawFrame::command(FrameWidth::Bits24, 0x02AA55, 0.0);
        let cmd = decoder.decode(&frame, &ctx).unwrap();
        assert_eq!(cmd.address, Some(DaliAddress::Short(1)));
        assert_eq!(cmd.label, format!("{:<10}EVENT 0xAA55", "A01"));
    }
}
