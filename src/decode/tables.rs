//! Opcode lookup tables
//!
//! Data asset populated from the standard's published command tables. The
//! decoder selects the table from `(frame width, device type)`; content here
//! is deliberately plain data. Scene and group families carry their index in
//! the name, so those ranges compose the label instead of enumerating
//! sixteen entries each.

use super::DeviceType;

/// Standard 16-bit control-gear command set
pub(crate) fn standard_16(opcode: u8) -> Option<String> {
    let name = match opcode {
        0x00 => "OFF",
        0x01 => "UP",
        0x02 => "DOWN",
        0x03 => "STEP UP",
        0x04 => "STEP DOWN",
        0x05 => "RECALL MAX LEVEL",
        0x06 => "RECALL MIN LEVEL",
        0x07 => "STEP DOWN AND OFF",
        0x08 => "ON AND STEP UP",
        0x09 => "ENABLE DAPC SEQUENCE",
        0x0A => "GO TO LAST ACTIVE LEVEL",
        0x10..=0x1F => return Some(format!("GO TO SCENE {}", opcode & 0x0F)),
        0x20 => "RESET",
        0x21 => "STORE ACTUAL LEVEL IN DTR0",
        0x22 => "SAVE PERSISTENT VARIABLES",
        0x23 => "SET OPERATING MODE (DTR0)",
        0x24 => "RESET MEMORY BANK (DTR0)",
        0x25 => "IDENTIFY DEVICE",
        0x2A => "SET MAX LEVEL (DTR0)",
        0x2B => "SET MIN LEVEL (DTR0)",
        0x2C => "SET SYSTEM FAILURE LEVEL (DTR0)",
        0x2D => "SET POWER ON LEVEL (DTR0)",
        0x2E => "SET FADE TIME (DTR0)",
        0x2F => "SET FADE RATE (DTR0)",
        0x30 => "SET EXTENDED FADE TIME (DTR0)",
        0x40..=0x4F => return Some(format!("SET SCENE {} (DTR0)", opcode & 0x0F)),
        0x50..=0x5F => return Some(format!("REMOVE FROM SCENE {}", opcode & 0x0F)),
        0x60..=0x6F => return Some(format!("ADD TO GROUP {}", opcode & 0x0F)),
        0x70..=0x7F => return Some(format!("REMOVE FROM GROUP {}", opcode & 0x0F)),
        0x80 => "SET SHORT ADDRESS (DTR0)",
        0x81 => "ENABLE WRITE MEMORY",
        0x90 => "QUERY STATUS",
        0x91 => "QUERY CONTROL GEAR PRESENT",
        0x92 => "QUERY LAMP FAILURE",
        0x93 => "QUERY LAMP POWER ON",
        0x94 => "QUERY LIMIT ERROR",
        0x95 => "QUERY RESET STATE",
        0x96 => "QUERY MISSING SHORT ADDRESS",
        0x97 => "QUERY VERSION NUMBER",
        0x98 => "QUERY CONTENT DTR0",
        0x99 => "QUERY DEVICE TYPE",
        0x9A => "QUERY PHYSICAL MINIMUM",
        0x9B => "QUERY POWER FAILURE",
        0x9C => "QUERY CONTENT DTR1",
        0x9D => "QUERY CONTENT DTR2",
        0x9E => "QUERY OPERATING MODE",
        0x9F => "QUERY LIGHT SOURCE TYPE",
        0xA0 => "QUERY ACTUAL LEVEL",
        0xA1 => "QUERY MAX LEVEL",
        0xA2 => "QUERY MIN LEVEL",
        0xA3 => "QUERY POWER ON LEVEL",
        0xA4 => "QUERY SYSTEM FAILURE LEVEL",
        0xA5 => "QUERY FADE TIME/FADE RATE",
        0xA6 => "QUERY MANUFACTURER SPECIFIC MODE",
        0xA7 => "QUERY NEXT DEVICE TYPE",
        0xA8 => "QUERY EXTENDED FADE TIME",
        0xAA => "QUERY CONTROL GEAR FAILURE",
        0xB0..=0xBF => return Some(format!("QUERY SCENE LEVEL {}", opcode & 0x0F)),
        0xC0 => "QUERY GROUPS 0-7",
        0xC1 => "QUERY GROUPS 8-15",
        0xC2 => "QUERY RANDOM ADDRESS (H)",
        0xC3 => "QUERY RANDOM ADDRESS (M)",
        0xC4 => "QUERY RANDOM ADDRESS (L)",
        0xC5 => "READ MEMORY LOCATION (DTR1, DTR0)",
        _ => return None,
    };
    Some(name.to_string())
}

/// Device-type-specific 16-bit extended command sets, keyed by the context
/// carried from a preceding ENABLE DEVICE TYPE
pub(crate) fn device_type_16(device_type: DeviceType, opcode: u8) -> Option<String> {
    let name = match device_type {
        DeviceType::Led => led_16(opcode)?,
        DeviceType::Emergency => emergency_16(opcode)?,
        DeviceType::Colour => colour_16(opcode)?,
        _ => return None,
    };
    Some(name.to_string())
}

// iec62386-207 table 6
fn led_16(opcode: u8) -> Option<&'static str> {
    match opcode {
        0xE0 => Some("REFERENCE SYSTEM POWER"),
        0xE3 => Some("SELECT DIMMING CURVE (DTR0)"),
        0xE4 => Some("SET FAST FADE TIME (DTR0)"),
        0xED => Some("QUERY CONTROL GEAR TYPE"),
        0xEE => Some("QUERY DIMMING CURVE"),
        0xF0 => Some("QUERY FEATURES"),
        0xF1 => Some("QUERY FAILURE STATUS"),
        0xF4 => Some("QUERY LOAD DECREASE"),
        0xF5 => Some("QUERY LOAD INCREASE"),
        0xF7 => Some("QUERY THERMAL SHUTDOWN"),
        0xF8 => Some("QUERY THERMAL OVERLOAD"),
        0xF9 => Some("QUERY REFERENCE RUNNING"),
        0xFA => Some("QUERY REFERENCE MEASUREMENT FAILED"),
        0xFD => Some("QUERY FAST FADE TIME"),
        0xFE => Some("QUERY MIN FAST FADE TIME"),
        0xFF => Some("QUERY EXTENDED VERSION NUMBER"),
        _ => None,
    }
}

// iec62386-202 subset
fn emergency_16(opcode: u8) -> Option<&'static str> {
    match opcode {
        0xE0 => Some("REST"),
        0xE1 => Some("INHIBIT"),
        0xE2 => Some("RE-LIGHT / RESET INHIBIT"),
        0xE3 => Some("START FUNCTION TEST"),
        0xE4 => Some("START DURATION TEST"),
        0xE5 => Some("STOP TEST"),
        0xE6 => Some("RESET FUNCTION TEST DONE FLAG"),
        0xE7 => Some("RESET DURATION TEST DONE FLAG"),
        0xE8 => Some("RESET LAMP TIME"),
        0xF1 => Some("QUERY BATTERY CHARGE"),
        0xFA => Some("QUERY EMERGENCY MODE"),
        0xFB => Some("QUERY FEATURES"),
        0xFC => Some("QUERY FAILURE STATUS"),
        0xFD => Some("QUERY EMERGENCY STATUS"),
        0xFF => Some("QUERY EXTENDED VERSION NUMBER"),
        _ => None,
    }
}

// iec62386-209 subset
fn colour_16(opcode: u8) -> Option<&'static str> {
    match opcode {
        0xE0 => Some("SET TEMPORARY X-COORDINATE (DTR)"),
        0xE1 => Some("SET TEMPORARY Y-COORDINATE (DTR)"),
        0xE2 => Some("ACTIVATE"),
        0xE7 => Some("SET TEMPORARY COLOUR TEMPERATURE (DTR)"),
        0xFF => Some("QUERY EXTENDED VERSION NUMBER"),
        _ => None,
    }
}

/// 16-bit special commands, keyed by the address byte; the opcode byte is
/// their operand
pub(crate) fn special_16(addr: u8, opcode: u8) -> Option<String> {
    let name = match addr {
        0xA1 => "TERMINATE".to_string(),
        0xA3 => format!("DTR0 0x{:02X}", opcode),
        0xA5 => format!("INITIALISE 0x{:02X}", opcode),
        0xA7 => "RANDOMISE".to_string(),
        0xA9 => "COMPARE".to_string(),
        0xAB => "WITHDRAW".to_string(),
        0xB1 => format!("SEARCHADDRH 0x{:02X}", opcode),
        0xB3 => format!("SEARCHADDRM 0x{:02X}", opcode),
        0xB5 => format!("SEARCHADDRL 0x{:02X}", opcode),
        0xB7 => format!("PROGRAM SHORT ADDRESS 0x{:02X}", opcode),
        0xB9 => format!("VERIFY SHORT ADDRESS 0x{:02X}", opcode),
        0xBB => "QUERY SHORT ADDRESS".to_string(),
        0xC1 => format!("ENABLE DEVICE TYPE {}", opcode),
        0xC3 => format!("DTR1 0x{:02X}", opcode),
        0xC5 => format!("DTR2 0x{:02X}", opcode),
        0xC7 => format!("WRITE MEMORY LOCATION 0x{:02X}", opcode),
        0xC9 => format!("WRITE MEMORY LOCATION 0x{:02X} - NO REPLY", opcode),
        _ => return None,
    };
    Some(name)
}

/// 24-bit control-device commands, sub-keyed by the instance byte
///
/// Only the device-addressed set (instance 0xFE) is populated; instance
/// commands fall through to the placeholder.
pub(crate) fn device_24(instance: u8, opcode: u8) -> Option<String> {
    if instance != 0xFE {
        return None;
    }
    let name = match opcode {
        0x00 => "IDENTIFY DEVICE",
        0x01 => "RESET POWER CYCLE SEEN",
        0x10 => "RESET",
        0x11 => "RESET MEMORY BANK (DTR0)",
        0x14 => "SET SHORT ADDRESS (DTR0)",
        0x15 => "ENABLE WRITE MEMORY",
        0x16 => "ENABLE APPLICATION CONTROLLER",
        0x17 => "DISABLE APPLICATION CONTROLLER",
        0x18 => "SET OPERATING MODE (DTR0)",
        0x30 => "QUERY DEVICE STATUS",
        0x31 => "QUERY APPLICATION CONTROLLER ERROR",
        0x32 => "QUERY INPUT DEVICE ERROR",
        0x33 => "QUERY MISSING SHORT ADDRESS",
        0x34 => "QUERY VERSION NUMBER",
        0x35 => "QUERY NUMBER OF INSTANCES",
        0x36 => "QUERY CONTENT DTR0",
        0x37 => "QUERY CONTENT DTR1",
        0x38 => "QUERY CONTENT DTR2",
        _ => return None,
    };
    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scene_and_group_ranges_carry_their_index() {
        assert_eq!(standard_16(0x10).as_deref(), Some("GO TO SCENE 0"));
        assert_eq!(standard_16(0x1F).as_deref(), Some("GO TO SCENE 15"));
        assert_eq!(standard_16(0x6A).as_deref(), Some("ADD TO GROUP 10"));
        assert_eq!(standard_16(0xB7).as_deref(), Some("QUERY SCENE LEVEL 7"));
    }

    #[test]
    fn test_device_type_selection() {
        // The same opcode resolves differently per device-type context
        assert_eq!(
            device_type_16(DeviceType::Led, 0xE0).as_deref(),
            Some("REFERENCE SYSTEM POWER")
        );
        assert_eq!(
            device_type_16(DeviceType::Emergency, 0xE0).as_deref(),
            Some("REST")
        );
        assert_eq!(
            device_type_16(DeviceType::Colour, 0xE0).as_deref(),
            Some("SET TEMPORARY X-COORDINATE (DTR)")
        );
        assert_eq!(device_type_16(DeviceType::None, 0xE0), None);
        assert_eq!(device_type_16(DeviceType::Other(42), 0xE0), None);
    }

    #[test]
    fn test_special_commands_embed_their_operand() {
        assert_eq!(special_16(0xA3, 0x2A).as_deref(), Some("DTR0 0x2A"));
        assert_eq!(
            special_16(0xC1, 6).as_deref(),
            Some("ENABLE DEVICE TYPE 6")
        );
        assert_eq!(special_16(0xA1, 0x00).as_deref(), Some("TERMINATE"));
        // Reserved special region has no entries
        assert_eq!(special_16(0xCD, 0x00), None);
    }

    #[test]
    fn test_device_commands_require_device_instance_byte() {
        assert_eq!(device_24(0xFE, 0x30).as_deref(), Some("QUERY DEVICE STATUS"));
        assert_eq!(device_24(0x00, 0x30), None);
    }
}
