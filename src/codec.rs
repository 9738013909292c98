//! Conversions between domain values and the hex strings the unit exchanges.

pub const POWER_ON: &str = "01";
pub const POWER_OFF: &str = "00";

pub const SWING_AXIS_ON: &str = "0F0000";
pub const SWING_AXIS_OFF: &str = "000000";

/// Half-degree steps as one two's-complement byte, lower-case hex.
/// Values must lie within -64.0..=63.5.
pub fn encode_temperature(celsius: f64) -> String {
    let steps = (celsius * 2.0).round() as i8;
    format!("{:02x}", steps as u8)
}

/// Reads the first byte of `hex` as a signed value and divides it.
/// Setpoints and the outdoor sensor use a divisor of 2, the indoor sensor 1.
pub fn decode_temperature(hex: &str, divisor: f64) -> Option<f64> {
    let byte = u8::from_str_radix(hex.get(..2)?, 16).ok()?;
    Some(f64::from(byte as i8) / divisor)
}

/// Humidity is a plain unsigned hex integer over the whole string.
pub fn decode_humidity(hex: &str) -> Option<u32> {
    u32::from_str_radix(hex, 16).ok()
}

/// An axis reads as swinging when its value carries the `F` nibble
/// (`"0F0000"` on, `"000000"` off).
pub fn swing_axis_enabled(hex: &str) -> bool {
    hex.contains('F')
}

/// Lower-case, colon separated MAC. Unrecognised shapes are returned as-is.
pub fn format_mac(mac: &str) -> String {
    let is_hex = |s: &str| s.chars().all(|c| c.is_ascii_hexdigit());
    match mac.len() {
        17 if mac.matches(':').count() == 5 => mac.to_lowercase(),
        17 if mac.matches('-').count() == 5 => mac.replace('-', ":").to_lowercase(),
        14 if mac.matches('.').count() == 2 => {
            let bare = mac.replace('.', "");
            if is_hex(&bare) { colonize(&bare) } else { mac.to_string() }
        }
        12 if is_hex(mac) => colonize(mac),
        _ => mac.to_string(),
    }
}

fn colonize(bare: &str) -> String {
    bare.as_bytes()
        .chunks(2)
        .map(|pair| String::from_utf8_lossy(pair).to_lowercase())
        .collect::<Vec<_>>()
        .join(":")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_signed_temperatures() {
        assert_eq!(decode_temperature("00", 2.0), Some(0.0));
        assert_eq!(decode_temperature("C4", 2.0), Some(-30.0));
        assert_eq!(decode_temperature("2C", 2.0), Some(22.0));
        assert_eq!(decode_temperature("2d", 2.0), Some(22.5));
        assert_eq!(decode_temperature("FF", 2.0), Some(-0.5));
    }

    #[test]
    fn decode_uses_first_byte_only() {
        assert_eq!(decode_temperature("1600", 1.0), Some(22.0));
        assert_eq!(decode_temperature("EC00", 1.0), Some(-20.0));
    }

    #[test]
    fn decode_rejects_malformed() {
        assert_eq!(decode_temperature("", 2.0), None);
        assert_eq!(decode_temperature("2", 2.0), None);
        assert_eq!(decode_temperature("zz", 2.0), None);
    }

    #[test]
    fn encode_temperatures() {
        assert_eq!(encode_temperature(22.0), "2c");
        assert_eq!(encode_temperature(-30.0), "c4");
        assert_eq!(encode_temperature(22.5), "2d");
        assert_eq!(encode_temperature(0.0), "00");
    }

    #[test]
    fn encode_rounds_to_half_degrees() {
        assert_eq!(encode_temperature(22.3), "2d");
        assert_eq!(encode_temperature(22.2), "2c");
    }

    #[test]
    fn encode_then_decode_setpoints() {
        for celsius in [10.0, 18.5, 22.0, 30.0, -5.5] {
            let hex = encode_temperature(celsius);
            assert_eq!(decode_temperature(&hex, 2.0), Some(celsius));
        }
    }

    #[test]
    fn humidity_is_unsigned() {
        assert_eq!(decode_humidity("32"), Some(50));
        assert_eq!(decode_humidity("FF"), Some(255));
        assert_eq!(decode_humidity("xx"), None);
    }

    #[test]
    fn swing_axis_detection() {
        assert!(swing_axis_enabled(SWING_AXIS_ON));
        assert!(!swing_axis_enabled(SWING_AXIS_OFF));
        assert!(swing_axis_enabled("0F0100"));
    }

    #[test]
    fn mac_formats() {
        assert_eq!(format_mac("A1B2C3D4E5F6"), "a1:b2:c3:d4:e5:f6");
        assert_eq!(format_mac("A1-B2-C3-D4-E5-F6"), "a1:b2:c3:d4:e5:f6");
        assert_eq!(format_mac("A1:B2:C3:D4:E5:F6"), "a1:b2:c3:d4:e5:f6");
        assert_eq!(format_mac("a1b2.c3d4.e5f6"), "a1:b2:c3:d4:e5:f6");
        assert_eq!(format_mac("not-a-mac"), "not-a-mac");
    }
}
