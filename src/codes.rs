//! Fixed mappings between domain enums and dsiot codes / attribute names.
//!
//! Encoding is an exhaustive `match`; decoding scans the enum's `ALL` list
//! through the same `match`, so every table is its own inverse.

use crate::types::{FanMode, HvacMode};
use crate::{Error, Result};

/// Mode code written to `e_3001/p_01`. `Off` is a power attribute, not a mode.
pub fn mode_code(mode: HvacMode) -> Option<&'static str> {
    match mode {
        HvacMode::Off => None,
        HvacMode::Auto => Some("0300"),
        HvacMode::Cool => Some("0200"),
        HvacMode::Heat => Some("0100"),
        HvacMode::FanOnly => Some("0000"),
        HvacMode::Dry => Some("0500"),
    }
}

pub fn mode_from_code(code: &str) -> Result<HvacMode> {
    HvacMode::ALL
        .into_iter()
        .find(|m| mode_code(*m) == Some(code))
        .ok_or_else(|| Error::UnknownCode {
            table: "hvac mode",
            code: code.to_string(),
        })
}

pub fn fan_code(mode: FanMode) -> &'static str {
    match mode {
        FanMode::Auto => "0A00",
        FanMode::Quiet => "0B00",
        FanMode::Level1 => "0300",
        FanMode::Level2 => "0400",
        FanMode::Level3 => "0500",
        FanMode::Level4 => "0600",
        FanMode::Level5 => "0700",
    }
}

pub fn fan_from_code(code: &str) -> Result<FanMode> {
    FanMode::ALL
        .into_iter()
        .find(|m| fan_code(*m) == code)
        .ok_or_else(|| Error::UnknownCode {
            table: "fan mode",
            code: code.to_string(),
        })
}

/// (vertical, horizontal) swing attribute names.
pub fn swing_attrs(mode: HvacMode) -> Option<(&'static str, &'static str)> {
    match mode {
        HvacMode::Auto => Some(("p_20", "p_21")),
        HvacMode::Cool => Some(("p_05", "p_06")),
        HvacMode::Heat => Some(("p_07", "p_08")),
        HvacMode::FanOnly => Some(("p_24", "p_25")),
        HvacMode::Dry => Some(("p_22", "p_23")),
        HvacMode::Off => None,
    }
}

/// Dry mode has no fan speed attribute; the unit always runs it on auto.
pub fn fan_speed_attr(mode: HvacMode) -> Option<&'static str> {
    match mode {
        HvacMode::Auto => Some("p_26"),
        HvacMode::Cool => Some("p_09"),
        HvacMode::Heat => Some("p_0A"),
        HvacMode::FanOnly => Some("p_28"),
        HvacMode::Dry | HvacMode::Off => None,
    }
}

pub fn target_temp_attr(mode: HvacMode) -> Option<&'static str> {
    match mode {
        HvacMode::Cool => Some("p_02"),
        HvacMode::Heat => Some("p_03"),
        HvacMode::Auto => Some("p_1D"),
        HvacMode::Dry | HvacMode::FanOnly | HvacMode::Off => None,
    }
}

/// Checks that every code decodes back to the value it was encoded from
/// and that no two values share a code.
pub fn tables_consistent() -> bool {
    let modes_ok = HvacMode::ALL.into_iter().all(|m| match mode_code(m) {
        Some(code) => mode_from_code(code).ok() == Some(m),
        None => m == HvacMode::Off,
    });
    let fans_ok = FanMode::ALL
        .into_iter()
        .all(|m| fan_from_code(fan_code(m)).ok() == Some(m));
    modes_ok && fans_ok
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_inverse() {
        assert!(tables_consistent());
    }

    #[test]
    fn mode_codes() {
        assert_eq!(mode_code(HvacMode::Cool), Some("0200"));
        assert_eq!(mode_code(HvacMode::Off), None);
        assert_eq!(mode_from_code("0500").unwrap(), HvacMode::Dry);
        assert_eq!(mode_from_code("0000").unwrap(), HvacMode::FanOnly);
    }

    #[test]
    fn unknown_mode_code() {
        let err = mode_from_code("0900").unwrap_err();
        assert!(matches!(err, Error::UnknownCode { table: "hvac mode", .. }));
    }

    #[test]
    fn fan_codes() {
        assert_eq!(fan_code(FanMode::Quiet), "0B00");
        assert_eq!(fan_from_code("0700").unwrap(), FanMode::Level5);
        assert!(matches!(
            fan_from_code("0800"),
            Err(Error::UnknownCode { table: "fan mode", .. })
        ));
    }

    #[test]
    fn mode_dependent_attributes() {
        assert_eq!(fan_speed_attr(HvacMode::Dry), None);
        assert_eq!(fan_speed_attr(HvacMode::Heat), Some("p_0A"));
        assert_eq!(target_temp_attr(HvacMode::FanOnly), None);
        assert_eq!(target_temp_attr(HvacMode::Auto), Some("p_1D"));
        assert_eq!(swing_attrs(HvacMode::Cool), Some(("p_05", "p_06")));
        assert_eq!(swing_attrs(HvacMode::Off), None);
    }
}
