//! Simple TOML parser for machine configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! the gantry configuration. It does NOT support all of TOML.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - Flat integer arrays: `rows = [10, 20, 30]`
//! - [section] and [section.subsection] headers
//! - Comments (# ...)
//!
//! NOT supported:
//! - Multi-line strings or arrays
//! - Inline tables
//! - Dotted keys outside section headers

use medpick_core::config::{MachineConfig, ReturnPolicy, COLUMN_COUNT, ROW_COUNT};
use medpick_core::motion::AxisId;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not valid in the current section
    UnknownKey,
    /// Line is not `key = value`
    InvalidLine,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Array has the wrong number of entries
    InvalidArray,
}

/// A parse error and the 1-based line it occurred on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConfigError {
    pub line: usize,
    pub kind: ParseError,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Axis(AxisId),
    Driver(AxisId),
    Calibration,
    Safety,
    Grid,
    Serial,
}

/// Parse TOML configuration into MachineConfig
///
/// Keys that are absent keep their defaults.
pub fn parse_config(input: &str) -> Result<MachineConfig, ConfigError> {
    let mut config = MachineConfig::new();
    let mut section = Section::Root;

    for (index, raw) in input.lines().enumerate() {
        let line = strip_comment(raw).trim();
        let error = |kind| ConfigError {
            line: index + 1,
            kind,
        };

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1]).map_err(error)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(error(ParseError::InvalidLine))?;
        apply_value(section, key, value, &mut config).map_err(error)?;
    }

    Ok(config)
}

/// Parse section header like "horizontal" or "vertical.driver"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "horizontal" => Ok(Section::Axis(AxisId::Horizontal)),
        "vertical" => Ok(Section::Axis(AxisId::Vertical)),
        "horizontal.driver" => Ok(Section::Driver(AxisId::Horizontal)),
        "vertical.driver" => Ok(Section::Driver(AxisId::Vertical)),
        "calibration" => Ok(Section::Calibration),
        "safety" => Ok(Section::Safety),
        "grid" => Ok(Section::Grid),
        "serial" => Ok(Section::Serial),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing comment unless the `#` sits inside a string
fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(hash_pos) if line[..hash_pos].matches('"').count() % 2 == 0 => &line[..hash_pos],
        _ => line,
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut MachineConfig,
) -> Result<(), ParseError> {
    match section {
        Section::Root => match key {
            "require_handshake" => config.require_handshake = parse_bool(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Axis(id) => {
            let axis = config.axis_mut(id);
            match key {
                "max_speed" => axis.max_speed = parse_float(value)?,
                "acceleration" => axis.acceleration = parse_float(value)?,
                "homing_speed" => axis.homing_speed = parse_float(value)?,
                "homing_acceleration" => axis.homing_acceleration = parse_float(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Driver(id) => {
            let driver = config.driver_mut(id);
            match key {
                "enable_inverted" => driver.enable_inverted = parse_bool(value)?,
                "dir_inverted" => driver.dir_inverted = parse_bool(value)?,
                "step_pulse_us" => driver.step_pulse_us = parse_int(value)?,
                "limit_active_low" => driver.limit_active_low = parse_bool(value)?,
                _ => return Err(ParseError::UnknownKey),
            }
        }
        Section::Calibration => match key {
            "homing_distance" => config.calibration.homing_distance = parse_int(value)?,
            "homing_timeout_ms" => config.calibration.homing_timeout_ms = parse_int(value)?,
            "return_policy" => config.calibration.return_policy = parse_return_policy(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Safety => match key {
            "limit_debounce_samples" => config.safety.limit_debounce_samples = parse_int(value)?,
            "monitor_limits" => config.safety.monitor_limits = parse_bool(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Grid => match key {
            "rows" => config.grid.rows = parse_int_array::<ROW_COUNT>(value)?,
            "columns" => config.grid.columns = parse_int_array::<COLUMN_COUNT>(value)?,
            "drop_off_horizontal" => config.grid.drop_off.horizontal = parse_int(value)?,
            "drop_off_vertical" => config.grid.drop_off.vertical = parse_int(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
        Section::Serial => match key {
            "baud_rate" => config.serial.baud_rate = parse_int(value)?,
            _ => return Err(ParseError::UnknownKey),
        },
    }
    Ok(())
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    strip_underscores(value)?
        .parse()
        .map_err(|_| ParseError::InvalidValue)
}

/// Parse a float value; integers are accepted
fn parse_float(value: &str) -> Result<f32, ParseError> {
    let parsed: f32 = value.parse().map_err(|_| ParseError::InvalidValue)?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(ParseError::InvalidValue)
    }
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse return policy
fn parse_return_policy(value: &str) -> Result<ReturnPolicy, ParseError> {
    match parse_string(value) {
        "zero" | "Zero" => Ok(ReturnPolicy::Zero),
        "midpoint" | "Midpoint" => Ok(ReturnPolicy::Midpoint),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a flat array with exactly `N` integers, e.g. "[10, 20, 30]"
fn parse_int_array<const N: usize>(value: &str) -> Result<[i32; N], ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidArray)?;

    let mut out = [0i32; N];
    let mut count = 0;
    for item in inner.split(',') {
        let item = item.trim();
        if item.is_empty() {
            // Trailing comma
            continue;
        }
        let slot = out.get_mut(count).ok_or(ParseError::InvalidArray)?;
        *slot = parse_int(item)?;
        count += 1;
    }

    if count == N {
        Ok(out)
    } else {
        Err(ParseError::InvalidArray)
    }
}

/// Copy a numeric literal without TOML digit separators (`100_000`)
fn strip_underscores(value: &str) -> Result<heapless::String<24>, ParseError> {
    let mut out = heapless::String::new();
    for c in value.chars().filter(|c| *c != '_') {
        out.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use medpick_core::motion::Position;

    const SAMPLE: &str = r#"
# Gantry configuration
require_handshake = false

[horizontal]
max_speed = 2000
acceleration = 800.5
homing_speed = 400     # slow approach

[vertical.driver]
dir_inverted = true
step_pulse_us = 5

[calibration]
homing_distance = 120_000
return_policy = "midpoint"

[safety]
limit_debounce_samples = 3

[grid]
rows = [100, 200, 300]
columns = [1, 2, 3, 4, 5, 6, 7, 8,]
drop_off_horizontal = 1500
drop_off_vertical = 4500

[serial]
baud_rate = 57600
"#;

    #[test]
    fn test_parse_sample() {
        let config = parse_config(SAMPLE).unwrap();

        assert!(!config.require_handshake);
        assert_eq!(config.horizontal.max_speed, 2000.0);
        assert_eq!(config.horizontal.acceleration, 800.5);
        assert_eq!(config.horizontal.homing_speed, 400.0);
        assert!(config.vertical_driver.dir_inverted);
        assert_eq!(config.vertical_driver.step_pulse_us, 5);
        assert_eq!(config.calibration.homing_distance, 120_000);
        assert_eq!(config.calibration.return_policy, ReturnPolicy::Midpoint);
        assert_eq!(config.safety.limit_debounce_samples, 3);
        assert_eq!(config.grid.rows, [100, 200, 300]);
        assert_eq!(config.grid.columns, [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(config.grid.drop_off, Position::new(1500, 4500));
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_missing_keys_keep_defaults() {
        let config = parse_config("[vertical]\nmax_speed = 10\n").unwrap();
        assert_eq!(config.vertical.max_speed, 10.0);
        assert_eq!(config.horizontal, MachineConfig::default().horizontal);
    }

    #[test]
    fn test_error_reports_line() {
        let err = parse_config("[grid]\n\nrows = [1, 2]\n").unwrap_err();
        assert_eq!(
            err,
            ConfigError {
                line: 3,
                kind: ParseError::InvalidArray
            }
        );

        let err = parse_config("[spindle]\n").unwrap_err();
        assert_eq!(err.kind, ParseError::InvalidSection);

        let err = parse_config("[safety]\nfan = true\n").unwrap_err();
        assert_eq!(err.kind, ParseError::UnknownKey);

        let err = parse_config("[serial]\nbaud_rate\n").unwrap_err();
        assert_eq!(err.kind, ParseError::InvalidLine);
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(parse_bool("yes"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u8>("300"), Err(ParseError::InvalidValue));
        assert_eq!(parse_float("inf"), Err(ParseError::InvalidValue));
        assert_eq!(parse_return_policy("\"home\""), Err(ParseError::InvalidValue));
        assert_eq!(parse_int_array::<3>("[1, 2, 3, 4]"), Err(ParseError::InvalidArray));
        assert_eq!(parse_int_array::<3>("1, 2, 3"), Err(ParseError::InvalidArray));
    }

    #[test]
    fn test_hash_inside_string_is_kept() {
        assert_eq!(strip_comment("a = \"x#y\""), "a = \"x#y\"");
        assert_eq!(strip_comment("a = 1 # note"), "a = 1 ");
    }
}
