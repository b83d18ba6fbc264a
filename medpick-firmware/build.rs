//! Build script for medpick-firmware
//!
//! - Sets up linker search paths and scripts for memory.x
//! - Validates machine.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Rows and columns in the slot grid
const ROW_COUNT: usize = 3;
const COLUMN_COUNT: usize = 8;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR not set"));

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x");
    f.write_all(memory_x).expect("write memory.x");

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate machine.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=machine.toml");

    let config_path = Path::new("machine.toml");

    if !config_path.exists() {
        fail(
            "machine.toml not found",
            &["The firmware embeds machine.toml from the medpick-firmware directory.".to_string()],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read machine.toml", &[e.to_string()]),
    };

    let config: toml::Value = match toml::from_str(&content) {
        Ok(value) => value,
        Err(e) => fail(
            "Invalid TOML syntax in machine.toml",
            &e.to_string().lines().map(str::to_string).collect::<Vec<_>>(),
        ),
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_axes(&config, &mut errors);
    validate_calibration(&config, &mut errors);
    validate_grid(&config, &mut errors);
    validate_serial(&config, &mut errors);

    if !errors.is_empty() {
        fail("Invalid machine configuration", &errors);
    }

    println!("cargo:warning=machine.toml validated successfully");
}

/// Print a boxed error report and abort the build
fn fail(title: &str, lines: &[String]) -> ! {
    let body = lines
        .iter()
        .map(|line| {
            let truncated = if line.len() > 62 {
                format!("{}...", &line[..59])
            } else {
                line.clone()
            };
            format!("║  • {:<62} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}

/// Only the sections the firmware parser understands are allowed
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };

    for (name, value) in root {
        match (name.as_str(), value) {
            ("require_handshake", toml::Value::Boolean(_)) => {}
            ("require_handshake", _) => errors.push("require_handshake must be a boolean".into()),
            ("horizontal" | "vertical" | "calibration" | "safety" | "grid" | "serial", toml::Value::Table(_)) => {}
            (other, _) => errors.push(format!("unknown top-level entry '{}'", other)),
        }
    }
}

fn number(value: &toml::Value) -> Option<f64> {
    match value {
        toml::Value::Integer(i) => Some(*i as f64),
        toml::Value::Float(f) => Some(*f),
        _ => None,
    }
}

/// Validate [horizontal] and [vertical] motion profiles
fn validate_axes(config: &toml::Value, errors: &mut Vec<String>) {
    for axis in ["horizontal", "vertical"] {
        let Some(table) = config.get(axis).and_then(|a| a.as_table()) else {
            continue;
        };

        for key in ["max_speed", "acceleration", "homing_speed", "homing_acceleration"] {
            if let Some(value) = table.get(key) {
                match number(value) {
                    Some(v) if v > 0.0 => {}
                    _ => errors.push(format!("[{}] {} must be a positive number", axis, key)),
                }
            }
        }

        if let Some(toml::Value::Table(driver)) = table.get("driver") {
            if let Some(value) = driver.get("step_pulse_us") {
                match value.as_integer() {
                    Some(us) if (1..=100).contains(&us) => {}
                    _ => errors.push(format!("[{}.driver] step_pulse_us must be 1-100", axis)),
                }
            }
        }
    }
}

/// Validate [calibration] and [safety]
fn validate_calibration(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(table) = config.get("calibration").and_then(|c| c.as_table()) {
        if let Some(value) = table.get("homing_distance") {
            match value.as_integer() {
                Some(d) if d > 0 && d <= i32::MAX as i64 => {}
                _ => errors.push("[calibration] homing_distance must be a positive step count".into()),
            }
        }
        if let Some(value) = table.get("homing_timeout_ms") {
            match value.as_integer() {
                Some(ms) if ms > 0 && ms <= u32::MAX as i64 => {}
                _ => errors.push("[calibration] homing_timeout_ms must be positive".into()),
            }
        }
        if let Some(value) = table.get("return_policy") {
            if !matches!(value.as_str(), Some("zero" | "midpoint")) {
                errors.push("[calibration] return_policy must be 'zero' or 'midpoint'".into());
            }
        }
    }

    if let Some(table) = config.get("safety").and_then(|s| s.as_table()) {
        if let Some(value) = table.get("limit_debounce_samples") {
            match value.as_integer() {
                Some(n) if (1..=255).contains(&n) => {}
                _ => errors.push("[safety] limit_debounce_samples must be 1-255".into()),
            }
        }
    }
}

/// Validate [grid] table sizes
fn validate_grid(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(table) = config.get("grid").and_then(|g| g.as_table()) else {
        return;
    };

    for (key, len) in [("rows", ROW_COUNT), ("columns", COLUMN_COUNT)] {
        if let Some(value) = table.get(key) {
            match value.as_array() {
                Some(items) if items.len() == len && items.iter().all(|i| i.is_integer()) => {}
                _ => errors.push(format!("[grid] {} must be an array of {} integers", key, len)),
            }
        }
    }

    for key in ["drop_off_horizontal", "drop_off_vertical"] {
        if let Some(value) = table.get(key) {
            if !value.is_integer() {
                errors.push(format!("[grid] {} must be an integer", key));
            }
        }
    }
}

/// Validate [serial]
fn validate_serial(config: &toml::Value, errors: &mut Vec<String>) {
    if let Some(value) = config.get("serial").and_then(|s| s.get("baud_rate")) {
        match value.as_integer() {
            Some(baud) if baud > 0 && baud <= 4_000_000 => {}
            _ => errors.push("[serial] baud_rate must be 1-4000000".into()),
        }
    }
}
