//! medpick - Medication Dispenser Gantry Firmware
//!
//! Main firmware binary for RP2040-based stepper boards (pin map for the
//! BTT SKR Pico). Drives a horizontal and a vertical axis from a
//! line-oriented serial protocol on UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use medpick_core::config::MachineConfig;
use medpick_core::Controller;
use medpick_drivers::stepper::StepperAxis;

use crate::config::parse_config;

/// Embedded configuration (compiled into firmware)
/// Edit machine.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../machine.toml");

mod channels;
mod config;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("medpick firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // Setup UART0 for the host link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.serial.baud_rate;

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();

    info!("UART initialized at {} baud", config.serial.baud_rate);

    // Pin assignments are board-specific (SKR Pico):
    // X driver STEP=GPIO11, DIR=GPIO10, EN=GPIO12; X-STOP GPIO4, Z-STOP GPIO25
    // Y driver STEP=GPIO6, DIR=GPIO5, EN=GPIO7; Y-STOP GPIO3, E0-STOP GPIO16
    let pull = |active_low: bool| if active_low { Pull::Up } else { Pull::Down };

    let h_driver = config.horizontal_driver;
    let horizontal = StepperAxis::new(
        Output::new(p.PIN_11, Level::Low),
        Output::new(p.PIN_10, Level::Low),
        Output::new(p.PIN_12, Level::High),
        Delay,
        Input::new(p.PIN_4, pull(h_driver.limit_active_low)),
        Input::new(p.PIN_25, pull(h_driver.limit_active_low)),
        h_driver,
    );

    let v_driver = config.vertical_driver;
    let vertical = StepperAxis::new(
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_5, Level::Low),
        Output::new(p.PIN_7, Level::High),
        Delay,
        Input::new(p.PIN_3, pull(v_driver.limit_active_low)),
        Input::new(p.PIN_16, pull(v_driver.limit_active_low)),
        v_driver,
    );

    info!("Stepper axes initialized");

    let controller = Controller::new(config, horizontal, vertical);

    // Spawn tasks
    spawner.spawn(tasks::serial_rx_task(rx)).unwrap();
    spawner.spawn(tasks::serial_tx_task(tx)).unwrap();
    spawner.spawn(tasks::control_task(controller)).unwrap();

    info!("All tasks spawned, firmware running");

    // Main task has nothing else to do - all work happens in spawned tasks
    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse and check the embedded configuration
///
/// Falls back to the built-in defaults if machine.toml does not parse or
/// describes a machine the controller cannot run.
fn load_config() -> MachineConfig {
    let config = match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => config,
        Err(e) => {
            // build.rs validates machine.toml, so this only happens when the
            // host-side checks and the firmware parser disagree
            error!("Failed to parse embedded config: {}", e);
            return MachineConfig::default();
        }
    };

    match config.validate() {
        Ok(()) => {
            info!("Parsed embedded configuration successfully");
            config
        }
        Err(e) => {
            error!("Embedded configuration rejected: {}", e);
            error!("Using built-in defaults");
            MachineConfig::default()
        }
    }
}
