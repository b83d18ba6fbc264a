//! Control task
//!
//! Owns the [`Controller`] and both axes. While anything is moving the
//! task spins: it drains pending lines, ticks the controller and yields,
//! so a `STOP` is handled before the next step pulse. With nothing to do
//! it sleeps until the next line arrives.

use defmt::*;
use embassy_futures::yield_now;
use embassy_rp::gpio::{Input, Output};
use embassy_time::{Delay, Instant};

use medpick_core::traits::Axis;
use medpick_core::Controller;
use medpick_drivers::stepper::StepperAxis;

use crate::channels::{LineEvent, LINE_CHANNEL, RESPONSE_CHANNEL};

/// Horizontal (column) axis on the board
pub type HorizontalAxis =
    StepperAxis<Output<'static>, Output<'static>, Output<'static>, Delay, Input<'static>, Input<'static>>;

/// Vertical (row) axis on the board
pub type VerticalAxis =
    StepperAxis<Output<'static>, Output<'static>, Output<'static>, Delay, Input<'static>, Input<'static>>;

/// Control task - command dispatch and motion
#[embassy_executor::task]
pub async fn control_task(mut controller: Controller<HorizontalAxis, VerticalAxis>) {
    info!("Control task started in {}", controller.state());

    loop {
        if !is_active(&controller) {
            // Idle: nothing to tick until the host says something
            let event = LINE_CHANNEL.receive().await;
            handle_event(&mut controller, event);
            flush_responses(&mut controller);
            continue;
        }

        while let Ok(event) = LINE_CHANNEL.try_receive() {
            handle_event(&mut controller, event);
        }

        controller.tick(Instant::now().as_micros());
        flush_responses(&mut controller);

        yield_now().await;
    }
}

fn is_active(controller: &Controller<HorizontalAxis, VerticalAxis>) -> bool {
    controller.is_busy() || controller.horizontal().is_running() || controller.vertical().is_running()
}

fn handle_event(controller: &mut Controller<HorizontalAxis, VerticalAxis>, event: LineEvent) {
    match event {
        LineEvent::Line(line) => controller.handle_line(line.as_str(), Instant::now().as_micros()),
        LineEvent::Error(e) => controller.handle_line_error(e),
    }
}

fn flush_responses(controller: &mut Controller<HorizontalAxis, VerticalAxis>) {
    while let Some(response) = controller.poll_response() {
        if let Some(code) = response.error_code() {
            warn!("{} error: {}", code.class(), response.to_line().as_str());
        } else {
            debug!("{}", response.to_line().as_str());
        }

        if RESPONSE_CHANNEL.try_send(response.to_line()).is_err() {
            warn!("Response channel full, dropping response");
        }
    }
}
