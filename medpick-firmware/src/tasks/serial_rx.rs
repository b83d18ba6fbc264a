//! Host UART receive task
//!
//! Assembles lines from the host and forwards them to the control task.

use defmt::*;
use embassy_rp::uart::BufferedUartRx;
use embedded_io_async::Read;

use medpick_protocol::LineReader;

use crate::channels::{LineEvent, LINE_CHANNEL};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

/// Serial RX task - splits the byte stream into lines
#[embassy_executor::task]
pub async fn serial_rx_task(mut rx: BufferedUartRx) {
    info!("Serial RX task started");

    let mut reader = LineReader::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match rx.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                let mut pending = &buf[..n];
                while !pending.is_empty() {
                    let (used, result) = reader.feed_bytes(pending);
                    pending = &pending[used..];
                    match result {
                        Ok(Some(line)) => {
                            debug!("Line: {}", line.as_str());
                            LINE_CHANNEL.send(LineEvent::Line(line)).await;
                        }
                        Ok(None) => {
                            // Need more bytes
                        }
                        Err(e) => {
                            warn!("Dropped line: {:?}", e);
                            LINE_CHANNEL.send(LineEvent::Error(e)).await;
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
                reader.reset();
            }
        }
    }
}
