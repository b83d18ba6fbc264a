//! Host UART transmit task
//!
//! Writes controller responses to the host, one per line.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::RESPONSE_CHANNEL;

/// Serial TX task - sends queued responses terminated by `\n`
#[embassy_executor::task]
pub async fn serial_tx_task(mut tx: BufferedUartTx) {
    info!("Serial TX task started");

    loop {
        let line = RESPONSE_CHANNEL.receive().await;

        if let Err(e) = tx.write_all(line.as_bytes()).await {
            warn!("Failed to send response: {:?}", e);
            continue;
        }
        if let Err(e) = tx.write_all(b"\n").await {
            warn!("Failed to send terminator: {:?}", e);
        }
        trace!("TX: {}", line.as_str());
    }
}
