use std::sync::Arc;
use std::time::Duration;

use alloy::consensus::TxReceipt;
use alloy_primitives::U256;
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::contract::ContractClient;
use crate::error::Result;
use crate::event_decoder::{DecodedLog, EventDecoder};

/// Drives the poll-and-check cycle: one tick per interval, each tick
/// submits a price check, awaits confirmation, and reports the emitted
/// events.
pub struct Poller {
    client: Arc<ContractClient>,
    decoder: Arc<EventDecoder>,
    threshold: U256,
    poll_interval: Duration,
}

impl Poller {
    pub fn new(
        client: Arc<ContractClient>,
        decoder: Arc<EventDecoder>,
        threshold: U256,
        poll_interval: Duration,
    ) -> Self {
        Self {
            client,
            decoder,
            threshold,
            poll_interval,
        }
    }

    /// Run until a shutdown signal arrives. Ticks are spawned as
    /// independent tasks, so a tick outlasting the interval does not delay
    /// the next one.
    pub async fn run(self) {
        let mut ticker = interval(self.poll_interval);

        info!(
            "Polling every {:?} with threshold {}",
            self.poll_interval, self.threshold
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let client = Arc::clone(&self.client);
                    let decoder = Arc::clone(&self.decoder);
                    let threshold = self.threshold;

                    tokio::spawn(async move {
                        // Tick failures are logged and swallowed; the next
                        // scheduled tick is the retry
                        if let Err(e) = run_tick(client, decoder, threshold).await {
                            error!("Error: {}", e);
                        }
                    });
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Shutdown signal received, stopping poller");
                    break;
                }
            }
        }
    }
}

async fn run_tick(
    client: Arc<ContractClient>,
    decoder: Arc<EventDecoder>,
    threshold: U256,
) -> Result<()> {
    let pending = client.submit_price_check(threshold).await?;
    info!("Checking price... tx: {}", pending.tx_hash());

    let receipt = client.confirm(pending).await?;

    for log in receipt.inner.logs() {
        match decoder.decode_log(&log.inner) {
            DecodedLog::Decoded(event) => {
                info!("EVENT → {}", event.name);
                info!("  {}", event.format_params());
                debug!("{}", event.to_json());
            }
            // Log belongs to another source, not an error
            DecodedLog::Unrecognized => {}
        }
    }

    Ok(())
}
