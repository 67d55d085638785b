mod config;
mod contract;
mod error;
mod event_decoder;
mod poller;

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::contract::ContractClient;
use crate::event_decoder::EventDecoder;
use crate::poller::Poller;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Load configuration first, then bring up logging at the configured level
    let config = Config::load()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).compact().init();

    info!("Price alert service starting");

    let client = ContractClient::connect(&config).await?;
    info!("Blockchain client initialized with wallet: {:?}", client.wallet_address());
    info!("Watching contract {} via {}", client.address(), config.rpc_url);

    let block_number = client.check_connection().await?;
    info!("Connected to RPC endpoint at block {}", block_number);

    let decoder = EventDecoder::new(client.abi());
    info!("Loaded ABI with {} decodable events", decoder.event_count());

    let poller = Poller::new(
        Arc::new(client),
        Arc::new(decoder),
        config.threshold()?,
        config.poll_interval(),
    );
    poller.run().await;

    info!("Price alert service stopped");
    Ok(())
}
