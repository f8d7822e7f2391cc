//! # Transfer Application
//!
//! Binary that wires together all the components:
//! - Load configuration from environment
//! - Connect the SQLite store, the lock registry and the HTTP clients
//! - Start the signal worker driving payment execution and reversal
//! - Start the HTTP server

mod config;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use transfer_clients::{ProviderPaymentClient, WalletClient, build_http_client};
use transfer_hex::inbound::HttpServer;
use transfer_hex::signals::signal_channel;
use transfer_hex::{
    PaymentProcessingService, SignalWorker, TransferInitiationService, TransferReversalService,
};
use transfer_repo::{InMemoryLockRegistry, SqliteTransferRepo};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,transfer_app=debug,transfer_hex=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = config::Config::from_env()?;

    tracing::info!("Starting transfer server on port {}", config.port);
    tracing::info!("Using database: {}", config.database_url);

    // Outbound adapters: store, locks, wallet and provider clients
    let repo = Arc::new(SqliteTransferRepo::new(&config.database_url).await?);
    let locks = Arc::new(InMemoryLockRegistry::new(config.lock_ttl));

    let http = build_http_client(config.client_connect_timeout, config.client_read_timeout)?;
    let wallet = Arc::new(WalletClient::new(
        &config.wallet_base_url,
        config.platform_account.currency,
        http.clone(),
    ));
    let provider = Arc::new(ProviderPaymentClient::new(&config.payment_base_url, http));

    // Signal channel and the asynchronous services consuming it
    let (publisher, receiver) = signal_channel();

    let processing = Arc::new(PaymentProcessingService::new(
        repo.clone(),
        provider,
        locks.clone(),
        Arc::new(publisher.clone()),
        config.platform_account.clone(),
        config.max_retries,
        config.retry_delay_factor,
    ));
    let reversal = Arc::new(TransferReversalService::new(
        repo.clone(),
        wallet.clone(),
        locks.clone(),
    ));
    let worker = SignalWorker::new(
        processing,
        reversal,
        publisher.clone(),
        config.lock_retry_delay,
    );
    tokio::spawn(worker.run(receiver));

    // Synchronous initiation service behind the HTTP server
    let initiation = Arc::new(TransferInitiationService::new(
        repo.clone(),
        wallet,
        repo,
        locks,
        Arc::new(publisher),
        config.platform_account,
        config.fee_rate,
    ));

    let server = HttpServer::new(initiation);
    let addr = format!("0.0.0.0:{}", config.port);

    server.run(&addr).await?;

    Ok(())
}
