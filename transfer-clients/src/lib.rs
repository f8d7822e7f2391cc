//! # Transfer Clients
//!
//! Outbound HTTP adapters for the transfer service: the wallet holding the
//! user's funds and the payment provider executing bank payouts. Both run
//! on one shared `reqwest` client so connect and read timeouts are applied
//! uniformly.

pub mod provider;
pub mod wallet;

pub use provider::ProviderPaymentClient;
pub use wallet::WalletClient;

use std::time::Duration;

/// Builds the HTTP client shared by both adapters.
///
/// The read timeout bounds the whole request; a request exceeding it
/// surfaces as a timeout error, which the services treat as retryable.
pub fn build_http_client(
    connect_timeout: Duration,
    read_timeout: Duration,
) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(read_timeout)
        .build()
}
