//! Configuration loading from environment.

use std::env;
use std::time::Duration;

use rust_decimal::Decimal;

use transfer_types::{AccountNumber, AccountType, Currency, PlatformAccount, RoutingNumber};

/// Application configuration.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub wallet_base_url: String,
    pub payment_base_url: String,
    pub client_connect_timeout: Duration,
    pub client_read_timeout: Duration,
    pub fee_rate: Decimal,
    pub max_retries: u32,
    pub retry_delay_factor: Duration,
    pub lock_ttl: Duration,
    pub lock_retry_delay: Duration,
    pub platform_account: PlatformAccount,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse()?;

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let wallet_base_url = env::var("WALLET_BASE_URL")
            .map_err(|_| anyhow::anyhow!("WALLET_BASE_URL environment variable is required"))?;
        let payment_base_url = env::var("PAYMENT_BASE_URL")
            .map_err(|_| anyhow::anyhow!("PAYMENT_BASE_URL environment variable is required"))?;

        let client_connect_timeout = Duration::from_millis(
            env::var("CLIENT_CONNECT_TIMEOUT_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
        );
        let client_read_timeout = Duration::from_millis(
            env::var("CLIENT_READ_TIMEOUT_MS")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()?,
        );

        let fee_rate =
            parse_fee_rate(&env::var("TRANSFER_FEE_RATE").unwrap_or_else(|_| "0.10".to_string()))?;

        let max_retries = env::var("PAYMENT_MAX_RETRIES")
            .unwrap_or_else(|_| "2".to_string())
            .parse()?;
        let retry_delay_factor = Duration::from_secs(
            env::var("PAYMENT_RETRY_DELAY_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()?,
        );

        let lock_ttl = Duration::from_secs(
            env::var("LOCK_TTL_SECS")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,
        );
        let lock_retry_delay = Duration::from_millis(
            env::var("LOCK_RETRY_DELAY_MS")
                .unwrap_or_else(|_| "500".to_string())
                .parse()?,
        );

        let platform_account = PlatformAccount {
            account_name: env::var("PLATFORM_ACCOUNT_NAME")
                .unwrap_or_else(|_| "TRANSFERS PLATFORM INC".to_string()),
            account_number: AccountNumber::new(
                env::var("PLATFORM_ACCOUNT_NUMBER").unwrap_or_else(|_| "0245253419".to_string()),
            ),
            routing_number: RoutingNumber::new(
                env::var("PLATFORM_ROUTING_NUMBER").unwrap_or_else(|_| "028444018".to_string()),
            ),
            currency: env::var("PLATFORM_ACCOUNT_CURRENCY")
                .unwrap_or_else(|_| "USD".to_string())
                .parse::<Currency>()?,
            account_type: AccountType::Company,
        };

        Ok(Self {
            port,
            database_url,
            wallet_base_url,
            payment_base_url,
            client_connect_timeout,
            client_read_timeout,
            fee_rate,
            max_retries,
            retry_delay_factor,
            lock_ttl,
            lock_retry_delay,
            platform_account,
        })
    }
}

/// Parses the platform fee rate, which must be a fraction within `[0, 1)`.
fn parse_fee_rate(raw: &str) -> anyhow::Result<Decimal> {
    let rate = raw
        .parse::<Decimal>()
        .map_err(|_| anyhow::anyhow!("TRANSFER_FEE_RATE must be a decimal, got {:?}", raw))?;
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        anyhow::bail!("TRANSFER_FEE_RATE must be within [0, 1), got {}", rate);
    }
    Ok(rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fee_rate_within_range_parses() {
        assert_eq!(parse_fee_rate("0.10").unwrap(), dec!(0.10));
        assert_eq!(parse_fee_rate("0").unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_fee_rate_of_one_or_more_is_rejected() {
        let err = parse_fee_rate("1.0").unwrap_err();
        assert!(err.to_string().contains("within [0, 1)"));

        assert!(parse_fee_rate("2.5").is_err());
    }

    #[test]
    fn test_negative_fee_rate_is_rejected() {
        assert!(parse_fee_rate("-0.01").is_err());
    }

    #[test]
    fn test_non_numeric_fee_rate_is_rejected() {
        let err = parse_fee_rate("ten percent").unwrap_err();
        assert!(err.to_string().contains("TRANSFER_FEE_RATE"));
    }
}
