//! Wallet service adapter.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use transfer_types::{
    Currency, Money, UserId, WalletBalance, WalletError, WalletGateway, WalletOperation,
    WalletTransaction, WalletTransactionId,
};

/// HTTP adapter for the wallet service.
///
/// The wallet reports balances without a currency, so the client stamps
/// them with the platform currency it was configured with.
pub struct WalletClient {
    base_url: String,
    currency: Currency,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct BalanceResponse {
    user_id: i64,
    balance: Decimal,
}

#[derive(Debug, Serialize)]
struct TransactionRequest {
    user_id: i64,
    // The wallet expects a JSON number, not the stringly default.
    #[serde(with = "rust_decimal::serde::float")]
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct TransactionResponse {
    wallet_transaction_id: i64,
    user_id: i64,
    amount: Decimal,
}

impl WalletClient {
    /// Creates a new wallet client.
    pub fn new(base_url: impl Into<String>, currency: Currency, http: Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            currency,
            http,
        }
    }
}

#[async_trait]
impl WalletGateway for WalletClient {
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    async fn balance(&self, user_id: UserId) -> Result<WalletBalance, WalletError> {
        let url = format!(
            "{}/wallets/balance?user_id={}",
            self.base_url,
            user_id.value()
        );
        let response = self.http.get(&url).send().await.map_err(map_transport)?;
        let body = read_success_body(response).await?;
        let parsed: BalanceResponse =
            serde_json::from_str(&body).map_err(|e| WalletError::InvalidBody(e.to_string()))?;

        Ok(WalletBalance {
            user_id: UserId::new(parsed.user_id),
            balance: Money::new(parsed.balance, self.currency),
        })
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id, amount = %amount))]
    async fn create_transaction(
        &self,
        user_id: UserId,
        amount: Money,
        operation: WalletOperation,
    ) -> Result<WalletTransaction, WalletError> {
        let request = TransactionRequest {
            user_id: user_id.value(),
            amount: signed_amount(amount.amount(), operation),
        };
        let url = format!("{}/wallets/transactions", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(map_transport)?;
        let body = read_success_body(response).await?;
        let parsed: TransactionResponse =
            serde_json::from_str(&body).map_err(|e| WalletError::InvalidBody(e.to_string()))?;

        Ok(WalletTransaction::new(
            WalletTransactionId::new(parsed.wallet_transaction_id),
            UserId::new(parsed.user_id),
            Money::new(parsed.amount, amount.currency()),
            operation,
        ))
    }
}

/// Signs the amount the way the wallet books the operation: withdrawals
/// negative, refunds positive.
fn signed_amount(amount: Decimal, operation: WalletOperation) -> Decimal {
    match operation {
        WalletOperation::Withdrawal => -amount.abs(),
        WalletOperation::Refund => amount.abs(),
    }
}

fn map_transport(err: reqwest::Error) -> WalletError {
    if err.is_timeout() {
        WalletError::Timeout
    } else {
        WalletError::Transport(err.to_string())
    }
}

async fn read_success_body(response: reqwest::Response) -> Result<String, WalletError> {
    let status = response.status();
    if status.is_success() {
        return response.text().await.map_err(map_transport);
    }
    Err(classify_status(status))
}

fn classify_status(status: StatusCode) -> WalletError {
    match status.as_u16() {
        400 => WalletError::InvalidRequest,
        404 => WalletError::UserNotFound,
        code if status.is_client_error() => WalletError::Client { status: code },
        code => WalletError::Upstream { status: code },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_withdrawals_are_sent_negative() {
        assert_eq!(
            signed_amount(dec!(1000), WalletOperation::Withdrawal),
            dec!(-1000)
        );
        assert_eq!(
            signed_amount(dec!(-1000), WalletOperation::Withdrawal),
            dec!(-1000)
        );
    }

    #[test]
    fn test_refunds_are_sent_positive() {
        assert_eq!(signed_amount(dec!(-1000), WalletOperation::Refund), dec!(1000));
        assert_eq!(signed_amount(dec!(1000), WalletOperation::Refund), dec!(1000));
    }

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            classify_status(StatusCode::BAD_REQUEST),
            WalletError::InvalidRequest
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND),
            WalletError::UserNotFound
        ));
        assert!(matches!(
            classify_status(StatusCode::CONFLICT),
            WalletError::Client { status: 409 }
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY),
            WalletError::Upstream { status: 502 }
        ));
    }

    #[test]
    fn test_balance_body_parses() {
        let parsed: BalanceResponse =
            serde_json::from_str(r#"{"user_id": 10, "balance": 2500}"#).unwrap();
        assert_eq!(parsed.user_id, 10);
        assert_eq!(parsed.balance, dec!(2500));
    }

    #[test]
    fn test_transaction_request_sends_numeric_amount() {
        let request = TransactionRequest {
            user_id: 10,
            amount: dec!(-1000),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["user_id"], 10);
        assert!(json["amount"].is_number());
        assert_eq!(json["amount"].as_f64(), Some(-1000.0));
    }
}
