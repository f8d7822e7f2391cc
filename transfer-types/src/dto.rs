//! Request and response payloads for the inbound HTTP API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{WalletOperation, WalletTransaction};
use crate::error::ErrorCode;

/// Request to move money from a user's wallet to their bank account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransferRequest {
    pub user_id: i64,
    pub amount: Decimal,
}

/// Externally visible status of the wallet movement a transfer caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Processing,
    Failed,
    Completed,
}

/// Response returned when a transfer was accepted.
///
/// Describes the withdrawal that moved the user's money; the payout itself
/// continues asynchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub transaction_id: i64,
    pub user_id: i64,
    // Serialized as a JSON number, not the stringly default.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub created: DateTime<Utc>,
    pub operation: WalletOperation,
    pub status: TransactionStatus,
}

impl TransactionResponse {
    pub fn from_withdrawal(status: TransactionStatus, withdrawal: &WalletTransaction) -> Self {
        Self {
            transaction_id: withdrawal.id().value(),
            user_id: withdrawal.user_id().value(),
            amount: withdrawal.amount().amount(),
            created: withdrawal.created_at(),
            operation: withdrawal.operation(),
            status,
        }
    }
}

/// Error body returned by the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorCode,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
