//! Payment attempts against the payment provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{PaymentId, PaymentTransactionId};
use super::money::Money;
use crate::error::ParseValueError;

/// Status the payment provider reported for a payment request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Processing,
    Failed,
    Unknown,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            PaymentStatus::Processing => "PROCESSING",
            PaymentStatus::Failed => "FAILED",
            PaymentStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", status)
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PROCESSING" => Ok(PaymentStatus::Processing),
            "FAILED" => Ok(PaymentStatus::Failed),
            "UNKNOWN" => Ok(PaymentStatus::Unknown),
            _ => Err(ParseValueError::new("payment status", s)),
        }
    }
}

/// Error detail the provider attached to a failed payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentError(String);

impl PaymentError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }

    /// Timeout errors are the one class of provider failure worth retrying.
    pub fn is_timeout(&self) -> bool {
        self.0.to_lowercase().contains("timeout")
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One attempt to pay a transfer out through the payment provider.
///
/// A transfer keeps every attempt it made; exactly one of them is marked
/// current at any time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    id: PaymentId,
    transaction_id: PaymentTransactionId,
    amount: Money,
    status: PaymentStatus,
    error: Option<PaymentError>,
    is_current: bool,
    created_at: DateTime<Utc>,
}

impl Payment {
    /// Records a fresh provider attempt. New payments are always current.
    pub fn new(
        transaction_id: PaymentTransactionId,
        amount: Money,
        status: PaymentStatus,
        error: Option<PaymentError>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            transaction_id,
            amount,
            status,
            error,
            is_current: true,
            created_at: Utc::now(),
        }
    }

    /// Rebuilds a payment from stored fields.
    pub fn from_parts(
        id: PaymentId,
        transaction_id: PaymentTransactionId,
        amount: Money,
        status: PaymentStatus,
        error: Option<PaymentError>,
        is_current: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            transaction_id,
            amount,
            status,
            error,
            is_current,
            created_at,
        }
    }

    pub fn id(&self) -> PaymentId {
        self.id
    }

    pub fn transaction_id(&self) -> PaymentTransactionId {
        self.transaction_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> PaymentStatus {
        self.status
    }

    pub fn error(&self) -> Option<&PaymentError> {
        self.error.as_ref()
    }

    pub fn is_current(&self) -> bool {
        self.is_current
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_failed(&self) -> bool {
        self.status == PaymentStatus::Failed
    }

    /// A failed payment is retryable only when the provider blamed a timeout.
    pub fn is_retryable(&self) -> bool {
        self.is_failed() && self.error.as_ref().is_some_and(PaymentError::is_timeout)
    }

    pub(crate) fn demote(&mut self) {
        self.is_current = false;
    }
}
