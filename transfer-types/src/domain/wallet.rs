//! Wallet transactions and balances as the wallet collaborator reports them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{UserId, WalletTransactionId};
use super::money::Money;
use crate::error::ParseValueError;

/// Direction of a wallet movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WalletOperation {
    Withdrawal,
    Refund,
}

impl std::fmt::Display for WalletOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self {
            WalletOperation::Withdrawal => "WITHDRAWAL",
            WalletOperation::Refund => "REFUND",
        };
        write!(f, "{}", op)
    }
}

impl std::str::FromStr for WalletOperation {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "WITHDRAWAL" => Ok(WalletOperation::Withdrawal),
            "REFUND" => Ok(WalletOperation::Refund),
            _ => Err(ParseValueError::new("wallet operation", s)),
        }
    }
}

/// A movement recorded against a user's wallet.
///
/// The amount keeps the sign the wallet recorded it with: negative for
/// withdrawals, positive for refunds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletTransaction {
    id: WalletTransactionId,
    user_id: UserId,
    amount: Money,
    operation: WalletOperation,
    created_at: DateTime<Utc>,
}

impl WalletTransaction {
    /// Records a wallet movement reported by the wallet just now.
    pub fn new(
        id: WalletTransactionId,
        user_id: UserId,
        amount: Money,
        operation: WalletOperation,
    ) -> Self {
        Self {
            id,
            user_id,
            amount,
            operation,
            created_at: Utc::now(),
        }
    }

    /// Rebuilds a wallet transaction from stored fields.
    pub fn from_parts(
        id: WalletTransactionId,
        user_id: UserId,
        amount: Money,
        operation: WalletOperation,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            amount,
            operation,
            created_at,
        }
    }

    pub fn id(&self) -> WalletTransactionId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn operation(&self) -> WalletOperation {
        self.operation
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_withdrawal(&self) -> bool {
        self.operation == WalletOperation::Withdrawal
    }

    pub fn is_refund(&self) -> bool {
        self.operation == WalletOperation::Refund
    }
}

/// A user's wallet balance at the moment it was fetched.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub user_id: UserId,
    pub balance: Money,
}

impl WalletBalance {
    /// True when the balance covers the requested amount in its currency.
    pub fn may_withdraw(&self, amount: &Money) -> bool {
        self.balance.is_same_currency_and_gte(amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::money::Currency;
    use rust_decimal_macros::dec;

    #[test]
    fn test_operation_predicates() {
        let withdrawal = WalletTransaction::new(
            WalletTransactionId::new(4500),
            UserId::new(1),
            Money::new(dec!(-1000), Currency::USD),
            WalletOperation::Withdrawal,
        );
        assert!(withdrawal.is_withdrawal());
        assert!(!withdrawal.is_refund());
    }

    #[test]
    fn test_may_withdraw_requires_covering_balance() {
        let balance = WalletBalance {
            user_id: UserId::new(1),
            balance: Money::new(dec!(909), Currency::USD),
        };
        assert!(!balance.may_withdraw(&Money::new(dec!(1000), Currency::USD)));
        assert!(balance.may_withdraw(&Money::new(dec!(909), Currency::USD)));
    }

    #[test]
    fn test_may_withdraw_rejects_currency_mismatch() {
        let balance = WalletBalance {
            user_id: UserId::new(1),
            balance: Money::new(dec!(5000), Currency::USD),
        };
        assert!(!balance.may_withdraw(&Money::new(dec!(1000), Currency::EUR)));
    }
}
