//! Database row types and their mapping back to the domain.

use std::str::FromStr;

use sqlx::FromRow;

use transfer_types::{
    AccountNumber, Money, Payment, PaymentError, PaymentId, PaymentTransactionId, PersonName,
    RepoError, RoutingNumber, Transfer, TransferId, UserAccount, UserAccountId, UserId,
    WalletTransaction, WalletTransactionId,
};

/// Decodes a stored string through the domain's `FromStr` impls.
pub(crate) fn decode<T>(value: &str) -> Result<T, RepoError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| RepoError::Decode(e.to_string()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Database row structs (derive FromRow for automatic mapping)
// ─────────────────────────────────────────────────────────────────────────────

/// Transfer row with the target account snapshot embedded.
#[derive(FromRow)]
pub struct DbTransfer {
    pub id: String,
    pub source_account_number: String,
    pub transfer_charge: String,
    pub transfer_amount: String,
    pub currency: String,
    pub status: String,
    pub target_account_id: i64,
    pub target_user_id: i64,
    pub target_first_name: String,
    pub target_last_name: String,
    pub target_bank_name: String,
    pub target_account_number: String,
    pub target_routing_number: String,
    pub target_currency: String,
    pub target_national_id: String,
    pub target_created_at: String,
    pub target_updated_at: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DbTransfer {
    pub fn into_domain(
        self,
        wallet_transactions: Vec<WalletTransaction>,
        payments: Vec<Payment>,
    ) -> Result<Transfer, RepoError> {
        let currency = decode(&self.currency)?;
        let target_account = UserAccount {
            id: UserAccountId::new(self.target_account_id),
            user_id: UserId::new(self.target_user_id),
            name: PersonName::new(self.target_first_name, self.target_last_name),
            bank_name: self.target_bank_name,
            account_number: AccountNumber::new(self.target_account_number),
            routing_number: RoutingNumber::new(self.target_routing_number),
            currency: decode(&self.target_currency)?,
            national_id: self.target_national_id,
            created_at: decode(&self.target_created_at)?,
            updated_at: decode(&self.target_updated_at)?,
        };

        Ok(Transfer::from_parts(
            TransferId::from_uuid(decode(&self.id)?),
            AccountNumber::new(self.source_account_number),
            target_account,
            Money::new(decode(&self.transfer_charge)?, currency),
            Money::new(decode(&self.transfer_amount)?, currency),
            currency,
            decode(&self.status)?,
            wallet_transactions,
            payments,
            decode(&self.created_at)?,
            decode(&self.updated_at)?,
        ))
    }
}

/// Wallet transaction row.
#[derive(FromRow)]
pub struct DbWalletTransaction {
    pub wallet_transaction_id: i64,
    pub user_id: i64,
    pub amount: String,
    pub currency: String,
    pub operation: String,
    pub created_at: String,
}

impl DbWalletTransaction {
    pub fn into_domain(self) -> Result<WalletTransaction, RepoError> {
        Ok(WalletTransaction::from_parts(
            WalletTransactionId::new(self.wallet_transaction_id),
            UserId::new(self.user_id),
            Money::new(decode(&self.amount)?, decode(&self.currency)?),
            decode(&self.operation)?,
            decode(&self.created_at)?,
        ))
    }
}

/// Payment row.
#[derive(FromRow)]
pub struct DbPayment {
    pub id: String,
    pub transaction_id: String,
    pub amount: String,
    pub currency: String,
    pub status: String,
    pub error: Option<String>,
    pub is_current: bool,
    pub created_at: String,
}

impl DbPayment {
    pub fn into_domain(self) -> Result<Payment, RepoError> {
        Ok(Payment::from_parts(
            PaymentId::from_uuid(decode(&self.id)?),
            PaymentTransactionId::from_uuid(decode(&self.transaction_id)?),
            Money::new(decode(&self.amount)?, decode(&self.currency)?),
            decode(&self.status)?,
            self.error.map(PaymentError::new),
            self.is_current,
            decode(&self.created_at)?,
        ))
    }
}

/// User account row.
#[derive(FromRow)]
pub struct DbUserAccount {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub bank_name: String,
    pub account_number: String,
    pub routing_number: String,
    pub currency: String,
    pub national_id: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DbUserAccount {
    pub fn into_domain(self) -> Result<UserAccount, RepoError> {
        Ok(UserAccount {
            id: UserAccountId::new(self.id),
            user_id: UserId::new(self.user_id),
            name: PersonName::new(self.first_name, self.last_name),
            bank_name: self.bank_name,
            account_number: AccountNumber::new(self.account_number),
            routing_number: RoutingNumber::new(self.routing_number),
            currency: decode(&self.currency)?,
            national_id: self.national_id,
            created_at: decode(&self.created_at)?,
            updated_at: decode(&self.updated_at)?,
        })
    }
}
