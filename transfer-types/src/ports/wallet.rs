//! Wallet collaborator port.

use async_trait::async_trait;

use crate::domain::{Money, UserId, WalletBalance, WalletOperation, WalletTransaction};
use crate::error::WalletError;

/// Gateway to the wallet service holding user funds.
#[async_trait]
pub trait WalletGateway: Send + Sync + 'static {
    /// Fetches the user's current balance.
    async fn balance(&self, user_id: UserId) -> Result<WalletBalance, WalletError>;

    /// Records a wallet movement and returns the transaction as the wallet
    /// booked it.
    ///
    /// The operation decides the sign of the booked amount: withdrawals are
    /// booked negative, refunds positive, whatever sign the caller passed.
    async fn create_transaction(
        &self,
        user_id: UserId,
        amount: Money,
        operation: WalletOperation,
    ) -> Result<WalletTransaction, WalletError>;
}
