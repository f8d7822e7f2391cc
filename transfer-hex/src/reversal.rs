//! Compensating reversal: refunds the wallet withdrawal of a transfer whose
//! payment failed for good.

use std::sync::Arc;

use transfer_types::{
    LockService, ReversalError, TransferId, TransferRepository, WalletGateway, WalletOperation,
};

use crate::transfer_lock_key;

/// Refunds failed transfers and settles them as `REVERSED`.
pub struct TransferReversalService {
    transfers: Arc<dyn TransferRepository>,
    wallet: Arc<dyn WalletGateway>,
    locks: Arc<dyn LockService>,
}

impl TransferReversalService {
    /// Creates the service.
    pub fn new(
        transfers: Arc<dyn TransferRepository>,
        wallet: Arc<dyn WalletGateway>,
        locks: Arc<dyn LockService>,
    ) -> Self {
        Self {
            transfers,
            wallet,
            locks,
        }
    }

    /// Refunds the withdrawal behind `transfer_id`.
    ///
    /// Idempotent: a transfer that is already reversed, or otherwise not in
    /// a reversible state, is left untouched, so a redelivered signal can
    /// never refund twice. Shares the transfer lock with payment execution,
    /// so a reversal can never interleave with a late payment retry.
    #[tracing::instrument(skip(self), fields(transfer_id = %transfer_id))]
    pub async fn reverse(&self, transfer_id: TransferId) -> Result<(), ReversalError> {
        tracing::info!("transfer reversal started");

        let key = transfer_lock_key(transfer_id);
        let Some(lease) = self.locks.try_acquire(&key).await else {
            tracing::debug!(key = %key, "unable to obtain transfer lock");
            return Err(ReversalError::ResourceLocked(key));
        };

        let result = self.reverse_locked(transfer_id).await;
        self.locks.release(lease).await;
        result
    }

    async fn reverse_locked(&self, transfer_id: TransferId) -> Result<(), ReversalError> {
        let Some(mut transfer) = self.transfers.find_by_id(transfer_id).await? else {
            tracing::error!("transfer not found, cannot reverse");
            return Ok(());
        };

        if !transfer.is_valid_state_for_reversal() {
            // Already reversed, or never failed; refunding now would pay
            // the user twice.
            tracing::warn!(status = %transfer.status(), "transfer state is invalid, cannot reverse");
            return Ok(());
        }

        let user_id = transfer.withdrawal().user_id();
        let refund_amount = transfer.withdrawal().amount().negate();

        let refund = self
            .wallet
            .create_transaction(user_id, refund_amount, WalletOperation::Refund)
            .await?;
        tracing::info!(
            wallet_transaction_id = %refund.id(),
            amount = %refund.amount(),
            "wallet refund created"
        );

        transfer.reverse_with(refund);
        self.transfers.save(&transfer).await?;

        tracing::info!("transfer successfully reversed");
        Ok(())
    }
}
