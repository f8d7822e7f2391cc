//! Transfer initiation: the synchronous leg of the workflow.
//!
//! Validates the request, computes the processing fee, withdraws the full
//! requested amount from the user's wallet and persists the transfer in its
//! initial state. The payout itself runs asynchronously, triggered by the
//! `Initiated` signal published here.

use std::sync::Arc;

use rust_decimal::Decimal;

use transfer_types::{
    Currency, InitiationError, LockService, Money, PlatformAccount, Transfer, TransferEvent,
    TransferEventPublisher, TransferRepository, UserAccount, UserAccountRepository, UserId,
    WalletGateway, WalletOperation,
};

use crate::user_lock_key;

/// Orchestrates transfer initiation against the wallet and the store.
///
/// Holds the platform account the payout will later be funded from; its
/// currency is the currency transfers are requested in.
pub struct TransferInitiationService {
    accounts: Arc<dyn UserAccountRepository>,
    wallet: Arc<dyn WalletGateway>,
    transfers: Arc<dyn TransferRepository>,
    locks: Arc<dyn LockService>,
    events: Arc<dyn TransferEventPublisher>,
    platform_account: PlatformAccount,
    fee_rate: Decimal,
}

impl TransferInitiationService {
    /// Creates the service.
    ///
    /// # Panics
    /// Panics when `fee_rate` is outside `[0, 1)`: the fee is a fraction of
    /// the requested amount and must leave something to pay out.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        accounts: Arc<dyn UserAccountRepository>,
        wallet: Arc<dyn WalletGateway>,
        transfers: Arc<dyn TransferRepository>,
        locks: Arc<dyn LockService>,
        events: Arc<dyn TransferEventPublisher>,
        platform_account: PlatformAccount,
        fee_rate: Decimal,
    ) -> Self {
        assert!(
            fee_rate >= Decimal::ZERO && fee_rate < Decimal::ONE,
            "fee rate must be within [0, 1)"
        );
        Self {
            accounts,
            wallet,
            transfers,
            locks,
            events,
            platform_account,
            fee_rate,
        }
    }

    /// The currency transfers are requested and paid out in.
    pub fn currency(&self) -> Currency {
        self.platform_account.currency
    }

    /// Moves `amount` out of the user's wallet and starts a transfer to the
    /// bank account the user has on file.
    ///
    /// Returns the persisted transfer in the `INITIALIZED` state; payment
    /// execution happens asynchronously once the published signal is
    /// consumed. Initiations for the same user are serialized through the
    /// user lock; a concurrent initiation fails fast with `ResourceLocked`.
    #[tracing::instrument(skip(self), fields(user_id = %user_id, amount = %amount))]
    pub async fn initiate(
        &self,
        user_id: UserId,
        amount: Money,
    ) -> Result<Transfer, InitiationError> {
        tracing::info!("initiating transfer");

        let account = self
            .accounts
            .find_by_user_id(user_id)
            .await?
            .ok_or(InitiationError::AccountNotFound(user_id))?;

        if !account.is_compatible_with(amount.currency()) {
            let message = format!(
                "cannot process transfer to account with currency: {}",
                account.currency
            );
            tracing::error!("{}", message);
            return Err(InitiationError::invalid_account(message));
        }

        let key = user_lock_key(user_id);
        let Some(lease) = self.locks.try_acquire(&key).await else {
            tracing::debug!(key = %key, "unable to obtain user lock");
            return Err(InitiationError::ResourceLocked(key));
        };

        let result = self.initiate_locked(user_id, amount, account).await;
        self.locks.release(lease).await;
        tracing::debug!(key = %key, "user lock released");
        result
    }

    async fn initiate_locked(
        &self,
        user_id: UserId,
        amount: Money,
        account: UserAccount,
    ) -> Result<Transfer, InitiationError> {
        let balance = self.wallet.balance(user_id).await?;
        tracing::info!(balance = %balance.balance, "fetched user wallet balance");

        if !balance.may_withdraw(&amount) {
            tracing::error!("user balance not sufficient to process transfer");
            return Err(InitiationError::insufficient_funds(
                "user balance not sufficient to process transfer",
            ));
        }

        let transfer_charge = amount.fraction_of(self.fee_rate);
        let transfer_amount = amount.deduct(transfer_charge.amount());

        // From here on money has left the wallet. Every failure below must
        // still leave a trace an operator can compensate from.
        let withdrawal = self
            .wallet
            .create_transaction(user_id, amount, WalletOperation::Withdrawal)
            .await?;
        tracing::info!(
            wallet_transaction_id = %withdrawal.id(),
            amount = %withdrawal.amount(),
            "wallet withdrawal created"
        );

        let transfer = Transfer::initialize(
            self.platform_account.account_number.clone(),
            account,
            transfer_charge,
            transfer_amount,
            amount.currency(),
            withdrawal,
        );

        if let Err(err) = self.transfers.save(&transfer).await {
            // The withdrawal exists but no transfer record does; this log
            // line is what operators refund from.
            tracing::error!(
                transfer_id = %transfer.id(),
                wallet_transaction_id = %transfer.withdrawal().id(),
                error = %err,
                "transfer could not be persisted after the wallet withdrawal"
            );
            return Err(err.into());
        }

        let event = TransferEvent::Initiated {
            transfer_id: transfer.id(),
        };
        if let Err(err) = self.events.publish(event).await {
            // The transfer is persisted; operators can re-trigger the payout.
            tracing::error!(
                transfer_id = %transfer.id(),
                error = %err,
                "initiated signal could not be published"
            );
        }

        tracing::info!(transfer_id = %transfer.id(), "transfer initiated");
        Ok(transfer)
    }
}
