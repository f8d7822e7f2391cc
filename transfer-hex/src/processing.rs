//! Payment execution: the asynchronous leg of the workflow.
//!
//! Consumes the `Initiated` signal and drives the transfer to `PROCESSING`,
//! `FAILED` or `UNKNOWN`. Each attempt against the provider runs under the
//! transfer lock; the linear backoff between attempts sleeps with the lock
//! released, so redelivered signals and retry timers serialize on the lock
//! instead of stalling each other.

use std::sync::Arc;
use std::time::Duration;

use transfer_types::{
    LockService, PaymentProvider, PaymentProviderError, PlatformAccount, ProcessPaymentError,
    Transfer, TransferEvent, TransferEventPublisher, TransferId, TransferRepository,
};

use crate::transfer_lock_key;

/// What a locked attempt decided about the transfer.
enum Attempt {
    /// The transfer reached a state no further attempt may change.
    Settled,
    /// The provider failure was transient; try again after the backoff.
    Retry,
}

/// Executes, and retries, the provider payment for initiated transfers.
pub struct PaymentProcessingService {
    transfers: Arc<dyn TransferRepository>,
    provider: Arc<dyn PaymentProvider>,
    locks: Arc<dyn LockService>,
    events: Arc<dyn TransferEventPublisher>,
    platform_account: PlatformAccount,
    max_retries: u32,
    retry_delay_factor: Duration,
}

impl PaymentProcessingService {
    /// Creates the service.
    ///
    /// `max_retries` counts attempts after the first one; the provider is
    /// called at most `max_retries + 1` times per transfer. The delay before
    /// retry `k` is `retry_delay_factor * (k - 1)`, so the first retry fires
    /// immediately and later ones spread out linearly.
    pub fn new(
        transfers: Arc<dyn TransferRepository>,
        provider: Arc<dyn PaymentProvider>,
        locks: Arc<dyn LockService>,
        events: Arc<dyn TransferEventPublisher>,
        platform_account: PlatformAccount,
        max_retries: u32,
        retry_delay_factor: Duration,
    ) -> Self {
        Self {
            transfers,
            provider,
            locks,
            events,
            platform_account,
            max_retries,
            retry_delay_factor,
        }
    }

    /// Executes the payment for `transfer_id`.
    ///
    /// Safe to invoke repeatedly: once the transfer has left the payable
    /// state, further invocations load it, see the state guard fail and
    /// stop without touching the provider.
    #[tracing::instrument(skip(self), fields(transfer_id = %transfer_id))]
    pub async fn process(&self, transfer_id: TransferId) -> Result<(), ProcessPaymentError> {
        tracing::info!("transfer payment processing started");

        let mut retry_count: u32 = 0;
        loop {
            let key = transfer_lock_key(transfer_id);
            let Some(lease) = self.locks.try_acquire(&key).await else {
                if retry_count == 0 {
                    tracing::debug!(key = %key, "unable to obtain transfer lock");
                    return Err(ProcessPaymentError::ResourceLocked(key));
                }
                // A competing invocation owns the transfer now; it, or a
                // redelivered signal, carries the work forward.
                tracing::error!(key = %key, retry_count, "transfer lock lost between retries");
                return Ok(());
            };

            tracing::info!(retry_count, "trying payment for transfer");
            let outcome = self.attempt(transfer_id, retry_count).await;
            self.locks.release(lease).await;

            match outcome? {
                Attempt::Settled => return Ok(()),
                Attempt::Retry => {
                    let delay = self.retry_delay_factor * retry_count;
                    retry_count += 1;
                    tracing::info!(
                        retry_count,
                        delay_ms = delay.as_millis() as u64,
                        "payment retry scheduled"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One attempt against the provider, made while holding the lock.
    async fn attempt(
        &self,
        transfer_id: TransferId,
        retry_count: u32,
    ) -> Result<Attempt, ProcessPaymentError> {
        let Some(mut transfer) = self.transfers.find_by_id(transfer_id).await? else {
            // The signal references a transfer the store has no record of.
            tracing::error!("transfer not found, cannot process payment");
            return Ok(Attempt::Settled);
        };

        if !transfer.is_valid_state_for_payment() {
            // Redelivery of an already handled signal lands here.
            tracing::warn!(status = %transfer.status(), "transfer state is invalid, cannot process payment");
            return Ok(Attempt::Settled);
        }

        let result = self
            .provider
            .make_payment(
                transfer_id,
                transfer.transfer_amount(),
                transfer.target_account(),
                &self.platform_account,
            )
            .await;

        match result {
            Ok(payment) => {
                let failed = payment.is_failed();
                let retryable = payment.is_retryable();
                let provider_error = payment.error().map(|e| e.message().to_string());
                transfer.record_payment(payment);

                if retryable {
                    if retry_count < self.max_retries {
                        // Keep the attempt history even if the process dies
                        // during the backoff delay.
                        self.transfers.save(&transfer).await?;
                        return Ok(Attempt::Retry);
                    }
                    tracing::warn!(max_retries = self.max_retries, "payment retries exhausted");
                    self.close_as_failed(&mut transfer).await?;
                } else if failed {
                    tracing::error!(error = ?provider_error, "provider reported the payment as failed");
                    self.close_as_failed(&mut transfer).await?;
                } else {
                    transfer.to_processing_state();
                    self.transfers.save(&transfer).await?;
                    tracing::info!("transfer payment processing completed successfully");
                }
                Ok(Attempt::Settled)
            }
            Err(PaymentProviderError::Rejected(reason)) => {
                // The request itself was bad; no retry can change that, and
                // there is no provider record to keep.
                tracing::error!(reason = %reason, "provider rejected the payment request");
                self.close_as_failed(&mut transfer).await?;
                Ok(Attempt::Settled)
            }
            Err(PaymentProviderError::Timeout) => {
                if retry_count < self.max_retries {
                    tracing::warn!("provider request timed out");
                    return Ok(Attempt::Retry);
                }
                tracing::warn!(max_retries = self.max_retries, "payment retries exhausted");
                self.close_as_failed(&mut transfer).await?;
                Ok(Attempt::Settled)
            }
            Err(err) => {
                // Transport or parse failure after the request may already
                // have reached the provider: whether money moved cannot be
                // decided from here.
                tracing::error!(error = %err, "payment outcome unknown, manual reconciliation required");
                transfer.to_unknown_state();
                self.transfers.save(&transfer).await?;
                Ok(Attempt::Settled)
            }
        }
    }

    /// Settles the transfer as `FAILED` and requests the compensating
    /// refund through the signal channel.
    async fn close_as_failed(&self, transfer: &mut Transfer) -> Result<(), ProcessPaymentError> {
        transfer.to_failed_state();
        self.transfers.save(transfer).await?;

        let event = TransferEvent::ProcessingFailed {
            transfer_id: transfer.id(),
        };
        if let Err(err) = self.events.publish(event).await {
            // FAILED is persisted, so operators can re-trigger the refund.
            tracing::error!(
                transfer_id = %transfer.id(),
                error = %err,
                "processing-failed signal could not be published"
            );
        }
        Ok(())
    }
}
