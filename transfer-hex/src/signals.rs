//! In-process signal channel chaining the asynchronous workflow legs.
//!
//! Fills the role a message broker would: `Initiated` and
//! `ProcessingFailed` signals are queued on an unbounded tokio channel and
//! the worker dispatches them to payment execution and reversal. Delivery
//! is at least once; a signal that loses the lock race is re-enqueued after
//! a delay, and both consumers rely on the transfer state guards to make
//! redelivery harmless.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use transfer_types::{
    ProcessPaymentError, PublishError, ReversalError, TransferEvent, TransferEventPublisher,
};

use crate::{PaymentProcessingService, TransferReversalService};

/// Creates the connected publisher/receiver pair for one worker.
pub fn signal_channel() -> (ChannelEventPublisher, UnboundedReceiver<TransferEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ChannelEventPublisher { tx }, rx)
}

/// Producer half of the signal channel.
#[derive(Clone)]
pub struct ChannelEventPublisher {
    tx: UnboundedSender<TransferEvent>,
}

#[async_trait]
impl TransferEventPublisher for ChannelEventPublisher {
    async fn publish(&self, event: TransferEvent) -> Result<(), PublishError> {
        tracing::info!(event = %event, "publishing signal");
        self.tx.send(event).map_err(|_| PublishError::ChannelClosed)
    }
}

/// Consumer loop dispatching signals to the asynchronous services.
#[derive(Clone)]
pub struct SignalWorker {
    processing: Arc<PaymentProcessingService>,
    reversal: Arc<TransferReversalService>,
    redelivery: ChannelEventPublisher,
    redelivery_delay: Duration,
}

impl SignalWorker {
    /// Creates the worker.
    ///
    /// `redelivery` must be a publisher for the same channel `run` will
    /// consume, or re-enqueued signals go nowhere.
    pub fn new(
        processing: Arc<PaymentProcessingService>,
        reversal: Arc<TransferReversalService>,
        redelivery: ChannelEventPublisher,
        redelivery_delay: Duration,
    ) -> Self {
        Self {
            processing,
            reversal,
            redelivery,
            redelivery_delay,
        }
    }

    /// Consumes the channel until every publisher is gone.
    ///
    /// Each delivery runs in its own task, so a slow retry loop or a
    /// panicking handler affects only its transfer, never the channel.
    pub async fn run(self, mut events: UnboundedReceiver<TransferEvent>) {
        tracing::info!("signal worker started");
        while let Some(event) = events.recv().await {
            let worker = self.clone();
            tokio::spawn(async move { worker.handle(event).await });
        }
        tracing::info!("signal channel closed, worker stopping");
    }

    #[tracing::instrument(skip(self), fields(event = %event))]
    async fn handle(&self, event: TransferEvent) {
        tracing::info!("signal received");
        match event {
            TransferEvent::Initiated { transfer_id } => {
                match self.processing.process(transfer_id).await {
                    Ok(()) => {}
                    Err(ProcessPaymentError::ResourceLocked(key)) => {
                        self.redeliver(event, &key).await;
                    }
                    Err(err) => {
                        // Operator alert: the transfer is stuck until a
                        // human re-triggers it.
                        tracing::error!(
                            transfer_id = %transfer_id,
                            error = %err,
                            "payment processing failed"
                        );
                    }
                }
            }
            TransferEvent::ProcessingFailed { transfer_id } => {
                match self.reversal.reverse(transfer_id).await {
                    Ok(()) => {}
                    Err(ReversalError::ResourceLocked(key)) => {
                        self.redeliver(event, &key).await;
                    }
                    Err(err) => {
                        tracing::error!(
                            transfer_id = %transfer_id,
                            error = %err,
                            "transfer reversal failed"
                        );
                    }
                }
            }
        }
    }

    /// Re-enqueues a signal that lost the lock race.
    ///
    /// The holder is mid-flight on the same transfer; by the time the delay
    /// elapses it has either finished (the redelivered signal becomes a
    /// no-op) or died (the redelivered signal picks the work up).
    async fn redeliver(&self, event: TransferEvent, key: &str) {
        tracing::info!(
            key = %key,
            delay_ms = self.redelivery_delay.as_millis() as u64,
            "resource locked, signal redelivery scheduled"
        );
        tokio::time::sleep(self.redelivery_delay).await;
        if self.redelivery.publish(event).await.is_err() {
            tracing::error!("signal channel closed, dropping redelivery");
        }
    }
}
