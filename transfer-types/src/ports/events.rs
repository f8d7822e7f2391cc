//! Signal port chaining the asynchronous workflow steps.

use async_trait::async_trait;

use crate::domain::TransferId;
use crate::error::PublishError;

/// Signals emitted as a transfer moves through its workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    /// A transfer was persisted in its initial state; payment execution is
    /// due.
    Initiated { transfer_id: TransferId },
    /// Payment execution failed for good; the withdrawal must be
    /// compensated.
    ProcessingFailed { transfer_id: TransferId },
}

impl TransferEvent {
    pub fn transfer_id(&self) -> TransferId {
        match self {
            TransferEvent::Initiated { transfer_id } => *transfer_id,
            TransferEvent::ProcessingFailed { transfer_id } => *transfer_id,
        }
    }
}

impl std::fmt::Display for TransferEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferEvent::Initiated { transfer_id } => {
                write!(f, "transfer-initiated({})", transfer_id)
            }
            TransferEvent::ProcessingFailed { transfer_id } => {
                write!(f, "transfer-processing-failed({})", transfer_id)
            }
        }
    }
}

/// Producer half of the signal channel.
#[async_trait]
pub trait TransferEventPublisher: Send + Sync + 'static {
    async fn publish(&self, event: TransferEvent) -> Result<(), PublishError>;
}
