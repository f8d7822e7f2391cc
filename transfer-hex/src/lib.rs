//! # Transfer Hex
//!
//! Orchestration services and HTTP adapter for the transfer service.
//!
//! ## Architecture
//!
//! - `initiation` - synchronous leg: fee, withdrawal, persisted transfer
//! - `processing` - asynchronous payment execution with retries
//! - `reversal` - compensating refund for transfers that failed for good
//! - `signals` - in-process channel chaining the asynchronous legs
//! - `inbound/` - HTTP adapter (Axum server)
//!
//! Services depend on the port traits from `transfer-types`; adapters are
//! injected as trait objects at startup.

use transfer_types::{TransferId, UserId};

pub mod inbound;
pub mod initiation;
pub mod processing;
pub mod reversal;
pub mod signals;


pub use initiation::TransferInitiationService;
pub use processing::PaymentProcessingService;
pub use reversal::TransferReversalService;
pub use signals::{ChannelEventPublisher, SignalWorker};

/// Lock key serializing initiations for one user.
pub(crate) fn user_lock_key(user_id: UserId) -> String {
    format!("userId={}", user_id)
}

/// Lock key serializing payment execution and reversal for one transfer.
///
/// Both services use the same key, so a reversal can never interleave with
/// a late payment retry on the same transfer.
pub(crate) fn transfer_lock_key(transfer_id: TransferId) -> String {
    format!("transferId={}", transfer_id)
}
