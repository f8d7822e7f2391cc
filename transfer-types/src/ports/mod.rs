//! Port traits implemented by the outbound adapters.

pub mod events;
pub mod locks;
pub mod payment;
pub mod repository;
pub mod wallet;

pub use events::{TransferEvent, TransferEventPublisher};
pub use locks::{LockLease, LockService};
pub use payment::PaymentProvider;
pub use repository::{TransferRepository, UserAccountRepository};
pub use wallet::WalletGateway;
