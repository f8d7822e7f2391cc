//! Domain models for the transfer service.

pub mod account;
pub mod ids;
pub mod money;
pub mod payment;
pub mod transfer;
pub mod wallet;

pub use account::{
    AccountNumber, AccountType, PersonName, PlatformAccount, RoutingNumber, UserAccount,
};
pub use ids::{
    PaymentId, PaymentTransactionId, TransferId, UserAccountId, UserId, WalletTransactionId,
};
pub use money::{Currency, Money};
pub use payment::{Payment, PaymentError, PaymentStatus};
pub use transfer::{Transfer, TransferStatus};
pub use wallet::{WalletBalance, WalletOperation, WalletTransaction};
