//! # Transfer Types
//!
//! Domain model, error taxonomy and port traits for the wallet-to-bank
//! transfer service. This crate is IO-free: adapters for HTTP, persistence
//! and locking live in sibling crates and implement the traits declared
//! under [`ports`].

pub mod domain;
pub mod dto;
pub mod error;
pub mod ports;

pub use domain::{
    AccountNumber, AccountType, Currency, Money, Payment, PaymentError, PaymentId, PaymentStatus,
    PaymentTransactionId, PersonName, PlatformAccount, RoutingNumber, Transfer, TransferId,
    TransferStatus, UserAccount, UserAccountId, UserId, WalletBalance, WalletOperation,
    WalletTransaction, WalletTransactionId,
};
pub use dto::{CreateTransferRequest, ErrorResponse, TransactionResponse, TransactionStatus};
pub use error::{
    ErrorCode, InitiationError, ParseValueError, PaymentProviderError, ProcessPaymentError,
    PublishError, RepoError, ReversalError, WalletError,
};
pub use ports::{
    LockLease, LockService, PaymentProvider, TransferEvent, TransferEventPublisher,
    TransferRepository, UserAccountRepository, WalletGateway,
};
