//! Error taxonomy for the transfer service.
//!
//! Each layer owns an error enum: adapters return [`RepoError`],
//! [`WalletError`] or [`PaymentProviderError`], and the services fold those
//! into the caller-facing [`InitiationError`], [`ProcessPaymentError`] and
//! [`ReversalError`].

use crate::domain::UserId;

/// A string value that does not map to any variant of a domain enum.
#[derive(Debug, thiserror::Error)]
#[error("Unrecognised {kind} value: {value}")]
pub struct ParseValueError {
    kind: &'static str,
    value: String,
}

impl ParseValueError {
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Machine-readable codes carried in HTTP error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    InvalidRequest,
    InvalidUser,
    InvalidAccount,
    InsufficientFunds,
    ResourceLocked,
    ClientError,
    BadGateway,
    GatewayTimeout,
    ServerError,
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            ErrorCode::InvalidRequest => "INVALID_REQUEST",
            ErrorCode::InvalidUser => "INVALID_USER",
            ErrorCode::InvalidAccount => "INVALID_ACCOUNT",
            ErrorCode::InsufficientFunds => "INSUFFICIENT_FUNDS",
            ErrorCode::ResourceLocked => "RESOURCE_LOCKED",
            ErrorCode::ClientError => "CLIENT_ERROR",
            ErrorCode::BadGateway => "BAD_GATEWAY",
            ErrorCode::GatewayTimeout => "GATEWAY_TIMEOUT",
            ErrorCode::ServerError => "SERVER_ERROR",
        };
        write!(f, "{}", code)
    }
}

/// Repository-level errors (data access failures).
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Stored value could not be decoded: {0}")]
    Decode(String),
}

/// Classified failures of the wallet collaborator.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error("Wallet rejected the request as invalid")]
    InvalidRequest,

    #[error("Wallet has no record of the user")]
    UserNotFound,

    #[error("Wallet rejected the request: status {status}")]
    Client { status: u16 },

    #[error("Wallet upstream failure: status {status}")]
    Upstream { status: u16 },

    #[error("Wallet request timed out")]
    Timeout,

    #[error("Wallet transport failure: {0}")]
    Transport(String),

    #[error("Wallet response could not be parsed: {0}")]
    InvalidBody(String),
}

/// Classified failures of the payment provider.
#[derive(Debug, thiserror::Error)]
pub enum PaymentProviderError {
    /// The provider refused the request outright. Retrying the same request
    /// cannot succeed.
    #[error("Provider rejected the payment request: {0}")]
    Rejected(String),

    #[error("Provider request timed out")]
    Timeout,

    #[error("Provider transport failure: {0}")]
    Transport(String),

    #[error("Provider response could not be parsed: {0}")]
    InvalidBody(String),
}

/// Caller-facing failures of transfer initiation.
#[derive(Debug, thiserror::Error)]
pub enum InitiationError {
    #[error("No bank account on file for user {0}")]
    AccountNotFound(UserId),

    #[error("Resource is locked: {0}")]
    ResourceLocked(String),

    #[error("{message}")]
    Business { code: ErrorCode, message: String },

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl InitiationError {
    pub fn invalid_account(message: impl Into<String>) -> Self {
        InitiationError::Business {
            code: ErrorCode::InvalidAccount,
            message: message.into(),
        }
    }

    pub fn insufficient_funds(message: impl Into<String>) -> Self {
        InitiationError::Business {
            code: ErrorCode::InsufficientFunds,
            message: message.into(),
        }
    }
}

/// Failures of payment execution that the signal worker must act on.
///
/// Classified provider outcomes are folded into the transfer itself, so
/// only lock contention and persistence failures surface here.
#[derive(Debug, thiserror::Error)]
pub enum ProcessPaymentError {
    #[error("Resource is locked: {0}")]
    ResourceLocked(String),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Failures of transfer reversal that the signal worker must act on.
#[derive(Debug, thiserror::Error)]
pub enum ReversalError {
    #[error("Resource is locked: {0}")]
    ResourceLocked(String),

    #[error(transparent)]
    Wallet(#[from] WalletError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Failure to hand a signal to the channel.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Signal channel is closed")]
    ChannelClosed,
}
