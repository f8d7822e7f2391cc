//! Persistence ports.

use async_trait::async_trait;

use crate::domain::{Transfer, TransferId, UserAccount, UserId};
use crate::error::RepoError;

/// Store for the Transfer aggregate.
///
/// `save` persists the whole aggregate, wallet transactions and payments
/// included, and doubles as insert and update.
#[async_trait]
pub trait TransferRepository: Send + Sync + 'static {
    async fn save(&self, transfer: &Transfer) -> Result<(), RepoError>;

    async fn find_by_id(&self, id: TransferId) -> Result<Option<Transfer>, RepoError>;
}

/// Read access to the bank accounts users registered for payouts.
#[async_trait]
pub trait UserAccountRepository: Send + Sync + 'static {
    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<UserAccount>, RepoError>;
}
