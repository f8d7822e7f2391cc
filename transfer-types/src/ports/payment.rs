//! Payment provider port.

use async_trait::async_trait;

use crate::domain::{Money, Payment, PlatformAccount, TransferId, UserAccount};
use crate::error::PaymentProviderError;

/// Gateway to the provider executing bank payments.
#[async_trait]
pub trait PaymentProvider: Send + Sync + 'static {
    /// Requests a payment of `amount` from the platform account to the
    /// user's bank account and returns the provider's record of it.
    ///
    /// A returned [`Payment`] may still carry a `FAILED` status; an `Err`
    /// means no classifiable payment record came back at all.
    async fn make_payment(
        &self,
        transfer_id: TransferId,
        amount: Money,
        target: &UserAccount,
        source: &PlatformAccount,
    ) -> Result<Payment, PaymentProviderError>;
}
