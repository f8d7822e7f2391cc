//! The Transfer aggregate and its state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::{AccountNumber, UserAccount};
use super::ids::TransferId;
use super::money::{Currency, Money};
use super::payment::Payment;
use super::wallet::WalletTransaction;
use crate::error::ParseValueError;

/// Lifecycle states of a transfer.
///
/// `INITIALIZED` and `FAILED` are the only states from which work may
/// proceed: payment execution requires the former, reversal the latter.
/// `UNKNOWN` flags a transfer whose money position needs a human.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferStatus {
    Initialized,
    Processing,
    Failed,
    Unknown,
    Reversed,
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = match self {
            TransferStatus::Initialized => "INITIALIZED",
            TransferStatus::Processing => "PROCESSING",
            TransferStatus::Failed => "FAILED",
            TransferStatus::Unknown => "UNKNOWN",
            TransferStatus::Reversed => "REVERSED",
        };
        write!(f, "{}", status)
    }
}

impl std::str::FromStr for TransferStatus {
    type Err = ParseValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INITIALIZED" => Ok(TransferStatus::Initialized),
            "PROCESSING" => Ok(TransferStatus::Processing),
            "FAILED" => Ok(TransferStatus::Failed),
            "UNKNOWN" => Ok(TransferStatus::Unknown),
            "REVERSED" => Ok(TransferStatus::Reversed),
            _ => Err(ParseValueError::new("transfer status", s)),
        }
    }
}

/// A wallet-to-bank transfer.
///
/// The aggregate owns the wallet transactions that moved the user's money
/// and every payment attempt made against the provider. All state changes
/// go through the mutators below; they keep the invariants that the guard
/// predicates rely on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    id: TransferId,
    source_account_number: AccountNumber,
    target_account: UserAccount,
    transfer_charge: Money,
    transfer_amount: Money,
    currency: Currency,
    status: TransferStatus,
    wallet_transactions: Vec<WalletTransaction>,
    payments: Vec<Payment>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Transfer {
    /// Creates a transfer in the `INITIALIZED` state around the withdrawal
    /// that already moved the user's money out of the wallet.
    ///
    /// # Panics
    /// Panics when the given wallet transaction is not a withdrawal; callers
    /// constructing a transfer around anything else have a logic bug.
    pub fn initialize(
        source_account_number: AccountNumber,
        target_account: UserAccount,
        transfer_charge: Money,
        transfer_amount: Money,
        currency: Currency,
        withdrawal: WalletTransaction,
    ) -> Self {
        assert!(
            withdrawal.is_withdrawal(),
            "Transfer must be initialized with a withdrawal transaction"
        );
        let now = Utc::now();
        Self {
            id: TransferId::new(),
            source_account_number,
            target_account,
            transfer_charge,
            transfer_amount,
            currency,
            status: TransferStatus::Initialized,
            wallet_transactions: vec![withdrawal],
            payments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a transfer from stored fields.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: TransferId,
        source_account_number: AccountNumber,
        target_account: UserAccount,
        transfer_charge: Money,
        transfer_amount: Money,
        currency: Currency,
        status: TransferStatus,
        wallet_transactions: Vec<WalletTransaction>,
        payments: Vec<Payment>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            source_account_number,
            target_account,
            transfer_charge,
            transfer_amount,
            currency,
            status,
            wallet_transactions,
            payments,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> TransferId {
        self.id
    }

    pub fn source_account_number(&self) -> &AccountNumber {
        &self.source_account_number
    }

    pub fn target_account(&self) -> &UserAccount {
        &self.target_account
    }

    /// The fee charged for processing this transfer.
    pub fn transfer_charge(&self) -> Money {
        self.transfer_charge
    }

    /// The net amount sent to the user's bank account.
    pub fn transfer_amount(&self) -> Money {
        self.transfer_amount
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn status(&self) -> TransferStatus {
        self.status
    }

    pub fn wallet_transactions(&self) -> &[WalletTransaction] {
        &self.wallet_transactions
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// The withdrawal that funded this transfer.
    ///
    /// # Panics
    /// Panics when no withdrawal exists; every construction path records
    /// one, so its absence is a logic bug.
    pub fn withdrawal(&self) -> &WalletTransaction {
        self.wallet_transactions
            .iter()
            .find(|t| t.is_withdrawal())
            .expect("Transfer has no withdrawal transaction")
    }

    /// The payment attempt currently representing this transfer, if any.
    pub fn current_payment(&self) -> Option<&Payment> {
        self.payments.iter().find(|p| p.is_current())
    }

    pub fn is_failed(&self) -> bool {
        self.status == TransferStatus::Failed
    }

    pub fn is_unknown(&self) -> bool {
        self.status == TransferStatus::Unknown
    }

    pub fn is_reversed(&self) -> bool {
        self.status == TransferStatus::Reversed
    }

    fn is_initialized(&self) -> bool {
        self.status == TransferStatus::Initialized
    }

    fn has_single_withdrawal(&self) -> bool {
        self.wallet_transactions.len() == 1 && self.wallet_transactions[0].is_withdrawal()
    }

    fn has_no_successful_payment(&self) -> bool {
        self.payments.is_empty() || self.payments.iter().all(Payment::is_failed)
    }

    /// True when a payment may be executed for this transfer: it is still
    /// `INITIALIZED`, holds exactly the funding withdrawal, and no attempt
    /// has succeeded yet.
    pub fn is_valid_state_for_payment(&self) -> bool {
        self.is_initialized() && self.has_single_withdrawal() && self.has_no_successful_payment()
    }

    /// True when the withdrawal may be compensated: the transfer `FAILED`,
    /// the wallet was never refunded, and no payment went through.
    pub fn is_valid_state_for_reversal(&self) -> bool {
        self.is_failed() && self.has_single_withdrawal() && self.has_no_successful_payment()
    }

    /// Appends a payment attempt, demoting every earlier attempt.
    ///
    /// # Panics
    /// Panics when a successful payment was already recorded or when the
    /// new payment is not marked current.
    pub fn record_payment(&mut self, payment: Payment) {
        assert!(
            self.has_no_successful_payment(),
            "Transfer already has a successful payment"
        );
        assert!(
            payment.is_current(),
            "Recorded payment must be the current one"
        );
        for previous in &mut self.payments {
            previous.demote();
        }
        self.payments.push(payment);
        self.touch();
    }

    /// Compensates the withdrawal with the given refund and settles the
    /// transfer as `REVERSED`.
    ///
    /// # Panics
    /// Panics when the transaction is not a refund or the transfer is not
    /// in a reversible state.
    pub fn reverse_with(&mut self, refund: WalletTransaction) {
        assert!(
            refund.is_refund(),
            "Transfer must be reversed with a refund transaction"
        );
        assert!(
            self.is_valid_state_for_reversal(),
            "Transfer is not in a reversible state"
        );
        self.wallet_transactions.push(refund);
        self.status = TransferStatus::Reversed;
        self.touch();
    }

    pub fn to_processing_state(&mut self) {
        self.status = TransferStatus::Processing;
        self.touch();
    }

    pub fn to_failed_state(&mut self) {
        self.status = TransferStatus::Failed;
        self.touch();
    }

    pub fn to_unknown_state(&mut self) {
        self.status = TransferStatus::Unknown;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{PersonName, RoutingNumber};
    use crate::domain::ids::{PaymentTransactionId, UserAccountId, UserId, WalletTransactionId};
    use crate::domain::payment::{PaymentError, PaymentStatus};
    use crate::domain::wallet::WalletOperation;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn target_account() -> UserAccount {
        UserAccount {
            id: UserAccountId::new(1),
            user_id: UserId::new(10),
            name: PersonName::new("Tony", "Stark"),
            bank_name: "BANK OF AMERICA".to_string(),
            account_number: AccountNumber::new("1885226711"),
            routing_number: RoutingNumber::new("211927207"),
            currency: Currency::USD,
            national_id: "184969".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn withdrawal() -> WalletTransaction {
        WalletTransaction::new(
            WalletTransactionId::new(4500),
            UserId::new(10),
            Money::new(dec!(-1000), Currency::USD),
            WalletOperation::Withdrawal,
        )
    }

    fn refund() -> WalletTransaction {
        WalletTransaction::new(
            WalletTransactionId::new(4501),
            UserId::new(10),
            Money::new(dec!(1000), Currency::USD),
            WalletOperation::Refund,
        )
    }

    fn transfer() -> Transfer {
        Transfer::initialize(
            AccountNumber::new("0245253419"),
            target_account(),
            Money::new(dec!(100), Currency::USD),
            Money::new(dec!(900), Currency::USD),
            Currency::USD,
            withdrawal(),
        )
    }

    fn payment(status: PaymentStatus, error: Option<&str>) -> Payment {
        Payment::new(
            PaymentTransactionId::from_uuid(Uuid::new_v4()),
            Money::new(dec!(900), Currency::USD),
            status,
            error.map(PaymentError::new),
        )
    }

    #[test]
    fn test_initialize_starts_ready_for_payment() {
        let transfer = transfer();
        assert_eq!(transfer.status(), TransferStatus::Initialized);
        assert_eq!(transfer.wallet_transactions().len(), 1);
        assert!(transfer.payments().is_empty());
        assert!(transfer.is_valid_state_for_payment());
        assert!(!transfer.is_valid_state_for_reversal());
    }

    #[test]
    #[should_panic(expected = "withdrawal transaction")]
    fn test_initialize_rejects_refund() {
        Transfer::initialize(
            AccountNumber::new("0245253419"),
            target_account(),
            Money::new(dec!(100), Currency::USD),
            Money::new(dec!(900), Currency::USD),
            Currency::USD,
            refund(),
        );
    }

    #[test]
    fn test_record_payment_keeps_single_current() {
        let mut transfer = transfer();
        transfer.record_payment(payment(PaymentStatus::Failed, Some("timeout")));
        transfer.record_payment(payment(PaymentStatus::Failed, Some("timeout")));
        transfer.record_payment(payment(PaymentStatus::Processing, None));

        assert_eq!(transfer.payments().len(), 3);
        let current: Vec<_> = transfer.payments().iter().filter(|p| p.is_current()).collect();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].status(), PaymentStatus::Processing);
        assert_eq!(
            transfer.current_payment().unwrap().status(),
            PaymentStatus::Processing
        );
    }

    #[test]
    #[should_panic(expected = "successful payment")]
    fn test_record_payment_rejects_second_success() {
        let mut transfer = transfer();
        transfer.record_payment(payment(PaymentStatus::Processing, None));
        transfer.record_payment(payment(PaymentStatus::Processing, None));
    }

    #[test]
    fn test_failed_payments_leave_transfer_payable() {
        let mut transfer = transfer();
        transfer.record_payment(payment(PaymentStatus::Failed, Some("timeout")));
        assert!(transfer.is_valid_state_for_payment());
    }

    #[test]
    fn test_successful_payment_ends_payable_state() {
        let mut transfer = transfer();
        transfer.record_payment(payment(PaymentStatus::Processing, None));
        transfer.to_processing_state();
        assert!(!transfer.is_valid_state_for_payment());
    }

    #[test]
    fn test_reverse_failed_transfer() {
        let mut transfer = transfer();
        transfer.record_payment(payment(PaymentStatus::Failed, Some("bank rejected")));
        transfer.to_failed_state();
        assert!(transfer.is_valid_state_for_reversal());

        transfer.reverse_with(refund());

        assert_eq!(transfer.status(), TransferStatus::Reversed);
        assert_eq!(transfer.wallet_transactions().len(), 2);
        assert!(!transfer.is_valid_state_for_reversal());
        assert!(!transfer.is_valid_state_for_payment());
    }

    #[test]
    #[should_panic(expected = "reversible state")]
    fn test_reverse_rejects_active_transfer() {
        let mut transfer = transfer();
        transfer.reverse_with(refund());
    }

    #[test]
    #[should_panic(expected = "refund transaction")]
    fn test_reverse_rejects_withdrawal() {
        let mut transfer = transfer();
        transfer.to_failed_state();
        transfer.reverse_with(withdrawal());
    }

    #[test]
    fn test_unknown_state_blocks_everything() {
        let mut transfer = transfer();
        transfer.to_unknown_state();
        assert!(transfer.is_unknown());
        assert!(!transfer.is_valid_state_for_payment());
        assert!(!transfer.is_valid_state_for_reversal());
    }

    #[test]
    fn test_withdrawal_accessor_returns_funding_leg() {
        let transfer = transfer();
        assert!(transfer.withdrawal().is_withdrawal());
        assert_eq!(transfer.withdrawal().amount().amount(), dec!(-1000));
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TransferStatus::Initialized,
            TransferStatus::Processing,
            TransferStatus::Failed,
            TransferStatus::Unknown,
            TransferStatus::Reversed,
        ] {
            let parsed: TransferStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }
}
