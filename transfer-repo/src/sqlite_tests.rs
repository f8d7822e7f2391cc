//! SQLite repository integration tests.

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use transfer_types::{
        AccountNumber, Currency, Money, Payment, PaymentError, PaymentStatus,
        PaymentTransactionId, PersonName, RoutingNumber, Transfer, TransferId,
        TransferRepository, TransferStatus, UserAccount, UserAccountId, UserAccountRepository,
        UserId, WalletOperation, WalletTransaction, WalletTransactionId,
    };

    use crate::SqliteTransferRepo;

    async fn setup_repo() -> SqliteTransferRepo {
        SqliteTransferRepo::new("sqlite::memory:").await.unwrap()
    }

    fn user_account() -> UserAccount {
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
            user_account(),
            Money::new(dec!(100), Currency::USD),
            Money::new(dec!(900), Currency::USD),
            Currency::USD,
            withdrawal(),
        )
    }

    fn failed_payment(error: &str) -> Payment {
        Payment::new(
            PaymentTransactionId::from_uuid(Uuid::new_v4()),
            Money::new(dec!(900), Currency::USD),
            PaymentStatus::Failed,
            Some(PaymentError::new(error)),
        )
    }

    #[tokio::test]
    async fn test_save_and_find_round_trip() {
        let repo = setup_repo().await;
        let transfer = transfer();

        repo.save(&transfer).await.unwrap();
        let found = repo.find_by_id(transfer.id()).await.unwrap().unwrap();

        assert_eq!(found.id(), transfer.id());
        assert_eq!(found.status(), TransferStatus::Initialized);
        assert_eq!(found.transfer_charge().amount(), dec!(100));
        assert_eq!(found.transfer_amount().amount(), dec!(900));
        assert_eq!(found.currency(), Currency::USD);
        assert_eq!(found.source_account_number().as_str(), "0245253419");
        assert_eq!(found.target_account().name.full_name(), "Tony Stark");
        assert_eq!(found.wallet_transactions().len(), 1);
        assert_eq!(found.withdrawal().amount().amount(), dec!(-1000));
        assert!(found.payments().is_empty());
        assert_eq!(found, transfer);
    }

    #[tokio::test]
    async fn test_find_by_id_not_found() {
        let repo = setup_repo().await;

        let result = repo.find_by_id(TransferId::new()).await.unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_save_is_an_upsert() {
        let repo = setup_repo().await;
        let mut transfer = transfer();

        repo.save(&transfer).await.unwrap();
        transfer.to_processing_state();
        repo.save(&transfer).await.unwrap();

        let found = repo.find_by_id(transfer.id()).await.unwrap().unwrap();
        assert_eq!(found.status(), TransferStatus::Processing);
    }

    #[tokio::test]
    async fn test_payment_history_round_trip() {
        let repo = setup_repo().await;
        let mut transfer = transfer();

        transfer.record_payment(failed_payment("timeout connecting to bank"));
        repo.save(&transfer).await.unwrap();

        transfer.record_payment(failed_payment("timeout connecting to bank"));
        transfer.to_failed_state();
        repo.save(&transfer).await.unwrap();

        let found = repo.find_by_id(transfer.id()).await.unwrap().unwrap();

        assert_eq!(found.status(), TransferStatus::Failed);
        assert_eq!(found.payments().len(), 2);
        assert!(!found.payments()[0].is_current());
        assert!(found.payments()[1].is_current());
        assert_eq!(
            found.current_payment().unwrap().id(),
            transfer.payments()[1].id()
        );
        assert_eq!(
            found.payments()[0].error().unwrap().message(),
            "timeout connecting to bank"
        );
    }

    #[tokio::test]
    async fn test_reversed_transfer_round_trip() {
        let repo = setup_repo().await;
        let mut transfer = transfer();

        transfer.to_failed_state();
        transfer.reverse_with(refund());
        repo.save(&transfer).await.unwrap();

        let found = repo.find_by_id(transfer.id()).await.unwrap().unwrap();

        assert_eq!(found.status(), TransferStatus::Reversed);
        assert_eq!(found.wallet_transactions().len(), 2);
        assert!(found.wallet_transactions()[0].is_withdrawal());
        assert!(found.wallet_transactions()[1].is_refund());
        assert_eq!(found.wallet_transactions()[1].amount().amount(), dec!(1000));
    }

    #[tokio::test]
    async fn test_user_account_lookup() {
        let repo = setup_repo().await;
        let account = user_account();

        repo.insert_user_account(&account).await.unwrap();
        let found = repo.find_by_user_id(account.user_id).await.unwrap().unwrap();

        assert_eq!(found.id, account.id);
        assert_eq!(found.user_id, account.user_id);
        assert_eq!(found.account_number.as_str(), "1885226711");
        assert_eq!(found.currency, Currency::USD);
    }

    #[tokio::test]
    async fn test_user_account_not_found() {
        let repo = setup_repo().await;

        let result = repo.find_by_user_id(UserId::new(404)).await.unwrap();

        assert!(result.is_none());
    }
}
