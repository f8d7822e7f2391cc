//! SQLite repository adapter.

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

use transfer_types::{
    RepoError, Transfer, TransferId, TransferRepository, UserAccount, UserAccountRepository,
    UserId,
};

use crate::types::{DbPayment, DbTransfer, DbUserAccount, DbWalletTransaction};

// ─────────────────────────────────────────────────────────────────────────────
// SQLite Repository
// ─────────────────────────────────────────────────────────────────────────────

/// SQLite store for transfers and user accounts.
pub struct SqliteTransferRepo {
    pool: SqlitePool,
}

impl SqliteTransferRepo {
    /// Connects to the database and runs the schema migration.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        // Ensure on-disk SQLite target directory exists (no-op for in-memory).
        if let Some(path) = database_url.strip_prefix("sqlite://") {
            let path = path.split('?').next().unwrap_or(path);
            if path != ":memory:" {
                let p = std::path::Path::new(path);
                if let Some(parent) = p.parent() {
                    if !parent.as_os_str().is_empty() {
                        tokio::fs::create_dir_all(parent).await?;
                    }
                }
            }
        }

        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;

        let ddl = include_str!("../migrations/0001_create_tables.sql");
        sqlx::query(ddl).execute(&pool).await?;

        Ok(Self { pool })
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Registers the bank account a user will receive transfers on.
    ///
    /// Account onboarding happens outside the transfer workflow; this is
    /// the seeding hook operations and tests use.
    pub async fn insert_user_account(&self, account: &UserAccount) -> Result<(), RepoError> {
        sqlx::query(
            r#"INSERT INTO user_accounts
               (id, user_id, first_name, last_name, bank_name, account_number, routing_number, currency, national_id, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(account.id.value())
        .bind(account.user_id.value())
        .bind(&account.name.first_name)
        .bind(&account.name.last_name)
        .bind(&account.bank_name)
        .bind(account.account_number.as_str())
        .bind(account.routing_number.as_str())
        .bind(account.currency.to_string())
        .bind(&account.national_id)
        .bind(account.created_at.to_rfc3339())
        .bind(account.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Repository implementations
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl TransferRepository for SqliteTransferRepo {
    #[tracing::instrument(
        skip(self, transfer),
        fields(transfer_id = %transfer.id(), status = %transfer.status())
    )]
    async fn save(&self, transfer: &Transfer) -> Result<(), RepoError> {
        let id_str = transfer.id().to_string();
        let target = transfer.target_account();

        let mut db_tx = self
            .pool
            .begin()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        // Only status and updated_at ever change after initiation.
        sqlx::query(
            r#"INSERT INTO transfers
               (id, source_account_number, transfer_charge, transfer_amount, currency, status,
                target_account_id, target_user_id, target_first_name, target_last_name,
                target_bank_name, target_account_number, target_routing_number, target_currency,
                target_national_id, target_created_at, target_updated_at, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   status = excluded.status,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&id_str)
        .bind(transfer.source_account_number().as_str())
        .bind(transfer.transfer_charge().amount().to_string())
        .bind(transfer.transfer_amount().amount().to_string())
        .bind(transfer.currency().to_string())
        .bind(transfer.status().to_string())
        .bind(target.id.value())
        .bind(target.user_id.value())
        .bind(&target.name.first_name)
        .bind(&target.name.last_name)
        .bind(&target.bank_name)
        .bind(target.account_number.as_str())
        .bind(target.routing_number.as_str())
        .bind(target.currency.to_string())
        .bind(&target.national_id)
        .bind(target.created_at.to_rfc3339())
        .bind(target.updated_at.to_rfc3339())
        .bind(transfer.created_at().to_rfc3339())
        .bind(transfer.updated_at().to_rfc3339())
        .execute(&mut *db_tx)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        // Child rows are rewritten wholesale; the aggregate is the source
        // of truth for their order.
        sqlx::query(r#"DELETE FROM wallet_transactions WHERE transfer_id = ?"#)
            .bind(&id_str)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        for (position, tx) in transfer.wallet_transactions().iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO wallet_transactions
                   (transfer_id, position, wallet_transaction_id, user_id, amount, currency, operation, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&id_str)
            .bind(position as i64)
            .bind(tx.id().value())
            .bind(tx.user_id().value())
            .bind(tx.amount().amount().to_string())
            .bind(tx.amount().currency().to_string())
            .bind(tx.operation().to_string())
            .bind(tx.created_at().to_rfc3339())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        }

        sqlx::query(r#"DELETE FROM payments WHERE transfer_id = ?"#)
            .bind(&id_str)
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        for (position, payment) in transfer.payments().iter().enumerate() {
            sqlx::query(
                r#"INSERT INTO payments
                   (transfer_id, position, id, transaction_id, amount, currency, status, error, is_current, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(&id_str)
            .bind(position as i64)
            .bind(payment.id().to_string())
            .bind(payment.transaction_id().to_string())
            .bind(payment.amount().amount().to_string())
            .bind(payment.amount().currency().to_string())
            .bind(payment.status().to_string())
            .bind(payment.error().map(|e| e.message().to_string()))
            .bind(payment.is_current())
            .bind(payment.created_at().to_rfc3339())
            .execute(&mut *db_tx)
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;
        }

        db_tx
            .commit()
            .await
            .map_err(|e| RepoError::Database(e.to_string()))?;

        tracing::debug!("transfer persisted");
        Ok(())
    }

    #[tracing::instrument(skip(self), fields(transfer_id = %id))]
    async fn find_by_id(&self, id: TransferId) -> Result<Option<Transfer>, RepoError> {
        let id_str = id.to_string();

        let row: Option<DbTransfer> = sqlx::query_as(
            r#"SELECT id, source_account_number, transfer_charge, transfer_amount, currency, status,
                      target_account_id, target_user_id, target_first_name, target_last_name,
                      target_bank_name, target_account_number, target_routing_number, target_currency,
                      target_national_id, target_created_at, target_updated_at, created_at, updated_at
               FROM transfers WHERE id = ?"#,
        )
        .bind(&id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let wallet_rows: Vec<DbWalletTransaction> = sqlx::query_as(
            r#"SELECT wallet_transaction_id, user_id, amount, currency, operation, created_at
               FROM wallet_transactions WHERE transfer_id = ? ORDER BY position"#,
        )
        .bind(&id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let payment_rows: Vec<DbPayment> = sqlx::query_as(
            r#"SELECT id, transaction_id, amount, currency, status, error, is_current, created_at
               FROM payments WHERE transfer_id = ? ORDER BY position"#,
        )
        .bind(&id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        let wallet_transactions = wallet_rows
            .into_iter()
            .map(DbWalletTransaction::into_domain)
            .collect::<Result<Vec<_>, _>>()?;
        let payments = payment_rows
            .into_iter()
            .map(DbPayment::into_domain)
            .collect::<Result<Vec<_>, _>>()?;

        row.into_domain(wallet_transactions, payments).map(Some)
    }
}

#[async_trait]
impl UserAccountRepository for SqliteTransferRepo {
    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    async fn find_by_user_id(&self, user_id: UserId) -> Result<Option<UserAccount>, RepoError> {
        let row: Option<DbUserAccount> = sqlx::query_as(
            r#"SELECT id, user_id, first_name, last_name, bank_name, account_number, routing_number, currency, national_id, created_at, updated_at
               FROM user_accounts WHERE user_id = ?"#,
        )
        .bind(user_id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::Database(e.to_string()))?;

        row.map(DbUserAccount::into_domain).transpose()
    }
}
