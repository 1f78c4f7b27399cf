use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::{AccountRow, AccountStore, StoreError};
use crate::account::AccountId;

/// `AccountStore` backed by the Postgres `users` table.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `users` table if needed, empty it and insert one account
    /// holding `seed_balance`. Returns the id assigned to the seed row.
    pub async fn bootstrap(&self, seed_balance: i64) -> Result<AccountId, StoreError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS public.users (id SERIAL NOT NULL, balance BIGINT NOT NULL)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("TRUNCATE users RESTART IDENTITY")
            .execute(&self.pool)
            .await?;

        let (id,): (i64,) =
            sqlx::query_as("INSERT INTO users (balance) VALUES ($1) RETURNING id::BIGINT")
                .bind(seed_balance)
                .fetch_one(&self.pool)
                .await?;

        info!(account_id = id, seed_balance, "users table bootstrapped");
        Ok(id)
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn read_by_id(&self, id: AccountId) -> Result<Option<AccountRow>, StoreError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id::BIGINT AS id, balance FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update_balance(&self, id: AccountId, balance: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET balance = $1 WHERE id = $2")
            .bind(balance)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
