use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};

use super::{CardStore, CashCard, PageRequest, StoreError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS cash_card (
    id BIGSERIAL PRIMARY KEY,
    amount NUMERIC NOT NULL,
    "owner" TEXT NOT NULL
)"#;

/// Postgres-backed card store. Every read/update predicate conjoins id with
/// owner so row-level scoping happens in the query, not in Rust.
pub struct PgCardStore {
    pool: PgPool,
}

impl PgCardStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let config = crate::config::config();

        let pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connection_timeout))
            .connect(url)
            .await
            .map_err(StoreError::Connection)?;

        sqlx::query(SCHEMA).execute(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CardStore for PgCardStore {
    async fn find_one(&self, id: i64, owner: &str) -> Result<Option<CashCard>, StoreError> {
        let card = sqlx::query_as::<_, CashCard>(
            r#"SELECT id, amount, "owner" FROM cash_card WHERE id = $1 AND "owner" = $2"#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(card)
    }

    async fn exists(&self, id: i64, owner: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"SELECT EXISTS(SELECT 1 FROM cash_card WHERE id = $1 AND "owner" = $2)"#,
        )
        .bind(id)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_page(&self, owner: &str, page: &PageRequest) -> Result<Vec<CashCard>, StoreError> {
        // Sort column and direction come from fixed whitelists, never from
        // raw client input.
        let sql = format!(
            r#"SELECT id, amount, "owner" FROM cash_card WHERE "owner" = $1 ORDER BY "{}" {} LIMIT $2 OFFSET $3"#,
            page.sort.column(),
            page.dir.keyword(),
        );

        let cards = sqlx::query_as::<_, CashCard>(&sql)
            .bind(owner)
            .bind(page.size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok(cards)
    }

    async fn save(&self, card: CashCard) -> Result<CashCard, StoreError> {
        match card.id {
            None => {
                let saved = sqlx::query_as::<_, CashCard>(
                    r#"INSERT INTO cash_card (amount, "owner") VALUES ($1, $2) RETURNING id, amount, "owner""#,
                )
                .bind(card.amount)
                .bind(&card.owner)
                .fetch_one(&self.pool)
                .await?;

                Ok(saved)
            }
            Some(id) => {
                sqlx::query(r#"UPDATE cash_card SET amount = $1, "owner" = $2 WHERE id = $3"#)
                    .bind(card.amount)
                    .bind(&card.owner)
                    .bind(id)
                    .execute(&self.pool)
                    .await?;

                Ok(card)
            }
        }
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM cash_card WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
