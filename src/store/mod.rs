use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryCardStore;
pub use postgres::PgCardStore;

/// A cash card: an owned monetary record.
///
/// `id` is server-assigned (None until the first save). `owner` is set from
/// the authenticated principal at creation and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CashCard {
    pub id: Option<i64>,
    pub amount: Decimal,
    pub owner: String,
}

/// Sortable card columns. Doubles as the ORDER BY whitelist for the
/// Postgres store, so the variants are the only strings that ever reach SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Amount,
    Id,
    Owner,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Amount => "amount",
            SortField::Id => "id",
            SortField::Owner => "owner",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    pub fn keyword(&self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// A validated page request. `page` is zero-based; `size` has already been
/// clamped to the configured maximum by the time it gets here.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub page: i64,
    pub size: i64,
    pub sort: SortField,
    pub dir: SortDir,
}

impl PageRequest {
    /// Row offset for this page, saturating at i64::MAX so an absurd client
    /// page number cannot overflow into a negative offset.
    pub fn offset(&self) -> i64 {
        self.page.checked_mul(self.size).unwrap_or(i64::MAX)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database connection error: {0}")]
    Connection(sqlx::Error),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence seam for cash cards.
///
/// Ownership is part of every read predicate: `find_one` and `exists` match
/// on (id, owner) together, so a foreign record is indistinguishable from a
/// missing one. Callers verify ownership through those methods before using
/// `delete_by_id`, which deletes by id alone.
#[async_trait]
pub trait CardStore: Send + Sync {
    async fn find_one(&self, id: i64, owner: &str) -> Result<Option<CashCard>, StoreError>;

    async fn exists(&self, id: i64, owner: &str) -> Result<bool, StoreError>;

    /// One page of the owner's cards, ordered per the page request.
    async fn find_page(&self, owner: &str, page: &PageRequest) -> Result<Vec<CashCard>, StoreError>;

    /// Insert-or-replace: assigns an id when the card has none, otherwise
    /// overwrites the stored row. Returns the card as persisted.
    async fn save(&self, card: CashCard) -> Result<CashCard, StoreError>;

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError>;

    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}
