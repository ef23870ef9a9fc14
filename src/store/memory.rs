use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CardStore, CashCard, PageRequest, SortDir, SortField, StoreError};

/// In-process card store, used when no DATABASE_URL is configured and by the
/// integration test binary. Same contract as the Postgres store.
#[derive(Default)]
pub struct MemoryCardStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    cards: HashMap<i64, CashCard>,
}

impl MemoryCardStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CardStore for MemoryCardStore {
    async fn find_one(&self, id: i64, owner: &str) -> Result<Option<CashCard>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.cards.get(&id).filter(|c| c.owner == owner).cloned())
    }

    async fn exists(&self, id: i64, owner: &str) -> Result<bool, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.cards.get(&id).is_some_and(|c| c.owner == owner))
    }

    async fn find_page(&self, owner: &str, page: &PageRequest) -> Result<Vec<CashCard>, StoreError> {
        let inner = self.inner.lock().unwrap();

        let mut cards: Vec<CashCard> = inner
            .cards
            .values()
            .filter(|c| c.owner == owner)
            .cloned()
            .collect();

        cards.sort_by(|a, b| {
            let ord = match page.sort {
                SortField::Amount => a.amount.cmp(&b.amount),
                SortField::Id => a.id.cmp(&b.id),
                SortField::Owner => a.owner.cmp(&b.owner),
            };
            match page.dir {
                SortDir::Asc => ord,
                SortDir::Desc => ord.reverse(),
            }
        });

        Ok(cards
            .into_iter()
            .skip(page.offset().max(0) as usize)
            .take(page.size.max(0) as usize)
            .collect())
    }

    async fn save(&self, mut card: CashCard) -> Result<CashCard, StoreError> {
        let mut inner = self.inner.lock().unwrap();

        let id = match card.id {
            Some(id) => id,
            None => {
                inner.next_id += 1;
                inner.next_id
            }
        };
        card.id = Some(id);
        inner.cards.insert(id, card.clone());

        Ok(card)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        inner.cards.remove(&id);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
