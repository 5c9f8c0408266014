//! In-memory submission store
//!
//! Owned by the app state rather than a global. A `RwLock` serializes writers
//! against readers, so concurrent handlers cannot lose appends or observe a
//! half-written collection.

use async_trait::async_trait;
use birthorder_core::{FieldLayout, NewSubmission, Submission};
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Backend, Paginated, Pagination, StoreError, SubmissionStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    submissions: RwLock<Vec<Submission>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Newest first. Iterating in reverse before the stable sort keeps later
/// inserts ahead of earlier ones that share a timestamp.
fn newest_first(records: &[Submission]) -> Vec<&Submission> {
    let mut ordered: Vec<&Submission> = records.iter().rev().collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    ordered
}

#[async_trait]
impl SubmissionStore for MemoryStore {
    fn backend(&self) -> Backend {
        Backend::Memory
    }

    fn export_layout(&self) -> FieldLayout {
        FieldLayout::Wire
    }

    async fn create(&self, submission: NewSubmission) -> Result<Submission, StoreError> {
        let stored = submission.into_stored(Uuid::new_v4().to_string(), Utc::now());
        self.submissions.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self, page: Pagination) -> Result<Paginated<Submission>, StoreError> {
        let submissions = self.submissions.read().await;
        let items = newest_first(&submissions)
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .cloned()
            .collect();

        Ok(Paginated {
            items,
            total: submissions.len() as u64,
            page: page.page,
            limit: page.limit,
        })
    }

    async fn list_by_region(&self, region: &str) -> Result<Vec<Submission>, StoreError> {
        let submissions = self.submissions.read().await;
        Ok(newest_first(&submissions)
            .into_iter()
            .filter(|s| s.region.as_str() == region)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.submissions.read().await.len() as u64)
    }

    async fn all(&self) -> Result<Vec<Submission>, StoreError> {
        let submissions = self.submissions.read().await;
        Ok(newest_first(&submissions).into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use birthorder_core::{AgeRange, Gender, Region};

    fn new_submission(region: Region, family_size: u8) -> NewSubmission {
        NewSubmission {
            region,
            family_size,
            firstborn_gender: Gender::Female,
            attitude_score: 0.3,
            firstborn_education: 12.0,
            laterborn_education: 10.0,
            age_range: AgeRange::From18To25,
            notes: String::new(),
            contact_email: String::new(),
            ip_address: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn assigns_unique_ids() {
        let store = MemoryStore::new();
        let a = store.create(new_submission(Region::British, 2)).await.unwrap();
        let b = store.create(new_submission(Region::British, 2)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn second_page_of_twenty_five() {
        let store = MemoryStore::new();
        for i in 1..=25u8 {
            store.create(new_submission(Region::Other, i % 20 + 1)).await.unwrap();
        }
        let all = store.all().await.unwrap();

        let page = store.list(Pagination::new(2, 10)).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.items.len(), 10);
        // Records 11-20 of the newest-first ordering
        assert_eq!(page.items, all[10..20].to_vec());
        assert!(page.items.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }

    #[tokio::test]
    async fn newest_first_ordering() {
        let store = MemoryStore::new();
        let first = store.create(new_submission(Region::Other, 2)).await.unwrap();
        let second = store.create(new_submission(Region::Other, 3)).await.unwrap();
        let all = store.all().await.unwrap();
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);
    }

    #[tokio::test]
    async fn filters_by_region() {
        let store = MemoryStore::new();
        store.create(new_submission(Region::British, 2)).await.unwrap();
        store.create(new_submission(Region::EastAsian, 3)).await.unwrap();
        store.create(new_submission(Region::British, 4)).await.unwrap();

        let british = store.list_by_region("British").await.unwrap();
        assert_eq!(british.len(), 2);
        assert!(british.iter().all(|s| s.region == Region::British));
        assert_eq!(british[0].family_size, 4);

        assert!(store.list_by_region("Atlantis").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_writers_do_not_lose_updates() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.create(new_submission(Region::African, 5)).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.count().await.unwrap(), 50);
    }
}
