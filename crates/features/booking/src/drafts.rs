use crate::error::BookingError;
use crate::policy::BookingPolicy;
use crate::wizard::BookingDraft;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use wayfare_kernel::safe_nanoid;

/// In-memory wizard drafts with a time-to-live.
///
/// Drafts are throwaway: an expired or evicted draft simply has to be started again. Lookups
/// by anyone but the owner behave as if the draft did not exist.
#[derive(Debug, Clone)]
pub struct DraftStore {
    cache: Cache<String, BookingDraft>,
}

impl DraftStore {
    #[must_use]
    pub fn new(policy: &BookingPolicy) -> Self {
        let cache = Cache::builder()
            .max_capacity(policy.draft_capacity())
            .time_to_live(policy.draft_ttl())
            .build();
        Self { cache }
    }

    /// Starts an empty draft for `owner`.
    pub fn start(&self, owner: &str, now: DateTime<Utc>) -> BookingDraft {
        BookingDraft::new(safe_nanoid!(), owner, now)
    }

    /// # Errors
    /// Returns [`BookingError::NotFound`] for unknown, expired or foreign drafts.
    pub async fn get_owned(&self, id: &str, owner: &str) -> Result<BookingDraft, BookingError> {
        self.cache
            .get(id)
            .await
            .filter(|draft| draft.owner == owner)
            .ok_or_else(|| BookingError::not_found(format!("Draft '{id}' not found or expired")))
    }

    /// Stores the draft, restarting its time-to-live.
    pub async fn save(&self, draft: BookingDraft) {
        self.cache.insert(draft.id.clone(), draft).await;
    }

    /// Removes and returns the draft so only one confirmation can use it.
    ///
    /// # Errors
    /// Returns [`BookingError::NotFound`] for unknown, expired or foreign drafts, and
    /// [`BookingError::Conflict`] when a concurrent confirmation took it first.
    pub async fn take(&self, id: &str, owner: &str) -> Result<BookingDraft, BookingError> {
        self.get_owned(id, owner).await?;
        self.cache
            .remove(id)
            .await
            .ok_or_else(|| BookingError::conflict("Draft was already confirmed"))
    }

    /// Puts a taken draft back, e.g. when storing its booking failed.
    pub async fn restore(&self, draft: BookingDraft) {
        self.save(draft).await;
    }

    /// # Errors
    /// Returns [`BookingError::NotFound`] for unknown, expired or foreign drafts.
    pub async fn discard(&self, id: &str, owner: &str) -> Result<(), BookingError> {
        self.get_owned(id, owner).await?;
        self.cache.invalidate(id).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_domain::config::BookingPolicyConfig;

    fn store() -> DraftStore {
        DraftStore::new(&BookingPolicy::new(&BookingPolicyConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn drafts_are_private_to_their_owner() {
        let store = store();
        let draft = store.start("uid-1", Utc::now());
        let id = draft.id.clone();
        store.save(draft).await;

        assert_eq!(store.get_owned(&id, "uid-1").await.unwrap().owner, "uid-1");
        assert!(matches!(
            store.get_owned(&id, "uid-2").await,
            Err(BookingError::NotFound { .. })
        ));
        assert!(matches!(store.discard(&id, "uid-2").await, Err(BookingError::NotFound { .. })));
    }

    #[tokio::test]
    async fn take_consumes_the_draft() {
        let store = store();
        let draft = store.start("uid-1", Utc::now());
        let id = draft.id.clone();
        store.save(draft).await;

        let taken = store.take(&id, "uid-1").await.unwrap();
        assert!(matches!(store.take(&id, "uid-1").await, Err(BookingError::NotFound { .. })));

        store.restore(taken).await;
        assert!(store.take(&id, "uid-2").await.is_err());
        assert_eq!(store.take(&id, "uid-1").await.unwrap().id, id);
    }

    #[tokio::test]
    async fn discard_removes_the_draft() {
        let store = store();
        let draft = store.start("uid-1", Utc::now());
        let id = draft.id.clone();
        store.save(draft).await;

        store.discard(&id, "uid-1").await.unwrap();
        assert!(store.get_owned(&id, "uid-1").await.is_err());
    }
}
