//! In-process cache of sampled candidate pools, keyed by meal slot and preference signature.
//!
//! Entries expire lazily: a read at or after the expiry evicts the entry and reports a miss.
//! There is no background sweep.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::models::{
    menu::{MealType, MenuItem},
    preference::PreferenceSignature,
};

pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    slot: MealType,
    signature: PreferenceSignature,
}

/// Pool and expiry live in one record so they are always replaced together.
#[derive(Debug, Clone)]
struct CacheEntry {
    candidates: Vec<MenuItem>,
    expires_at: Instant,
}

#[derive(Debug, Default)]
pub struct CandidateCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
}

impl CandidateCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<CacheKey, CacheEntry>> {
        // A panic while holding the lock cannot leave an entry half-written.
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Cached pool for the key, or `None` if absent or expired.
    pub fn get(&self, slot: MealType, signature: &PreferenceSignature) -> Option<Vec<MenuItem>> {
        let key = CacheKey {
            slot,
            signature: signature.clone(),
        };
        let mut entries = self.lock();
        match entries.get(&key) {
            Some(entry) if Instant::now() < entry.expires_at => {
                debug!("candidate cache HIT {slot} {}", signature.as_str());
                Some(entry.candidates.clone())
            }
            Some(_) => {
                entries.remove(&key);
                debug!("candidate cache EXPIRED {slot} {}", signature.as_str());
                None
            }
            None => {
                debug!("candidate cache MISS {slot} {}", signature.as_str());
                None
            }
        }
    }

    /// Store a pool, replacing any existing entry for the key.
    pub fn put(
        &self,
        slot: MealType,
        signature: PreferenceSignature,
        candidates: Vec<MenuItem>,
        ttl: Duration,
    ) {
        let entry = CacheEntry {
            candidates,
            expires_at: Instant::now() + ttl,
        };
        self.lock().insert(CacheKey { slot, signature }, entry);
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn item(title: &str) -> MenuItem {
        MenuItem {
            id: Uuid::new_v4(),
            title: title.into(),
            meal_type: MealType::Breakfast,
            cuisine: "Thai".into(),
            is_active: true,
            notes: None,
            allergens: vec![],
            budget_min: None,
            budget_max: None,
            image_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_within_ttl() {
        let cache = CandidateCache::new();
        let sig = PreferenceSignature::default_profile();
        let pool = vec![item("Jok"), item("Congee")];
        cache.put(MealType::Breakfast, sig.clone(), pool.clone(), DEFAULT_TTL);

        tokio::time::advance(Duration::from_secs(299)).await;
        assert_eq!(cache.get(MealType::Breakfast, &sig), Some(pool));
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_evicted_on_read() {
        let cache = CandidateCache::new();
        let sig = PreferenceSignature::default_profile();
        cache.put(MealType::Breakfast, sig.clone(), vec![item("Jok")], DEFAULT_TTL);

        tokio::time::advance(DEFAULT_TTL).await;
        // Still stored until someone reads it
        assert_eq!(cache.len(), 1);
        assert!(cache.get(MealType::Breakfast, &sig).is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_overwrites_and_resets_expiry() {
        let cache = CandidateCache::new();
        let sig = PreferenceSignature::default_profile();
        cache.put(MealType::Lunch, sig.clone(), vec![item("old")], Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;

        let fresh = vec![item("new")];
        cache.put(MealType::Lunch, sig.clone(), fresh.clone(), Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(8)).await;

        assert_eq!(cache.get(MealType::Lunch, &sig), Some(fresh));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_keys_are_slot_scoped() {
        let cache = CandidateCache::new();
        let sig = PreferenceSignature::default_profile();
        cache.put(MealType::Lunch, sig.clone(), vec![item("Pad Thai")], DEFAULT_TTL);

        assert!(cache.get(MealType::Dinner, &sig).is_none());
        assert!(cache.get(MealType::Lunch, &sig).is_some());
    }

    #[tokio::test]
    async fn test_concurrent_puts_keep_one_entry_per_key() {
        let cache = std::sync::Arc::new(CandidateCache::new());
        let sig = PreferenceSignature::default_profile();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let cache = cache.clone();
                let sig = sig.clone();
                tokio::spawn(async move {
                    cache.put(MealType::Dinner, sig, vec![item(&format!("dish {i}"))], DEFAULT_TTL);
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(MealType::Dinner, &sig).unwrap().len(), 1);
    }
}
