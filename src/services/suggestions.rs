use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    models::{
        menu::{MealType, MenuItem},
        preference::{MenuFilter, Preference, PreferenceSignature},
        suggestion::{DailySuggestion, SuggestionPatch},
    },
    services::{
        candidate_cache::{CandidateCache, DEFAULT_TTL},
        timezone::today_in,
    },
};

/// Read access to the menu catalog. Every method only considers active items of `slot`.
#[async_trait]
pub trait MenuCatalog: Send + Sync {
    /// Up to `count` random items matching `filter`.
    async fn sample_eligible(
        &self,
        slot: MealType,
        filter: &MenuFilter,
        count: usize,
    ) -> anyhow::Result<Vec<MenuItem>>;

    async fn pick_one_eligible(
        &self,
        slot: MealType,
        filter: &MenuFilter,
    ) -> anyhow::Result<Option<MenuItem>>;

    async fn pick_one_by_slot_only(&self, slot: MealType) -> anyhow::Result<Option<MenuItem>>;

    async fn most_recent_active(&self, slot: MealType) -> anyhow::Result<Option<MenuItem>>;
}

#[async_trait]
pub trait PreferenceStore: Send + Sync {
    async fn find_by_user(&self, user_id: Uuid) -> anyhow::Result<Option<Preference>>;
}

#[async_trait]
pub trait DailySuggestionStore: Send + Sync {
    /// Insert or merge the record for (user_id, date). Slots absent from `patch` keep their value.
    async fn upsert(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        patch: SuggestionPatch,
    ) -> anyhow::Result<DailySuggestion>;

    async fn find_one(&self, user_id: Uuid, date: NaiveDate)
        -> anyhow::Result<Option<DailySuggestion>>;
}

#[derive(Debug, Clone, Copy)]
pub struct SuggestionSettings {
    /// Size of the random sample fetched on a cache miss.
    pub sample_size: usize,
    pub cache_ttl: Duration,
}

impl Default for SuggestionSettings {
    fn default() -> Self {
        Self {
            sample_size: 10,
            cache_ttl: DEFAULT_TTL,
        }
    }
}

/// Picks one menu item per meal slot for a user's day.
///
/// The three slots of a generation are picked one after another so each pick can
/// exclude the items already chosen earlier in the same pass.
pub struct SuggestionEngine {
    catalog: Arc<dyn MenuCatalog>,
    preferences: Arc<dyn PreferenceStore>,
    store: Arc<dyn DailySuggestionStore>,
    cache: Arc<CandidateCache>,
    settings: SuggestionSettings,
    rng: Mutex<StdRng>,
}

impl SuggestionEngine {
    pub fn new(
        catalog: Arc<dyn MenuCatalog>,
        preferences: Arc<dyn PreferenceStore>,
        store: Arc<dyn DailySuggestionStore>,
        cache: Arc<CandidateCache>,
        settings: SuggestionSettings,
    ) -> Self {
        Self {
            catalog,
            preferences,
            store,
            cache,
            settings,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the random source, e.g. with a seeded one.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Drop every cached candidate pool. Call after any catalog write so a
    /// removed or changed item cannot be picked from a stale sample.
    pub fn invalidate_candidates(&self) {
        self.cache.clear();
        debug!("candidate cache cleared after catalog change");
    }

    pub async fn generate_today(
        &self,
        user_id: Uuid,
        timezone: &str,
    ) -> anyhow::Result<DailySuggestion> {
        let date = today_in(timezone, Utc::now())?;
        self.generate_for_date(user_id, date).await
    }

    /// Pick all three slots and overwrite the record for `date`.
    pub async fn generate_for_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<DailySuggestion> {
        let preference = self.preferences.find_by_user(user_id).await?;

        let mut used = HashSet::new();
        let mut picks: [Option<Uuid>; 3] = [None; 3];
        for (i, slot) in MealType::ALL.into_iter().enumerate() {
            if preference.as_ref().is_some_and(|p| p.excludes(slot)) {
                debug!("user {user_id} excludes {slot}, leaving it empty");
                continue;
            }
            if let Some(item) = self.pick(slot, preference.as_ref(), &used).await? {
                used.insert(item.id);
                picks[i] = Some(item.id);
            }
        }

        let [breakfast, lunch, dinner] = picks;
        self.store
            .upsert(user_id, date, SuggestionPatch::all(breakfast, lunch, dinner))
            .await
    }

    pub async fn get_today(
        &self,
        user_id: Uuid,
        timezone: &str,
    ) -> anyhow::Result<Option<DailySuggestion>> {
        let date = today_in(timezone, Utc::now())?;
        self.get_for_date(user_id, date).await
    }

    pub async fn get_for_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
    ) -> anyhow::Result<Option<DailySuggestion>> {
        self.store.find_one(user_id, date).await
    }

    pub async fn reroll(
        &self,
        user_id: Uuid,
        timezone: &str,
        slot: MealType,
    ) -> anyhow::Result<DailySuggestion> {
        let date = today_in(timezone, Utc::now())?;
        self.reroll_for_date(user_id, date, slot).await
    }

    /// Re-pick a single slot independently of the other two.
    ///
    /// Without an existing record this falls back to a full generation. When no item
    /// can be found the slot keeps its current value; a slot the user excludes is cleared.
    pub async fn reroll_for_date(
        &self,
        user_id: Uuid,
        date: NaiveDate,
        slot: MealType,
    ) -> anyhow::Result<DailySuggestion> {
        let Some(existing) = self.store.find_one(user_id, date).await? else {
            info!("no suggestion for user {user_id} on {date}, generating a full day");
            return self.generate_for_date(user_id, date).await;
        };

        let preference = self.preferences.find_by_user(user_id).await?;
        if preference.as_ref().is_some_and(|p| p.excludes(slot)) {
            return self
                .store
                .upsert(user_id, date, SuggestionPatch::only(slot, None))
                .await;
        }

        match self.pick(slot, preference.as_ref(), &HashSet::new()).await? {
            Some(item) => {
                self.store
                    .upsert(user_id, date, SuggestionPatch::only(slot, Some(item.id)))
                    .await
            }
            None => Ok(existing),
        }
    }

    /// One pick for `slot`: cached sample minus `used`, then the fallback tiers.
    async fn pick(
        &self,
        slot: MealType,
        preference: Option<&Preference>,
        used: &HashSet<Uuid>,
    ) -> anyhow::Result<Option<MenuItem>> {
        let filter = preference.map(MenuFilter::from).unwrap_or_default();
        let signature = PreferenceSignature::for_preference(preference);

        let pool = match self.cache.get(slot, &signature) {
            Some(pool) => pool,
            None => {
                let pool = self
                    .catalog
                    .sample_eligible(slot, &filter, self.settings.sample_size)
                    .await?;
                self.cache
                    .put(slot, signature, pool.clone(), self.settings.cache_ttl);
                pool
            }
        };

        let remaining: Vec<&MenuItem> = pool.iter().filter(|m| !used.contains(&m.id)).collect();
        if let Some(item) = self.choose(&remaining) {
            return Ok(Some(item.clone()));
        }

        if let Some(item) = self.catalog.pick_one_eligible(slot, &filter).await? {
            info!("{slot}: sample exhausted, used direct eligible pick (tier 1)");
            return Ok(Some(item));
        }
        if let Some(item) = self.catalog.pick_one_by_slot_only(slot).await? {
            info!("{slot}: no item matches preferences, ignoring filters (tier 2)");
            return Ok(Some(item));
        }
        if let Some(item) = self.catalog.most_recent_active(slot).await? {
            info!("{slot}: random pick empty, using most recent active item (tier 3)");
            return Ok(Some(item));
        }

        info!("{slot}: no active menu item, leaving slot empty");
        Ok(None)
    }

    fn choose<'a>(&self, candidates: &[&'a MenuItem]) -> Option<&'a MenuItem> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        candidates.choose(&mut *rng).copied()
    }
}
