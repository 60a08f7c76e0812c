// ============================================================================
// Module : cache
// ============================================================================
// Cache mémoire des résultats agrégés
//
// - La clé est la requête logique (la période), jamais l'instant du fetch
// - L'instant du fetch est stocké à côté, pour juger de la fraîcheur
// - get() ne renvoie une entrée que si elle est plus jeune que fresh_for
// - sweep() supprime les entrées plus vieilles que evict_after, qu'elles
//   aient été lues ou non
//
// Le cache appartient au worker : un seul écrivain, pas de verrou.
// ============================================================================

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::debug;

/// Entrée du cache : données + instant du fetch
#[derive(Debug, Clone)]
struct CacheEntry<V> {
    payload: V,
    fetched_at: Instant,
}

/// Cache à durée de vie bornée
#[derive(Debug)]
pub struct ResultCache<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    fresh_for: Duration,
    evict_after: Duration,
}

impl<K, V> ResultCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    /// Crée un cache vide
    ///
    /// * `fresh_for` - âge maximum d'une entrée servie par get()
    /// * `evict_after` - âge à partir duquel sweep() supprime l'entrée
    pub fn new(fresh_for: Duration, evict_after: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            fresh_for,
            evict_after,
        }
    }

    /// Retourne les données si elles sont encore fraîches
    pub fn get(&self, key: &K) -> Option<V> {
        self.get_at(key, Instant::now())
    }

    pub fn get_at(&self, key: &K, now: Instant) -> Option<V> {
        let entry = self.entries.get(key)?;
        let age = now.saturating_duration_since(entry.fetched_at);
        if age < self.fresh_for {
            debug!(?key, age_secs = age.as_secs(), "Cache hit");
            Some(entry.payload.clone())
        } else {
            debug!(?key, age_secs = age.as_secs(), "Cache entry too old");
            None
        }
    }

    /// Stocke (ou remplace) les données avec l'instant courant
    pub fn put(&mut self, key: K, payload: V) {
        self.put_at(key, payload, Instant::now());
    }

    pub fn put_at(&mut self, key: K, payload: V, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                payload,
                fetched_at: now,
            },
        );
    }

    /// Supprime les entrées trop vieilles, retourne le nombre supprimé
    pub fn sweep(&mut self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        let evict_after = self.evict_after;
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.fetched_at) < evict_after);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TimeRange;

    const FRESH: Duration = Duration::from_secs(5 * 60);
    const EVICT: Duration = Duration::from_secs(30 * 60);

    #[test]
    fn test_get_after_put_within_freshness() {
        let mut cache = ResultCache::new(FRESH, EVICT);
        let t0 = Instant::now();
        cache.put_at(TimeRange::SevenDays, vec![1, 2, 3], t0);

        let hit = cache.get_at(&TimeRange::SevenDays, t0 + Duration::from_secs(299));
        assert_eq!(hit, Some(vec![1, 2, 3]));
        assert_eq!(cache.get_at(&TimeRange::ThirtyDays, t0), None);
    }

    #[test]
    fn test_stale_entry_misses_but_stays_until_sweep() {
        let mut cache = ResultCache::new(FRESH, EVICT);
        let t0 = Instant::now();
        cache.put_at(TimeRange::SevenDays, "data", t0);

        assert_eq!(cache.get_at(&TimeRange::SevenDays, t0 + FRESH), None);
        assert_eq!(cache.sweep_at(t0 + FRESH), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_sweep_evicts_after_staleness_window() {
        let mut cache = ResultCache::new(FRESH, EVICT);
        let t0 = Instant::now();
        cache.put_at(TimeRange::SevenDays, "old", t0);
        cache.put_at(TimeRange::ThirtyDays, "recent", t0 + Duration::from_secs(20 * 60));

        let removed = cache.sweep_at(t0 + EVICT);
        assert_eq!(removed, 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_at(&TimeRange::SevenDays, t0 + EVICT), None);
    }

    #[test]
    fn test_put_refreshes_timestamp() {
        let mut cache = ResultCache::new(FRESH, EVICT);
        let t0 = Instant::now();
        cache.put_at(TimeRange::AllTime, 1, t0);
        cache.put_at(TimeRange::AllTime, 2, t0 + Duration::from_secs(600));

        assert_eq!(cache.get_at(&TimeRange::AllTime, t0 + Duration::from_secs(700)), Some(2));
    }
}
