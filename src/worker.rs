// ============================================================================
// Module : worker
// ============================================================================
// Worker d'arrière-plan : exécute les appels réseau sans bloquer l'UI
//
// CONCEPT RUST : Command pattern avec channels
// - l'event loop envoie des Command au worker (std::sync::mpsc)
// - le worker exécute la tâche async (block_on sur le runtime tokio)
// - il renvoie un Outcome que l'event loop applique à l'état
//
// Le worker possède le FeedClient et le cache : un seul écrivain, pas de
// verrou. Chaque chargement de série porte un RequestId ; seul le résultat
// de la dernière requête émise pour un graphique est appliqué.
// ============================================================================

use std::collections::HashMap;
use std::sync::mpsc;
use std::thread::JoinHandle;

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::runtime::Handle;
use tracing::{debug, error, info, instrument, warn};

use crate::aggregate::{aggregate, DeviceCountSource, RewardSource};
use crate::api::FeedClient;
use crate::cache::ResultCache;
use crate::config::RefreshConfig;
use crate::models::{ChartKind, MergedPoint, RewardEvent, TimeRange};

// ============================================================================
// Séquençage des requêtes
// ============================================================================

/// Identifiant monotone d'une requête de chargement
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(u64);

/// Émet les RequestId et retient le dernier émis par graphique
#[derive(Debug, Default)]
pub struct RequestSequencer {
    next: u64,
    latest: HashMap<ChartKind, RequestId>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Émet un nouvel identifiant ; il devient le seul valide pour ce graphique
    pub fn issue(&mut self, kind: ChartKind) -> RequestId {
        self.next += 1;
        let id = RequestId(self.next);
        self.latest.insert(kind, id);
        id
    }

    /// Vérifie que la réponse correspond à la dernière requête émise
    pub fn is_current(&self, kind: ChartKind, id: RequestId) -> bool {
        self.latest.get(&kind) == Some(&id)
    }
}

// ============================================================================
// Commandes et résultats
// ============================================================================

/// Commandes envoyées au worker
#[derive(Debug, Clone)]
pub enum Command {
    /// Charger une série ; `force` ignore le cache (rafraîchissement périodique)
    LoadSeries {
        kind: ChartKind,
        range: TimeRange,
        request: RequestId,
        force: bool,
    },

    /// Prix spot du token
    RefreshSpotPrice,

    /// Données du calculateur de ROI (dernières récompenses, taux CNY)
    LoadRoiInputs,

    LoadAnnouncements,

    /// Purge des entrées trop vieilles du cache
    SweepCache,
}

/// Résultats renvoyés par le worker
#[derive(Debug)]
pub enum Outcome {
    SeriesLoaded {
        kind: ChartKind,
        range: TimeRange,
        request: RequestId,
        points: Vec<MergedPoint>,
    },

    SeriesFailed {
        kind: ChartKind,
        request: RequestId,
        error: String,
    },

    SpotPrice(Decimal),

    /// Chaque champ est None si son flux a échoué
    RoiInputs {
        latest: Option<RewardEvent>,
        usd_to_cny: Option<Decimal>,
    },

    Announcements(Vec<String>),

    CacheSwept { removed: usize },

    /// Échec d'un flux annexe (prix, annonces, ROI)
    FeedFailed { feed: &'static str, error: String },
}

// ============================================================================
// Worker
// ============================================================================

/// Exécute les commandes ; possède le client et le cache
pub struct Worker {
    client: FeedClient,
    cache: ResultCache<TimeRange, Vec<MergedPoint>>,
}

impl Worker {
    pub fn new(client: FeedClient, refresh: &RefreshConfig) -> Self {
        Self {
            client,
            cache: ResultCache::new(refresh.cache_fresh(), refresh.cache_evict()),
        }
    }

    /// Traite une commande ; les erreurs deviennent des Outcome (log and skip)
    pub async fn handle(&mut self, command: Command) -> Outcome {
        match command {
            Command::LoadSeries {
                kind,
                range,
                request,
                force,
            } => match self.load_series(kind, range, force).await {
                Ok(points) => Outcome::SeriesLoaded {
                    kind,
                    range,
                    request,
                    points,
                },
                Err(e) => {
                    error!(?kind, ?range, error = ?e, "Failed to load series");
                    Outcome::SeriesFailed {
                        kind,
                        request,
                        error: format!("{e:#}"),
                    }
                }
            },

            Command::RefreshSpotPrice => match self.client.fetch_spot_price().await {
                Ok(price) => Outcome::SpotPrice(price),
                Err(e) => feed_failed("prix spot", e),
            },

            Command::LoadRoiInputs => {
                let latest = match self.client.fetch_reward_events().await {
                    Ok(mut events) => events.pop(),
                    Err(e) => {
                        error!(error = ?e, "Failed to load latest rewards");
                        None
                    }
                };
                let usd_to_cny = match self.client.fetch_cny_rate().await {
                    Ok(rate) => Some(rate),
                    Err(e) => {
                        error!(error = ?e, "Failed to load exchange rate");
                        None
                    }
                };
                Outcome::RoiInputs { latest, usd_to_cny }
            }

            Command::LoadAnnouncements => match self.client.fetch_announcements().await {
                Ok(list) => Outcome::Announcements(list),
                Err(e) => feed_failed("annonces", e),
            },

            Command::SweepCache => {
                let removed = self.cache.sweep();
                info!(removed, remaining = self.cache.len(), "Cache swept");
                Outcome::CacheSwept { removed }
            }
        }
    }

    /// Charge une série agrégée, depuis le cache si possible
    #[instrument(skip(self))]
    pub async fn load_series(&mut self, kind: ChartKind, range: TimeRange, force: bool) -> Result<Vec<MergedPoint>> {
        if !force {
            if let Some(points) = self.cache.get(&range) {
                debug!(points = points.len(), "Serving series from cache");
                return Ok(points);
            }
        }

        let points = match kind {
            ChartKind::Revenue => {
                let prices = self.client.fetch_price_series(range).await?;
                let events = self.client.fetch_reward_events().await?;
                aggregate(&RewardSource {
                    prices: &prices,
                    events: &events,
                })
            }
            ChartKind::DeviceCount => {
                let snapshots = self.client.fetch_device_snapshots().await?;
                aggregate(&DeviceCountSource {
                    snapshots: &snapshots,
                    since: range.since(Utc::now()),
                })
            }
        };

        if points.is_empty() {
            warn!("Series is empty after join");
        }
        info!(points = points.len(), "Series loaded");

        self.cache.put(range, points.clone());
        Ok(points)
    }
}

fn feed_failed(feed: &'static str, e: anyhow::Error) -> Outcome {
    error!(feed, error = ?e, "Feed request failed");
    Outcome::FeedFailed {
        feed,
        error: format!("{e:#}"),
    }
}

/// Lance le worker dans un thread dédié
///
/// CONCEPT : block_on dans un worker thread
/// - block_on() bloque le thread worker, pas l'UI
/// - la boucle s'arrête quand le canal de commandes est fermé
pub fn spawn_worker(
    runtime: Handle,
    mut worker: Worker,
    command_rx: mpsc::Receiver<Command>,
    result_tx: mpsc::Sender<Outcome>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new().name("iodash-worker".to_string()).spawn(move || {
        while let Ok(command) = command_rx.recv() {
            info!(?command, "Worker received command");
            let outcome = runtime.block_on(worker.handle(command));
            if result_tx.send(outcome).is_err() {
                break;
            }
        }
        info!("Worker thread exiting (channel closed)");
    })
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FeedsConfig;
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    #[test]
    fn test_sequencer_only_latest_is_current() {
        let mut seq = RequestSequencer::new();
        let first = seq.issue(ChartKind::Revenue);
        let devices = seq.issue(ChartKind::DeviceCount);
        let second = seq.issue(ChartKind::Revenue);

        assert!(!seq.is_current(ChartKind::Revenue, first));
        assert!(seq.is_current(ChartKind::Revenue, second));
        assert!(seq.is_current(ChartKind::DeviceCount, devices));
        assert!(!seq.is_current(ChartKind::DeviceCount, second));
        assert!(first < second);
    }

    async fn revenue_server(hits: usize) -> (mockito::ServerGuard, mockito::Mock, mockito::Mock) {
        let mut server = mockito::Server::new_async().await;
        // Heure courante : les récompenses doivent tomber sur une chandelle existante
        let hour_ms = Utc::now().timestamp() / 3600 * 3600 * 1000;

        let klines = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(r#"[[{hour_ms}, "0", "0", "0", "2.00", "0"]]"#))
            .expect(hits)
            .create_async()
            .await;

        let rewards = server
            .mock("GET", "/rewards")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"{{"processorData": [{{"datetime": {hour_ms}, "processors": [
                    {{"name": "A100-40G", "reward": 1.5}}, {{"name": "a100 80g", "reward": 0.5}}]}}]}}"#
            ))
            .expect(hits)
            .create_async()
            .await;

        (server, klines, rewards)
    }

    fn worker_for(server: &mockito::ServerGuard) -> Worker {
        let base = server.url();
        let client = FeedClient::new(FeedsConfig {
            binance_url: base.clone(),
            rewards_url: format!("{base}/rewards"),
            devices_url: format!("{base}/devices"),
            ..FeedsConfig::default()
        })
        .unwrap();
        Worker::new(client, &RefreshConfig::default())
    }

    #[tokio::test]
    async fn test_revenue_series_joined_and_cached() {
        let (server, klines, rewards) = revenue_server(1).await;
        let mut worker = worker_for(&server);

        let first = worker.load_series(ChartKind::Revenue, TimeRange::SevenDays, false).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].processor, "a100");
        assert_eq!(first[0].value, dec!(4.00));

        // Deuxième appel dans la fenêtre de fraîcheur : aucun appel réseau
        let second = worker.load_series(ChartKind::Revenue, TimeRange::SevenDays, false).await.unwrap();
        assert_eq!(first, second);

        klines.assert_async().await;
        rewards.assert_async().await;
    }

    #[tokio::test]
    async fn test_forced_load_bypasses_cache() {
        let (server, klines, rewards) = revenue_server(2).await;
        let mut worker = worker_for(&server);

        worker.load_series(ChartKind::Revenue, TimeRange::SevenDays, false).await.unwrap();
        worker.load_series(ChartKind::Revenue, TimeRange::SevenDays, true).await.unwrap();

        klines.assert_async().await;
        rewards.assert_async().await;
    }

    #[tokio::test]
    async fn test_failure_reported_with_request_id() {
        let mut server = mockito::Server::new_async().await;
        let _devices = server.mock("GET", "/devices").with_status(500).create_async().await;
        let mut worker = worker_for(&server);

        let mut seq = RequestSequencer::new();
        let request = seq.issue(ChartKind::DeviceCount);
        let outcome = worker
            .handle(Command::LoadSeries {
                kind: ChartKind::DeviceCount,
                range: TimeRange::AllTime,
                request,
                force: false,
            })
            .await;

        match outcome {
            Outcome::SeriesFailed { kind, request: id, error } => {
                assert_eq!(kind, ChartKind::DeviceCount);
                assert_eq!(id, request);
                assert!(error.contains("500"));
            }
            other => panic!("résultat inattendu : {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_sweep_on_empty_cache() {
        let server = mockito::Server::new_async().await;
        let mut worker = worker_for(&server);
        assert!(matches!(worker.handle(Command::SweepCache).await, Outcome::CacheSwept { removed: 0 }));
    }
}
