// ============================================================================
// Module : scheduler
// ============================================================================
// Tâches périodiques (rafraîchissement des données, purge du cache, prix)
//
// CONCEPT RUST : RAII
// - PeriodicTask::start() acquiert la tâche tokio
// - stop() ou Drop l'annule : une tâche ne survit jamais à son handle
// - plus de timer "oublié" quand l'écran qui l'a lancé disparaît
// ============================================================================

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Signal émis par une tâche périodique vers l'event loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Recharger la série du graphique courant (sans cache)
    RefreshData,
    /// Recharger le prix spot
    RefreshPrice,
    /// Purger les entrées expirées du cache
    SweepCache,
}

/// Handle d'une tâche périodique
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl PeriodicTask {
    /// Lance `tick` toutes les `period` sur le runtime donné
    ///
    /// Le premier tick a lieu après une période complète : le chargement
    /// initial est fait explicitement par l'appelant. La tâche s'arrête
    /// d'elle-même si `tick` retourne false (ex : canal fermé).
    pub fn start<F>(runtime: &Handle, name: &'static str, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        info!(task = name, period_secs = period.as_secs_f64(), "Starting periodic task");

        let handle = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Le premier tick de tokio est immédiat
            interval.tick().await;

            loop {
                interval.tick().await;
                debug!(task = name, "Periodic tick");
                if !tick() {
                    info!(task = name, "Periodic task finished (receiver gone)");
                    break;
                }
            }
        });

        Self {
            name,
            handle: Some(handle),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Vérifie si la tâche tourne encore
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Annule la tâche
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!(task = self.name, "Stopping periodic task");
            handle.abort();
        }
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task(period_ms: u64) -> (PeriodicTask, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let task = PeriodicTask::start(&Handle::current(), "test", Duration::from_millis(period_ms), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            true
        });
        (task, count)
    }

    #[tokio::test]
    async fn test_ticks_until_stopped() {
        let (mut task, count) = counting_task(20);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(count.load(Ordering::SeqCst) >= 2);
        assert!(task.is_running());

        task.stop();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let after_stop = count.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), after_stop);
        assert!(!task.is_running());
    }

    #[tokio::test]
    async fn test_drop_aborts() {
        let (task, count) = counting_task(20);
        drop(task);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_tick_after_one_period() {
        let (_task, count) = counting_task(500);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_stops_when_tick_returns_false() {
        let task = PeriodicTask::start(&Handle::current(), "once", Duration::from_millis(10), || false);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!task.is_running());
        assert_eq!(task.name(), "once");
    }
}
