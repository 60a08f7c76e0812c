// ============================================================================
// Module : aggregate
// ============================================================================
// Jointure et agrégation des séries temporelles
//
// Les deux graphiques partagent le même agrégateur. Chaque flux implémente
// TimeSeriesSource et expose des observations (heure, processeur, valeur) :
// - RewardSource : jointure prix × récompenses sur l'heure
// - DeviceCountSource : nombre de devices par processeur
//
// aggregate() normalise les noms, somme par (heure, processeur), supprime
// les valeurs non strictement positives et trie par heure croissante.
// ============================================================================

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::models::processor::{normalize_processor_name, ProcessorGroup, APPLE_PROCESSORS};
use crate::models::series::round2;
use crate::models::{DeviceSnapshot, HourKey, MergedPoint, PriceSeries, RewardEvent, Selection};

/// Une valeur brute pour un processeur à une heure donnée
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub hour: HourKey,
    /// Libellé d'origine, normalisé par aggregate()
    pub processor: String,
    pub value: Decimal,
}

/// Capacité commune aux flux agrégeables
///
/// CONCEPT RUST : Trait comme interface
/// - l'agrégateur ne connaît que ce contrat
/// - chaque flux garde sa propre forme de données
pub trait TimeSeriesSource {
    fn observations(&self) -> Vec<Observation>;
}

/// Récompenses converties en USD via le prix de la même heure
pub struct RewardSource<'a> {
    pub prices: &'a PriceSeries,
    pub events: &'a [RewardEvent],
}

impl TimeSeriesSource for RewardSource<'_> {
    fn observations(&self) -> Vec<Observation> {
        let mut observations = Vec::new();
        let mut unpriced = 0usize;

        for event in self.events {
            // Jointure interne : sans prix pour cette heure, l'événement entier est ignoré
            let Some(price) = self.prices.get(&event.hour) else {
                unpriced += 1;
                continue;
            };

            for reward in &event.rewards {
                // Valeur hors de la plage Decimal : l'observation est ignorée
                let Some(value) = reward.reward.checked_mul(price) else {
                    warn!(hour = %event.hour, processor = %reward.name, "Reward conversion overflowed, skipping");
                    continue;
                };
                observations.push(Observation {
                    hour: event.hour,
                    processor: reward.name.clone(),
                    value: round2(value),
                });
            }
        }

        if unpriced > 0 {
            debug!(unpriced, total = self.events.len(), "Reward events without matching price skipped");
        }
        observations
    }
}

/// Nombre de devices, éventuellement limité aux relevés récents
pub struct DeviceCountSource<'a> {
    pub snapshots: &'a [DeviceSnapshot],
    /// Relevés antérieurs ignorés (None = tout l'historique)
    pub since: Option<DateTime<Utc>>,
}

impl TimeSeriesSource for DeviceCountSource<'_> {
    fn observations(&self) -> Vec<Observation> {
        self.snapshots
            .iter()
            .filter(|snapshot| self.since.map_or(true, |since| snapshot.hour.datetime() >= since))
            .flat_map(|snapshot| {
                snapshot.counts.iter().map(move |(name, count)| Observation {
                    hour: snapshot.hour,
                    processor: name.clone(),
                    value: *count,
                })
            })
            .collect()
    }
}

/// Agrège une source en points fusionnés, triés par heure puis processeur
pub fn aggregate<S: TimeSeriesSource + ?Sized>(source: &S) -> Vec<MergedPoint> {
    // CONCEPT RUST : BTreeMap avec clé tuple
    // - un seul total par (heure, processeur canonique)
    // - l'ordre des clés donne directement l'ordre chronologique
    let mut totals: BTreeMap<(HourKey, String), Decimal> = BTreeMap::new();

    for observation in source.observations() {
        let name = normalize_processor_name(&observation.processor);
        let total = totals.entry((observation.hour, name)).or_insert(Decimal::ZERO);
        match total.checked_add(observation.value) {
            Some(sum) => *total = sum,
            None => warn!(hour = %observation.hour, processor = %observation.processor, "Sum overflowed, observation skipped"),
        }
    }

    totals
        .into_iter()
        .filter(|(_, value)| *value > Decimal::ZERO)
        .map(|((hour, processor), value)| MergedPoint { hour, processor, value })
        .collect()
}

/// Garde uniquement les processeurs sélectionnés
pub fn filter_selected(points: &[MergedPoint], selection: &Selection) -> Vec<MergedPoint> {
    points
        .iter()
        .filter(|point| selection.is_selected(&point.processor))
        .cloned()
        .collect()
}

/// Options de sélection, réparties en deux groupes
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessorOptions {
    /// Processeurs présents dans les données, hors liste Apple
    pub nvidia: Vec<String>,
    /// Liste Apple fixe
    pub apple: Vec<String>,
}

impl ProcessorOptions {
    /// Toutes les options dans l'ordre d'affichage (NVIDIA puis Apple)
    pub fn all(&self) -> impl Iterator<Item = (ProcessorGroup, &str)> {
        self.nvidia
            .iter()
            .map(|p| (ProcessorGroup::Nvidia, p.as_str()))
            .chain(self.apple.iter().map(|p| (ProcessorGroup::Apple, p.as_str())))
    }

    pub fn len(&self) -> usize {
        self.nvidia.len() + self.apple.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Calcule les options à partir des points disponibles
pub fn processor_options(points: &[MergedPoint]) -> ProcessorOptions {
    let nvidia: BTreeSet<&str> = points
        .iter()
        .map(|point| point.processor.as_str())
        .filter(|name| ProcessorGroup::of(name) == ProcessorGroup::Nvidia)
        .collect();

    ProcessorOptions {
        nvidia: nvidia.into_iter().map(str::to_string).collect(),
        apple: APPLE_PROCESSORS.iter().map(|p| p.to_string()).collect(),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChartKind, ProcessorReward};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn hour(file_name: &str) -> HourKey {
        HourKey::parse_file_name(file_name).unwrap()
    }

    fn event(file_name: &str, rewards: &[(&str, Decimal)]) -> RewardEvent {
        RewardEvent {
            hour: hour(file_name),
            rewards: rewards
                .iter()
                .map(|(name, reward)| ProcessorReward::new(*name, *reward))
                .collect(),
        }
    }

    #[test]
    fn test_a100_variants_merge_into_one_point() {
        let prices: PriceSeries = [(hour("2024-6-3-10"), dec!(2.00))].into_iter().collect();
        let events = [event("2024-6-3-10", &[("A100-40G", dec!(1.5)), ("a100 80g", dec!(0.5))])];

        let merged = aggregate(&RewardSource { prices: &prices, events: &events });

        assert_eq!(
            merged,
            vec![MergedPoint {
                hour: hour("2024-6-3-10"),
                processor: "a100".to_string(),
                value: dec!(4.00),
            }]
        );
    }

    #[test]
    fn test_event_without_price_is_dropped_entirely() {
        let prices: PriceSeries = [(hour("2024-6-3-10"), dec!(2.00))].into_iter().collect();
        let events = [
            event("2024-6-3-10", &[("rtx 4090", dec!(1))]),
            event("2024-6-3-11", &[("rtx 4090", dec!(1)), ("m3", dec!(3))]),
        ];

        let merged = aggregate(&RewardSource { prices: &prices, events: &events });

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].hour, hour("2024-6-3-10"));
    }

    #[test]
    fn test_rounding_happens_before_summation() {
        let prices: PriceSeries = [(hour("2024-6-3-10"), dec!(0.333))].into_iter().collect();
        // 1 × 0.333 = 0.333 → 0.33 ; 0.015 × 0.333 = 0.004995 → 0.00 ; 1.5 × 0.333 = 0.4995 → 0.50
        let events = [event(
            "2024-6-3-10",
            &[("A100 40G", dec!(1)), ("A100 80G", dec!(0.015)), ("a100 pcie", dec!(1.5))],
        )];

        let merged = aggregate(&RewardSource { prices: &prices, events: &events });

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value, dec!(0.83));
    }

    #[test]
    fn test_sums_across_events_of_same_hour() {
        let prices: PriceSeries = [(hour("2024-6-3-10"), dec!(1.10))].into_iter().collect();
        let events = [
            event("2024-6-3-10", &[("RTX 4090", dec!(0.1))]),
            event("2024-6-3-10", &[("rtx 4090", dec!(0.2))]),
        ];

        let merged = aggregate(&RewardSource { prices: &prices, events: &events });

        // 0.11 + 0.22, exact en Decimal
        assert_eq!(merged[0].value, dec!(0.33));
    }

    #[test]
    fn test_non_positive_values_dropped() {
        let prices: PriceSeries = [(hour("2024-6-3-10"), dec!(1))].into_iter().collect();
        let events = [event(
            "2024-6-3-10",
            &[("zero", dec!(0)), ("tiny", dec!(0.01)), ("negative", dec!(-2)), ("rounded away", dec!(0.004))],
        )];

        let merged = aggregate(&RewardSource { prices: &prices, events: &events });

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].processor, "tiny");
        assert_eq!(merged[0].value, dec!(0.01));
    }

    #[test]
    fn test_overflowing_values_are_skipped() {
        let prices: PriceSeries = [(hour("2024-6-3-10"), dec!(2))].into_iter().collect();
        let events = [event("2024-6-3-10", &[("x", Decimal::MAX), ("rtx 4090", dec!(1))])];

        let merged = aggregate(&RewardSource { prices: &prices, events: &events });

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].processor, "rtx 4090");
        assert_eq!(merged[0].value, dec!(2));
    }

    #[test]
    fn test_overflowing_sum_keeps_previous_total() {
        let snapshots = vec![DeviceSnapshot {
            hour: hour("2024-6-3-7"),
            counts: [("A100 40G".to_string(), Decimal::MAX), ("A100 80G".to_string(), dec!(1))]
                .into_iter()
                .collect(),
        }];

        let merged = aggregate(&DeviceCountSource { snapshots: &snapshots, since: None });

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value, Decimal::MAX);
    }

    #[test]
    fn test_output_sorted_by_hour() {
        let prices: PriceSeries = [
            (hour("2024-6-3-9"), dec!(1)),
            (hour("2024-6-3-10"), dec!(1)),
            (hour("2024-6-3-11"), dec!(1)),
        ]
        .into_iter()
        .collect();
        let events = [
            event("2024-6-3-11", &[("m3", dec!(1))]),
            event("2024-6-3-9", &[("m3", dec!(1))]),
            event("2024-6-3-10", &[("m3", dec!(1))]),
        ];

        let merged = aggregate(&RewardSource { prices: &prices, events: &events });
        let hours: Vec<HourKey> = merged.iter().map(|p| p.hour).collect();

        assert_eq!(hours, vec![hour("2024-6-3-9"), hour("2024-6-3-10"), hour("2024-6-3-11")]);
    }

    #[test]
    fn test_device_counts_merge_a100_and_respect_since() {
        let snapshots = vec![
            DeviceSnapshot {
                hour: hour("2024-5-1-0"),
                counts: [("A100 40G".to_string(), dec!(5))].into_iter().collect(),
            },
            DeviceSnapshot {
                hour: hour("2024-6-3-7"),
                counts: [
                    ("A100 40G".to_string(), dec!(10)),
                    ("A100 80G".to_string(), dec!(4)),
                    ("RTX 4090".to_string(), dec!(120)),
                ]
                .into_iter()
                .collect(),
            },
        ];

        let since = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let merged = aggregate(&DeviceCountSource { snapshots: &snapshots, since: Some(since) });

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].processor, "a100");
        assert_eq!(merged[0].value, dec!(14));
        assert_eq!(merged[1].processor, "rtx 4090");

        let all = aggregate(&DeviceCountSource { snapshots: &snapshots, since: None });
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_filter_and_options() {
        let points: Vec<MergedPoint> = ["a100", "rtx 4090", "m3"]
            .iter()
            .map(|name| MergedPoint {
                hour: hour("2024-6-3-10"),
                processor: name.to_string(),
                value: dec!(1),
            })
            .collect();

        let selection = Selection::new(ChartKind::Revenue, ["A100-80G", "m3"]);
        let filtered = filter_selected(&points, &selection);
        assert_eq!(filtered.len(), 2);

        let options = processor_options(&points);
        assert_eq!(options.nvidia, vec!["a100", "rtx 4090"]);
        assert_eq!(options.apple.len(), 6);
        assert_eq!(options.len(), 8);
        assert_eq!(options.all().next(), Some((ProcessorGroup::Nvidia, "a100")));
    }
}
