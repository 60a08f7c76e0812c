// ============================================================================
// Séries temporelles : prix, récompenses, devices, points fusionnés
// ============================================================================
// CONCEPTS :
// - PriceSeries : prix de clôture horaire (une entrée par heure)
// - RewardEvent : récompenses brutes par processeur pour une heure
// - DeviceSnapshot : nombre de devices par processeur pour une heure
// - MergedPoint : résultat de l'agrégation (heure, processeur, valeur)
//
// Les montants sont des rust_decimal::Decimal : l'arrondi à 2 décimales
// puis la somme doivent tomber juste, ce que f64 ne garantit pas.
// ============================================================================

use std::collections::{BTreeMap, HashMap};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::HourKey;

/// Arrondi monétaire à 2 décimales (0.005 -> 0.01)
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Prix horaires indexés par heure
#[derive(Debug, Clone, Default)]
pub struct PriceSeries {
    prices: HashMap<HourKey, Decimal>,
}

impl PriceSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ajoute un prix ; une heure déjà présente est écrasée (last-write-wins)
    pub fn insert(&mut self, hour: HourKey, price: Decimal) {
        self.prices.insert(hour, price);
    }

    pub fn get(&self, hour: &HourKey) -> Option<Decimal> {
        self.prices.get(hour).copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

impl FromIterator<(HourKey, Decimal)> for PriceSeries {
    fn from_iter<I: IntoIterator<Item = (HourKey, Decimal)>>(iter: I) -> Self {
        let mut series = PriceSeries::new();
        for (hour, price) in iter {
            series.insert(hour, price);
        }
        series
    }
}

/// Récompense brute d'un processeur (libellé d'origine conservé)
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorReward {
    pub name: String,
    pub reward: Decimal,
}

impl ProcessorReward {
    pub fn new(name: impl Into<String>, reward: Decimal) -> Self {
        Self {
            name: name.into(),
            reward,
        }
    }
}

/// Événement de récompense : une heure, plusieurs processeurs
#[derive(Debug, Clone, PartialEq)]
pub struct RewardEvent {
    pub hour: HourKey,
    pub rewards: Vec<ProcessorReward>,
}

/// Relevé du nombre de devices par processeur
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    pub hour: HourKey,
    pub counts: BTreeMap<String, Decimal>,
}

/// Point agrégé prêt pour le graphique
///
/// Invariant : value > 0, un seul point par couple (heure, processeur)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedPoint {
    pub hour: HourKey,
    pub processor: String,
    pub value: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_round2_midpoint_away_from_zero() {
        assert_eq!(round2(dec!(1.005)), dec!(1.01));
        assert_eq!(round2(dec!(1.004)), dec!(1.00));
        assert_eq!(round2(dec!(0.125)), dec!(0.13));
    }

    #[test]
    fn test_price_series_last_write_wins() {
        let hour = HourKey::parse_file_name("2024-6-3-10").unwrap();
        let series: PriceSeries = vec![(hour, dec!(1.50)), (hour, dec!(2.00))].into_iter().collect();
        assert_eq!(series.len(), 1);
        assert_eq!(series.get(&hour), Some(dec!(2.00)));
    }
}
