// ============================================================================
// Sélection : type de graphique, période, processeurs affichés
// ============================================================================
// L'utilisateur choisit :
// - le graphique (récompenses en USD ou nombre de devices)
// - la période propre à chaque graphique
// - les processeurs à afficher (partagés entre les deux graphiques)
// ============================================================================

use std::collections::BTreeSet;

use chrono::{DateTime, Months, Utc};

use crate::models::processor::normalize_processor_name;

/// Graphique affiché
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    /// Récompenses horaires converties en USD
    Revenue,
    /// Nombre de devices par processeur
    DeviceCount,
}

impl ChartKind {
    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Revenue => "Récompenses (USD/heure)",
            ChartKind::DeviceCount => "Nombre de devices",
        }
    }

    /// Unité de l'axe Y
    pub fn unit(&self) -> &'static str {
        match self {
            ChartKind::Revenue => "USD",
            ChartKind::DeviceCount => "devices",
        }
    }

    /// Périodes proposées pour ce graphique
    pub fn ranges(&self) -> [TimeRange; 2] {
        match self {
            ChartKind::Revenue => [TimeRange::SevenDays, TimeRange::ThirtyDays],
            ChartKind::DeviceCount => [TimeRange::LastMonth, TimeRange::AllTime],
        }
    }

    pub fn default_range(&self) -> TimeRange {
        self.ranges()[0]
    }

    /// Bascule vers l'autre graphique
    pub fn toggle(&self) -> ChartKind {
        match self {
            ChartKind::Revenue => ChartKind::DeviceCount,
            ChartKind::DeviceCount => ChartKind::Revenue,
        }
    }
}

/// Période d'affichage, sert aussi de clé de cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeRange {
    SevenDays,
    ThirtyDays,
    /// Depuis la même date le mois précédent
    LastMonth,
    AllTime,
}

impl TimeRange {
    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::SevenDays => "7 jours",
            TimeRange::ThirtyDays => "30 jours",
            TimeRange::LastMonth => "Dernier mois",
            TimeRange::AllTime => "Tout",
        }
    }

    /// Nombre de jours demandés au flux de prix
    pub fn days(&self) -> Option<i64> {
        match self {
            TimeRange::SevenDays => Some(7),
            TimeRange::ThirtyDays => Some(30),
            TimeRange::LastMonth | TimeRange::AllTime => None,
        }
    }

    /// Début de la fenêtre, None = pas de limite
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeRange::SevenDays => Some(now - chrono::Duration::days(7)),
            TimeRange::ThirtyDays => Some(now - chrono::Duration::days(30)),
            TimeRange::LastMonth => {
                let midnight = now.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
                midnight.checked_sub_months(Months::new(1))
            }
            TimeRange::AllTime => None,
        }
    }
}

/// État de sélection piloté par l'utilisateur
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    pub chart: ChartKind,
    pub revenue_range: TimeRange,
    pub device_range: TimeRange,
    /// Noms canoniques des processeurs affichés
    pub processors: BTreeSet<String>,
}

impl Selection {
    /// Crée une sélection ; les noms sont normalisés
    pub fn new<I, S>(chart: ChartKind, processors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            chart,
            revenue_range: ChartKind::Revenue.default_range(),
            device_range: ChartKind::DeviceCount.default_range(),
            processors: processors
                .into_iter()
                .map(|p| normalize_processor_name(p.as_ref()))
                .collect(),
        }
    }

    /// Période du graphique demandé
    pub fn range_for(&self, kind: ChartKind) -> TimeRange {
        match kind {
            ChartKind::Revenue => self.revenue_range,
            ChartKind::DeviceCount => self.device_range,
        }
    }

    /// Période du graphique courant
    pub fn current_range(&self) -> TimeRange {
        self.range_for(self.chart)
    }

    /// Passe à la période suivante du graphique courant
    pub fn cycle_range(&mut self) -> TimeRange {
        let ranges = self.chart.ranges();
        let current = self.current_range();
        let next = if current == ranges[0] { ranges[1] } else { ranges[0] };
        match self.chart {
            ChartKind::Revenue => self.revenue_range = next,
            ChartKind::DeviceCount => self.device_range = next,
        }
        next
    }

    /// Ajoute ou retire un processeur ; retourne true s'il est désormais affiché
    pub fn toggle(&mut self, processor: &str) -> bool {
        let name = normalize_processor_name(processor);
        if self.processors.remove(&name) {
            false
        } else {
            self.processors.insert(name);
            true
        }
    }

    pub fn is_selected(&self, processor: &str) -> bool {
        self.processors.contains(processor)
    }
}
