// ============================================================================
// Module : models
// ============================================================================
// Structures de données du dashboard : clés horaires, séries, sélection,
// modèle du graphique, ROI et annonces
// ============================================================================

pub mod announcement; // Décodage et découpage des annonces
pub mod chart_model;  // Graphique multi-séries (render / update)
pub mod hour_key;     // Clé horaire canonique
pub mod processor;    // Normalisation des noms de processeurs
pub mod roi;          // Calculateur de retour sur investissement
pub mod selection;    // Graphique, période et processeurs sélectionnés
pub mod series;       // Prix, récompenses, devices, points fusionnés

// Re-export des structures principales pour simplifier les imports
pub use chart_model::{ChartModel, SeriesChart, SeriesLine};
pub use hour_key::{HourKey, HourKeyError, RawTimestamp};
pub use processor::{normalize_processor_name, ProcessorGroup, APPLE_PROCESSORS};
pub use roi::{RoiCalculator, RoiError, RoiUnit};
pub use selection::{ChartKind, Selection, TimeRange};
pub use series::{DeviceSnapshot, MergedPoint, PriceSeries, ProcessorReward, RewardEvent};
