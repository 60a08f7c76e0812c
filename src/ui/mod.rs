// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod chart;     // Graphique des séries
pub mod dashboard; // Layout principal et routing par écran
pub mod events;    // Gestion des événements clavier
pub mod picker;    // Sélection des processeurs
pub mod roi;       // Calculateur de ROI

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{Event, EventHandler};
