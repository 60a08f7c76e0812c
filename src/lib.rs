// ============================================================================
// iodash - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod aggregate; // Fusion des flux en séries par heure et processeur
pub mod api;       // Clients des flux externes
pub mod app;       // État de l'application
pub mod cache;     // Cache des séries agrégées
pub mod config;    // Configuration TOML
pub mod models;    // Structures de données
pub mod scheduler; // Tâches périodiques
pub mod ui;        // Interface utilisateur
pub mod worker;    // Commandes asynchrones et séquençage des requêtes
