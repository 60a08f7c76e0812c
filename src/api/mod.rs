// ============================================================================
// Module : api
// ============================================================================
// Clients des flux externes : Binance (prix), récompenses, devices,
// annonces, taux de change. Tous en lecture seule.
// ============================================================================

pub mod binance; // Chandelles horaires et prix spot
pub mod client;  // FeedClient : client HTTP partagé
pub mod devices; // Nombre de devices par processeur
pub mod market;  // Annonces et taux de change
pub mod rewards; // Récompenses par processeur

// Re-export du client
pub use client::FeedClient;
