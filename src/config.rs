// ============================================================================
// Module : config
// ============================================================================
// Configuration du dashboard, lue depuis un fichier TOML optionnel
//
// Emplacement :
// - variable IODASH_CONFIG si définie
// - sinon <config dir>/iodash/config.toml (~/.config/iodash sur Linux)
// Fichier absent → valeurs par défaut. Chaque section et chaque champ a une
// valeur par défaut : un fichier partiel suffit.
// ============================================================================

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::models::ChartKind;

/// Configuration complète
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub feeds: FeedsConfig,

    #[serde(default)]
    pub refresh: RefreshConfig,

    #[serde(default)]
    pub display: DisplayConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// URLs des flux externes
#[derive(Debug, Clone, Deserialize)]
pub struct FeedsConfig {
    /// Base de l'API Binance (klines et ticker)
    #[serde(default = "default_binance_url")]
    pub binance_url: String,

    /// Paire de trading du token de récompense
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// Historique des récompenses par processeur
    #[serde(default = "default_rewards_url")]
    pub rewards_url: String,

    /// Historique du nombre de devices
    #[serde(default = "default_devices_url")]
    pub devices_url: String,

    /// Texte des annonces
    #[serde(default = "default_announcements_url")]
    pub announcements_url: String,

    /// Taux de change USD
    #[serde(default = "default_exchange_rate_url")]
    pub exchange_rate_url: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_binance_url() -> String {
    "https://api.binance.com".to_string()
}

fn default_symbol() -> String {
    "IOUSDT".to_string()
}

fn default_rewards_url() -> String {
    "https://apiweb.2089426079.workers.dev/".to_string()
}

fn default_devices_url() -> String {
    "https://gpucount.2089426079.workers.dev/".to_string()
}

fn default_announcements_url() -> String {
    "https://edit.2089426079.workers.dev/".to_string()
}

fn default_exchange_rate_url() -> String {
    "https://api.exchangerate-api.com/v4/latest/USD".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            binance_url: default_binance_url(),
            symbol: default_symbol(),
            rewards_url: default_rewards_url(),
            devices_url: default_devices_url(),
            announcements_url: default_announcements_url(),
            exchange_rate_url: default_exchange_rate_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl FeedsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Périodes de rafraîchissement et fenêtres du cache
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    #[serde(default = "default_data_refresh_secs")]
    pub data_refresh_secs: u64,

    #[serde(default = "default_price_refresh_secs")]
    pub price_refresh_secs: u64,

    /// Fenêtre de fraîcheur du cache
    #[serde(default = "default_cache_fresh_secs")]
    pub cache_fresh_secs: u64,

    /// Âge d'éviction (et période de la purge)
    #[serde(default = "default_cache_evict_secs")]
    pub cache_evict_secs: u64,
}

fn default_data_refresh_secs() -> u64 {
    5 * 60
}

fn default_price_refresh_secs() -> u64 {
    60
}

fn default_cache_fresh_secs() -> u64 {
    5 * 60
}

fn default_cache_evict_secs() -> u64 {
    30 * 60
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            data_refresh_secs: default_data_refresh_secs(),
            price_refresh_secs: default_price_refresh_secs(),
            cache_fresh_secs: default_cache_fresh_secs(),
            cache_evict_secs: default_cache_evict_secs(),
        }
    }
}

impl RefreshConfig {
    pub fn data_refresh(&self) -> Duration {
        Duration::from_secs(self.data_refresh_secs)
    }

    pub fn price_refresh(&self) -> Duration {
        Duration::from_secs(self.price_refresh_secs)
    }

    pub fn cache_fresh(&self) -> Duration {
        Duration::from_secs(self.cache_fresh_secs)
    }

    pub fn cache_evict(&self) -> Duration {
        Duration::from_secs(self.cache_evict_secs)
    }

    /// Les périodes des tâches périodiques doivent être non nulles
    pub fn validate(&self) -> Result<()> {
        let periods = [
            ("data_refresh_secs", self.data_refresh_secs),
            ("price_refresh_secs", self.price_refresh_secs),
            ("cache_evict_secs", self.cache_evict_secs),
        ];
        for (name, secs) in periods {
            if secs == 0 {
                anyhow::bail!("refresh.{} doit être supérieur à 0", name);
            }
        }
        Ok(())
    }
}

/// Graphique et processeurs affichés au démarrage
#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_processors")]
    pub processors: Vec<String>,

    /// "revenue" ou "devices"
    #[serde(default = "default_chart")]
    pub chart: String,
}

fn default_processors() -> Vec<String> {
    vec!["a100".to_string(), "m2 pro".to_string(), "rtx 4090".to_string()]
}

fn default_chart() -> String {
    "revenue".to_string()
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            processors: default_processors(),
            chart: default_chart(),
        }
    }
}

impl DisplayConfig {
    /// Graphique initial ; une valeur inconnue retombe sur les récompenses
    pub fn chart_kind(&self) -> ChartKind {
        match self.chart.trim().to_lowercase().as_str() {
            "devices" | "device" | "count" | "quantity" => ChartKind::DeviceCount,
            _ => ChartKind::Revenue,
        }
    }
}

/// Répertoire des fichiers de logs
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub directory: PathBuf,
}

fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|p| p.join("iodash").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_log_dir(),
        }
    }
}

impl Config {
    /// Charge la configuration depuis l'emplacement par défaut
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Charge un fichier TOML précis
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Échec de la lecture de {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Configuration invalide dans {}", path.display()))?;
        info!(path = %path.display(), "Configuration chargée");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Échec du parsing TOML")?;
        config.refresh.validate()?;
        Ok(config)
    }

    /// IODASH_CONFIG, sinon <config dir>/iodash/config.toml
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("IODASH_CONFIG") {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|dir| dir.join("iodash").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.feeds.symbol, "IOUSDT");
        assert_eq!(config.refresh.data_refresh(), Duration::from_secs(300));
        assert_eq!(config.refresh.cache_fresh(), Duration::from_secs(300));
        assert_eq!(config.refresh.cache_evict(), Duration::from_secs(1800));
        assert_eq!(config.display.processors, vec!["a100", "m2 pro", "rtx 4090"]);
        assert_eq!(config.display.chart_kind(), ChartKind::Revenue);
    }

    #[test]
    fn test_partial_file() {
        let config = Config::from_toml(
            r#"
            [feeds]
            binance_url = "http://localhost:9000"

            [display]
            chart = "devices"
            "#,
        )
        .unwrap();

        assert_eq!(config.feeds.binance_url, "http://localhost:9000");
        assert_eq!(config.feeds.symbol, "IOUSDT");
        assert_eq!(config.refresh.price_refresh_secs, 60);
        assert_eq!(config.display.chart_kind(), ChartKind::DeviceCount);
    }

    #[test]
    fn test_zero_periods_rejected() {
        for key in ["data_refresh_secs", "price_refresh_secs", "cache_evict_secs"] {
            let err = Config::from_toml(&format!("[refresh]\n{key} = 0")).unwrap_err();
            assert!(err.to_string().contains(key), "{err}");
        }

        // Une fraîcheur nulle désactive seulement le cache
        let config = Config::from_toml("[refresh]\ncache_fresh_secs = 0").unwrap();
        assert_eq!(config.refresh.cache_fresh(), Duration::ZERO);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::from_toml("[refresh]\ndata_refresh_secs = \"vite\"").is_err());
    }
}
