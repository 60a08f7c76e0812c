// ============================================================================
// FeedClient : client HTTP partagé par tous les flux
// ============================================================================
// Un seul reqwest::Client (pool de connexions réutilisé) et les URLs de la
// configuration. Chaque flux ajoute ses méthodes dans son propre fichier
// (binance.rs, rewards.rs, devices.rs...) via un bloc `impl FeedClient`.
// ============================================================================

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::FeedsConfig;

/// Client des flux externes (lecture seule)
#[derive(Debug, Clone)]
pub struct FeedClient {
    pub(crate) http: reqwest::Client,
    pub(crate) feeds: FeedsConfig,
}

impl FeedClient {
    /// Crée le client HTTP avec le timeout configuré
    pub fn new(feeds: FeedsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("iodash/", env!("CARGO_PKG_VERSION")))
            .timeout(feeds.timeout())
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self { http, feeds })
    }

    /// GET + vérification du statut HTTP
    pub(crate) async fn get(&self, feed: &'static str, url: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        debug!(feed, url, "Sending HTTP request");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("Échec de la requête HTTP vers le flux {feed}"))?;

        let status = response.status();
        debug!(feed, status = %status, "Received HTTP response");

        if !status.is_success() {
            error!(feed, status = %status, "Feed returned error status");
            anyhow::bail!("Le flux {} a retourné une erreur : HTTP {}", feed, status);
        }

        Ok(response)
    }

    /// GET puis désérialisation JSON
    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        feed: &'static str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        self.get(feed, url, query)
            .await?
            .json::<T>()
            .await
            .with_context(|| format!("Échec du parsing JSON du flux {feed}"))
    }

    /// GET puis lecture du corps texte
    pub(crate) async fn get_text(&self, feed: &'static str, url: &str) -> Result<String> {
        self.get(feed, url, &[])
            .await?
            .text()
            .await
            .with_context(|| format!("Échec de la lecture du flux {feed}"))
    }

    /// Base de l'API Binance, sans '/' final
    pub(crate) fn binance_base(&self) -> &str {
        self.feeds.binance_url.trim_end_matches('/')
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Configuration pointant tous les flux vers le serveur de test
    pub(crate) fn test_client(base: &str) -> FeedClient {
        FeedClient::new(FeedsConfig {
            binance_url: base.to_string(),
            rewards_url: format!("{base}/rewards"),
            devices_url: format!("{base}/devices"),
            announcements_url: format!("{base}/announcements"),
            exchange_rate_url: format!("{base}/rates"),
            ..FeedsConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let mock = server.mock("GET", "/rewards").with_status(503).create_async().await;

        let client = test_client(&server.url());
        let err = client.get_text("rewards", &client.feeds.rewards_url).await.unwrap_err();

        assert!(err.to_string().contains("503"));
        mock.assert_async().await;
    }

    #[test]
    fn test_binance_base_trims_slash() {
        let client = test_client("http://localhost:1234/");
        assert_eq!(client.binance_base(), "http://localhost:1234");
    }
}
