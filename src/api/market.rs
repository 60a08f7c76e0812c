// ============================================================================
// Flux annexes : annonces et taux de change
// ============================================================================
// - Annonces : texte brut, références numériques + sections numérotées
// - Taux de change : { "rates": { "CNY": 7.24, ... } }
// ============================================================================

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument};

use crate::api::FeedClient;
use crate::models::announcement::parse_announcements;

#[derive(Debug, Deserialize)]
struct ExchangeRates {
    rates: Rates,
}

#[derive(Debug, Deserialize)]
struct Rates {
    #[serde(rename = "CNY")]
    cny: Decimal,
}

impl FeedClient {
    /// Récupère et découpe les annonces
    #[instrument(skip(self))]
    pub async fn fetch_announcements(&self) -> Result<Vec<String>> {
        let raw = self.get_text("announcements", &self.feeds.announcements_url).await?;
        let announcements = parse_announcements(&raw);
        info!(count = announcements.len(), "Fetched announcements");
        Ok(announcements)
    }

    /// Taux de change USD → CNY
    #[instrument(skip(self))]
    pub async fn fetch_cny_rate(&self) -> Result<Decimal> {
        let rates: ExchangeRates = self.get_json("exchange", &self.feeds.exchange_rate_url, &[]).await?;
        Ok(rates.rates.cny)
    }
}

#[cfg(test)]
mod tests {
    use crate::api::client::tests::test_client;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fetch_announcements() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/announcements")
            .with_status(200)
            .with_body("1.&#20844;&#21578; 2.&#72;&#105;")
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert_eq!(client.fetch_announcements().await.unwrap(), vec!["公告", "Hi"]);
    }

    #[tokio::test]
    async fn test_fetch_cny_rate() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rates")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"base": "USD", "rates": {"EUR": 0.92, "CNY": 7.24}}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert_eq!(client.fetch_cny_rate().await.unwrap(), dec!(7.24));
    }
}
