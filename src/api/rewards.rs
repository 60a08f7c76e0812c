// ============================================================================
// Flux des récompenses par processeur
// ============================================================================
// GET <rewards_url>
// {
//   "processorData": [
//     { "datetime": "2024-06-03T07:00:00.000Z",
//       "processors": [ { "name": "A100 40G", "reward": 1.25 }, ... ] }
//   ]
// }
// ============================================================================

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::api::FeedClient;
use crate::models::{HourKey, ProcessorReward, RawTimestamp, RewardEvent};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewardFeed {
    processor_data: Vec<RawRewardEvent>,
}

#[derive(Debug, Deserialize)]
struct RawRewardEvent {
    datetime: RawTimestamp,
    #[serde(default)]
    processors: Vec<RawProcessorReward>,
}

#[derive(Debug, Deserialize)]
struct RawProcessorReward {
    name: String,
    #[serde(default)]
    reward: Decimal,
}

impl FeedClient {
    /// Récupère tous les événements de récompense, dans l'ordre du flux
    #[instrument(skip(self))]
    pub async fn fetch_reward_events(&self) -> Result<Vec<RewardEvent>> {
        let feed: RewardFeed = self.get_json("rewards", &self.feeds.rewards_url, &[]).await?;
        let total = feed.processor_data.len();
        let events = convert_events(feed.processor_data);

        info!(events = events.len(), total, "Fetched reward events");
        Ok(events)
    }
}

/// Convertit les événements bruts ; un horodatage illisible écarte l'événement
fn convert_events(raw: Vec<RawRewardEvent>) -> Vec<RewardEvent> {
    raw.into_iter()
        .filter_map(|event| match HourKey::from_raw(&event.datetime) {
            Ok(hour) => Some(RewardEvent {
                hour,
                rewards: event
                    .processors
                    .into_iter()
                    .map(|p| ProcessorReward::new(p.name, p.reward))
                    .collect(),
            }),
            Err(e) => {
                warn!(error = %e, "Skipping reward event with unreadable datetime");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::test_client;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fetch_reward_events() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rewards")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"processorData": [
                    {"datetime": "2024-06-03T07:00:00.000Z",
                     "processors": [{"name": "A100 40G", "reward": 1.25}, {"name": "M3", "reward": "0.5"}]},
                    {"datetime": "pas une date", "processors": []},
                    {"datetime": 1717401600000, "processors": [{"name": "RTX 4090"}]}
                ]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let events = client.fetch_reward_events().await.unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].hour.to_string(), "2024-06-03T07:00:00Z");
        assert_eq!(events[0].rewards[0], ProcessorReward::new("A100 40G", dec!(1.25)));
        assert_eq!(events[0].rewards[1].reward, dec!(0.5));
        assert_eq!(events[1].hour.to_string(), "2024-06-03T08:00:00Z");
        assert_eq!(events[1].rewards[0].reward, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_malformed_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rewards")
            .with_status(200)
            .with_body(r#"{"unexpected": true}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert!(client.fetch_reward_events().await.is_err());
    }
}
