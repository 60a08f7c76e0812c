// ============================================================================
// Flux du nombre de devices
// ============================================================================
// GET <devices_url>
// { "data": [ { "file_name": "2024-6-3-7", "processors": { "A100 40G": 120 } } ] }
// ============================================================================

use std::collections::BTreeMap;

use anyhow::Result;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::api::FeedClient;
use crate::models::{DeviceSnapshot, HourKey};

#[derive(Debug, Deserialize)]
struct DeviceFeed {
    data: Vec<RawSnapshot>,
}

#[derive(Debug, Deserialize)]
struct RawSnapshot {
    file_name: String,
    #[serde(default)]
    processors: BTreeMap<String, Decimal>,
}

impl FeedClient {
    /// Récupère tous les relevés ; un nom de fichier invalide écarte le relevé
    #[instrument(skip(self))]
    pub async fn fetch_device_snapshots(&self) -> Result<Vec<DeviceSnapshot>> {
        let feed: DeviceFeed = self.get_json("devices", &self.feeds.devices_url, &[]).await?;
        let total = feed.data.len();

        let snapshots: Vec<DeviceSnapshot> = feed
            .data
            .into_iter()
            .filter_map(|raw| match HourKey::parse_file_name(&raw.file_name) {
                Ok(hour) => Some(DeviceSnapshot {
                    hour,
                    counts: raw.processors,
                }),
                Err(e) => {
                    warn!(error = %e, "Skipping device snapshot");
                    None
                }
            })
            .collect();

        info!(snapshots = snapshots.len(), total, "Fetched device snapshots");
        Ok(snapshots)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::test_client;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fetch_device_snapshots() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/devices")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"data": [
                    {"file_name": "2024-6-3-7", "processors": {"A100 40G": 120, "M3 Max": 4}},
                    {"file_name": "2024-6-3", "processors": {"A100 40G": 1}},
                    {"file_name": "2024-06-03-08", "processors": {}}
                ]}"#,
            )
            .create_async()
            .await;

        let client = test_client(&server.url());
        let snapshots = client.fetch_device_snapshots().await.unwrap();

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].hour.to_string(), "2024-06-03T07:00:00Z");
        assert_eq!(snapshots[0].counts.get("A100 40G"), Some(&dec!(120)));
        assert!(snapshots[1].counts.is_empty());
    }
}
