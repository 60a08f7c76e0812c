// ============================================================================
// Flux Binance : chandelles horaires et prix spot
// ============================================================================
// GET /api/v3/klines?symbol=IOUSDT&interval=1h&startTime=..&endTime=..&limit=1000
// Chaque chandelle est un tableau hétérogène :
//   [open_time, "open", "high", "low", "close", "volume", close_time, ...]
// On garde le prix de clôture ([4], chaîne décimale) indexé par open_time.
//
// GET /api/v3/ticker/price?symbol=IOUSDT -> { "symbol": "...", "price": "2.1234" }
// ============================================================================

use std::str::FromStr;

use anyhow::Result;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::api::FeedClient;
use crate::models::{HourKey, PriceSeries, TimeRange};

/// Nombre maximum de chandelles par requête (limite Binance)
const KLINES_LIMIT: u32 = 1000;

#[derive(Debug, Deserialize)]
struct TickerPrice {
    /// Binance envoie le prix sous forme de chaîne décimale
    #[serde(with = "rust_decimal::serde::str")]
    price: Decimal,
}

impl FeedClient {
    /// Récupère les prix horaires de clôture sur la période
    #[instrument(skip(self), fields(symbol = %self.feeds.symbol))]
    pub async fn fetch_price_series(&self, range: TimeRange) -> Result<PriceSeries> {
        let now = Utc::now();
        let mut query = vec![
            ("symbol", self.feeds.symbol.clone()),
            ("interval", "1h".to_string()),
            ("endTime", now.timestamp_millis().to_string()),
            ("limit", KLINES_LIMIT.to_string()),
        ];
        if let Some(since) = range.since(now) {
            query.push(("startTime", since.timestamp_millis().to_string()));
        }

        let url = format!("{}/api/v3/klines", self.binance_base());
        let rows: Vec<Vec<Value>> = self.get_json("klines", &url, &query).await?;
        let series = parse_klines(&rows);

        info!(candles = rows.len(), prices = series.len(), "Fetched price series");
        Ok(series)
    }

    /// Récupère le prix spot courant
    #[instrument(skip(self), fields(symbol = %self.feeds.symbol))]
    pub async fn fetch_spot_price(&self) -> Result<Decimal> {
        let url = format!("{}/api/v3/ticker/price", self.binance_base());
        let ticker: TickerPrice = self
            .get_json("ticker", &url, &[("symbol", self.feeds.symbol.clone())])
            .await?;
        Ok(ticker.price)
    }
}

/// Convertit les chandelles en série de prix ; les lignes invalides sont ignorées
fn parse_klines(rows: &[Vec<Value>]) -> PriceSeries {
    let mut series = PriceSeries::new();
    let mut skipped = 0usize;
    let mut non_positive = 0usize;

    for row in rows {
        match parse_kline_row(row) {
            Some((hour, close)) if close > Decimal::ZERO => series.insert(hour, close),
            Some((hour, close)) => {
                warn!(%hour, %close, "Skipping kline with non-positive close");
                non_positive += 1;
            }
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        warn!(skipped, total = rows.len(), "Skipped malformed kline rows");
    }
    if non_positive > 0 {
        warn!(non_positive, total = rows.len(), "Skipped klines with non-positive close");
    }
    series
}

fn parse_kline_row(row: &[Value]) -> Option<(HourKey, Decimal)> {
    let open_time = row.first()?.as_i64()?;
    let close = match row.get(4)? {
        Value::String(s) => Decimal::from_str(s).ok()?,
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok()?,
        _ => return None,
    };
    let hour = HourKey::from_millis(open_time).ok()?;
    Some((hour, close))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::client::tests::test_client;
    use mockito::Matcher;
    use rust_decimal_macros::dec;

    const KLINES: &str = r#"[
        [1717398000000, "2.0000", "2.1000", "1.9000", "2.0500", "1000.0", 1717401599999, "0", 10, "0", "0", "0"],
        [1717401600000, "2.0500", "2.2000", "2.0000", "2.1500", "900.0", 1717405199999, "0", 8, "0", "0", "0"],
        ["bad row"],
        [1717401600000, "2.0500", "2.2000", "2.0000", "2.2000", "900.0", 1717405199999, "0", 8, "0", "0", "0"]
    ]"#;

    #[tokio::test]
    async fn test_fetch_price_series() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/v3/klines")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("symbol".into(), "IOUSDT".into()),
                Matcher::UrlEncoded("interval".into(), "1h".into()),
                Matcher::UrlEncoded("limit".into(), "1000".into()),
                Matcher::Regex("startTime=\\d+".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(KLINES)
            .create_async()
            .await;

        let client = test_client(&server.url());
        let series = client.fetch_price_series(TimeRange::SevenDays).await.unwrap();

        mock.assert_async().await;
        assert_eq!(series.len(), 2);
        assert_eq!(series.get(&HourKey::from_millis(1_717_398_000_000).unwrap()), Some(dec!(2.05)));
        // Même open_time : la dernière chandelle l'emporte
        assert_eq!(series.get(&HourKey::from_millis(1_717_401_600_000).unwrap()), Some(dec!(2.20)));
    }

    #[tokio::test]
    async fn test_fetch_spot_price() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/v3/ticker/price")
            .match_query(Matcher::UrlEncoded("symbol".into(), "IOUSDT".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"symbol":"IOUSDT","price":"2.12340000"}"#)
            .create_async()
            .await;

        let client = test_client(&server.url());
        assert_eq!(client.fetch_spot_price().await.unwrap(), dec!(2.1234));
    }

    #[test]
    fn test_non_positive_close_skipped() {
        let rows: Vec<Vec<Value>> = serde_json::from_str(
            r#"[
                [1717398000000, "1", "1", "1", "0.0000"],
                [1717401600000, "1", "1", "1", "-1.5"],
                [1717405200000, "1", "1", "1", "2.5"]
            ]"#,
        )
        .unwrap();

        let series = parse_klines(&rows);

        assert_eq!(series.len(), 1);
        assert_eq!(series.get(&HourKey::from_millis(1_717_405_200_000).unwrap()), Some(dec!(2.5)));
    }

    #[test]
    fn test_ticker_price_parsed_from_string() {
        let ticker: TickerPrice = serde_json::from_str(r#"{"symbol":"IOUSDT","price":"2.5"}"#).unwrap();
        assert_eq!(ticker.price, dec!(2.5));
    }

    #[test]
    fn test_numeric_close_accepted() {
        let row: Vec<Value> = serde_json::from_str(r#"[1717398000000, 1, 1, 1, 1.5]"#).unwrap();
        assert_eq!(parse_kline_row(&row).map(|(_, close)| close), Some(dec!(1.5)));
    }
}
