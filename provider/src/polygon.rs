use super::{DateRange, PriceBar, ProviderError, StockPage, Ticker};
use crate::limiter::{self, FixedWindowBucket};

use serde::Deserialize;
use std::sync::LazyLock;
use std::time::Duration;
use tokio::sync::Mutex;

const API_DOMAIN: &str = "https://api.polygon.io";

// Free-tier allowance.
const REQUESTS_PER_WINDOW: usize = 5;
const WINDOW: Duration = Duration::from_secs(60);

static REST_LIMITER: LazyLock<Mutex<FixedWindowBucket>> =
    LazyLock::new(|| Mutex::new(FixedWindowBucket::new(REQUESTS_PER_WINDOW, WINDOW)));

#[derive(Deserialize)]
struct BarsResponse {
    #[serde(default)]
    results: Vec<PriceBar>,
}

/// Daily OHLC bars for one ticker across the given date window.
///
/// Delivered in ascending time order (`sort=asc` is the API's guarantee);
/// nothing is re-sorted here. Tickers with no bars in the window come
/// back as an empty list, not an error.
pub async fn fetch_price_bars(
    api_key: &str,
    ticker: Ticker,
    range: DateRange,
) -> Result<Vec<PriceBar>, ProviderError> {
    let url = format!(
        "{API_DOMAIN}/v2/aggs/ticker/{ticker}/range/1/day/{}/{}?apiKey={api_key}&adjusted=true&sort=asc",
        range.from.format("%Y-%m-%d"),
        range.to.format("%Y-%m-%d"),
    );

    let response: BarsResponse = limiter::http_parse_with_limiter(&url, &REST_LIMITER).await?;
    Ok(response.results)
}

/// One page of the ticker directory: NYSE common stock, ascending by
/// symbol, 100 rows at a time.
///
/// `cursor` is the opaque `next_url` a previous page handed out, used
/// verbatim apart from re-appending the API key (Polygon strips it from
/// cursor URLs). `None` requests the first page.
pub async fn fetch_stock_page(
    api_key: &str,
    cursor: Option<&str>,
) -> Result<StockPage, ProviderError> {
    let url = match cursor {
        Some(next_url) => format!("{next_url}&apiKey={api_key}"),
        None => format!(
            "{API_DOMAIN}/v3/reference/tickers?apiKey={api_key}\
             &market=stocks&type=CS&exchange=XNYS&active=true&order=asc&limit=100&sort=ticker"
        ),
    };

    limiter::http_parse_with_limiter(&url, &REST_LIMITER).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_response_decodes_aggs_payload() {
        let json = r#"{
            "ticker": "AAPL",
            "queryCount": 2,
            "resultsCount": 2,
            "adjusted": true,
            "results": [
                {"v":70790813,"vw":74.6099,"o":74.06,"c":75.0875,"h":75.15,"l":73.7975,"t":1577941200000,"n":1},
                {"v":50616166,"vw":74.7026,"o":74.2875,"c":74.3575,"h":75.145,"l":74.125,"t":1578027600000,"n":1}
            ],
            "status": "OK",
            "request_id": "abc",
            "count": 2
        }"#;

        let response: BarsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.results.len(), 2);
        assert!(response.results[0].time < response.results[1].time);
    }

    #[test]
    fn bars_response_tolerates_missing_results() {
        // Polygon omits `results` entirely for windows with no trading days.
        let response: BarsResponse =
            serde_json::from_str(r#"{"ticker":"A","status":"OK","resultsCount":0}"#).unwrap();
        assert!(response.results.is_empty());
    }
}
