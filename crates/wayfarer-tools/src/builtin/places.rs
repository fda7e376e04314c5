use futures::future::BoxFuture;
use serde::Deserialize;
use tracing::{debug, warn};

use wayfarer_core::config::PlacesConfig;
use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::traits::PlaceLookup;
use wayfarer_core::types::PlaceCandidate;

const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";

/// Google Places text search.
pub struct GooglePlacesLookup {
    api_key: String,
    max_results: usize,
    http: reqwest::Client,
}

impl GooglePlacesLookup {
    pub fn new(config: &PlacesConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            max_results: config.max_results.max(1),
            http: reqwest::Client::new(),
        }
    }
}

#[derive(Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<TextSearchResult>,
}

#[derive(Deserialize)]
struct TextSearchResult {
    #[serde(default)]
    name: String,
    #[serde(default)]
    formatted_address: String,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    place_id: String,
}

/// Turn a text search body into candidates. `ZERO_RESULTS` is an empty list;
/// any other non-OK status is a lookup failure.
fn parse_response(body: &str, max_results: usize) -> Result<Vec<PlaceCandidate>> {
    let resp: TextSearchResponse =
        serde_json::from_str(body).map_err(|e| WayfarerError::Lookup(e.to_string()))?;

    match resp.status.as_str() {
        "OK" | "" => {}
        "ZERO_RESULTS" => return Ok(vec![]),
        status => {
            return Err(WayfarerError::Lookup(format!(
                "{}: {}",
                status,
                resp.error_message.unwrap_or_default()
            )))
        }
    }

    Ok(resp
        .results
        .into_iter()
        .filter(|r| !r.name.trim().is_empty())
        .take(max_results)
        .map(|r| PlaceCandidate {
            name: r.name,
            address: r.formatted_address,
            rating: r.rating,
            id: r.place_id,
        })
        .collect())
}

impl PlaceLookup for GooglePlacesLookup {
    fn lookup(&self, query: &str) -> BoxFuture<'_, Result<Vec<PlaceCandidate>>> {
        let query = query.to_string();
        Box::pin(async move {
            debug!(query = %query, "Place text search");

            let resp = self
                .http
                .get(TEXT_SEARCH_URL)
                .query(&[("query", query.as_str()), ("key", self.api_key.as_str())])
                .send()
                .await
                .map_err(|e| WayfarerError::Lookup(e.to_string()))?;

            if !resp.status().is_success() {
                return Err(WayfarerError::Lookup(format!("HTTP {}", resp.status())));
            }

            let body = resp
                .text()
                .await
                .map_err(|e| WayfarerError::Lookup(e.to_string()))?;

            let candidates = parse_response(&body, self.max_results)?;
            if candidates.is_empty() {
                warn!(query = %query, "No place found");
            }
            Ok(candidates)
        })
    }
}
