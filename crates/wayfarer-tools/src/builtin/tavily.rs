use std::sync::OnceLock;

use chrono::NaiveDate;
use futures::future::BoxFuture;
use regex::Regex;
use serde_json::json;
use tracing::debug;

use wayfarer_core::config::SearchConfig;
use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::traits::{FlightSearch, PriceSearch};
use wayfarer_core::types::FlightOffer;

const TAVILY_URL: &str = "https://api.tavily.com/search";

/// Tavily web search, used both for price research and for flight offers.
pub struct TavilySearch {
    api_key: String,
    max_results: usize,
    http: reqwest::Client,
}

#[derive(Debug, Clone, PartialEq)]
struct SearchHit {
    title: String,
    content: String,
    url: String,
}

impl TavilySearch {
    pub fn new(config: &SearchConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            max_results: config.max_results.max(1),
            http: reqwest::Client::new(),
        }
    }

    async fn run_query(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>> {
        debug!(query = %query, max_results, "Tavily search");

        let resp = self
            .http
            .post(TAVILY_URL)
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "max_results": max_results,
            }))
            .send()
            .await
            .map_err(|e| search_error(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(search_error(format!("HTTP {}", resp.status())));
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| search_error(e.to_string()))?;
        Ok(parse_hits(&body))
    }
}

fn search_error(message: String) -> WayfarerError {
    WayfarerError::Search {
        provider: "tavily".into(),
        message,
    }
}

fn parse_hits(body: &serde_json::Value) -> Vec<SearchHit> {
    body["results"]
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|r| SearchHit {
                    title: r["title"].as_str().unwrap_or("").to_string(),
                    content: r["content"].as_str().unwrap_or("").to_string(),
                    url: r["url"].as_str().unwrap_or("").to_string(),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn price_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:[€$£]|eur|usd|gbp)\s?\d[\d.,]*|\d[\d.,]*\s?(?:[€$£]|eur\b|euro\b|usd\b|gbp\b)")
            .expect("valid price regex")
    })
}

fn time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\b(?:[01]?\d|2[0-3]):[0-5]\d\b").expect("valid time regex"))
}

/// Map search hits to offers, keeping the first price and time mentioned.
fn hits_to_offers(hits: Vec<SearchHit>) -> Vec<FlightOffer> {
    hits.into_iter()
        .filter(|h| !h.title.trim().is_empty())
        .map(|h| {
            let text = format!("{} {}", h.title, h.content);
            FlightOffer {
                price_text: price_regex().find(&text).map(|m| m.as_str().trim().to_string()),
                depart_time: time_regex().find(&text).map(|m| m.as_str().to_string()),
                url: (!h.url.is_empty()).then_some(h.url),
                title: h.title,
                source: "tavily".into(),
            }
        })
        .collect()
}

fn flight_query(origin: &str, destination: &str, depart: NaiveDate, ret: Option<NaiveDate>) -> String {
    match ret {
        Some(ret) => format!(
            "round trip flights from {} to {} departing {} returning {} price",
            origin, destination, depart, ret
        ),
        None => format!(
            "one way flights from {} to {} on {} price",
            origin, destination, depart
        ),
    }
}

impl PriceSearch for TavilySearch {
    fn search_prices(&self, query: &str) -> BoxFuture<'_, Result<String>> {
        let query = format!("ticket prices and free things to do {}", query);
        Box::pin(async move {
            let hits = self.run_query(&query, self.max_results.min(2)).await?;
            Ok(hits
                .iter()
                .filter(|h| !h.content.trim().is_empty())
                .map(|h| format!("- {}", h.content.trim()))
                .collect::<Vec<_>>()
                .join("\n"))
        })
    }
}

impl FlightSearch for TavilySearch {
    fn search(
        &self,
        origin: &str,
        destination: &str,
        depart_date: NaiveDate,
        return_date: Option<NaiveDate>,
    ) -> BoxFuture<'_, Result<Vec<FlightOffer>>> {
        let query = flight_query(origin, destination, depart_date, return_date);
        Box::pin(async move {
            let hits = self.run_query(&query, self.max_results).await?;
            Ok(hits_to_offers(hits))
        })
    }
}
