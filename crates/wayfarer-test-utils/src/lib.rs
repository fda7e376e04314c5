//! Scripted collaborators and fixtures shared by the workspace tests.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;
use futures::future::BoxFuture;
use futures::stream::BoxStream;

use wayfarer_core::config::ModelConfig;
use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::state::WorkflowState;
use wayfarer_core::traits::*;
use wayfarer_core::trip::{DayPlan, Place, Rating, TripRequest, Verification};
use wayfarer_core::types::*;

/// Generation service answering from per-keyword queues.
///
/// A request matches the first rule whose keyword appears in any message.
/// Each rule pops its queue; the last answer of a queue repeats forever.
#[derive(Default)]
pub struct ScriptedLlm {
    rules: Mutex<Vec<(String, VecDeque<String>)>>,
    fallback: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, keyword: &str, answers: &[&str]) -> Self {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push((
                keyword.to_string(),
                answers.iter().map(|a| a.to_string()).collect(),
            ));
        }
        self
    }

    pub fn with_fallback(mut self, answer: &str) -> Self {
        self.fallback = answer.to_string();
        self
    }

    /// Every prompt received, system and user messages joined.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls_matching(&self, keyword: &str) -> usize {
        self.prompts().iter().filter(|p| p.contains(keyword)).count()
    }

    fn answer(&self, prompt: &str) -> String {
        let mut rules = match self.rules.lock() {
            Ok(rules) => rules,
            Err(_) => return self.fallback.clone(),
        };
        for (keyword, answers) in rules.iter_mut() {
            if prompt.contains(keyword.as_str()) {
                return if answers.len() > 1 {
                    answers.pop_front().unwrap_or_default()
                } else {
                    answers.front().cloned().unwrap_or_default()
                };
            }
        }
        self.fallback.clone()
    }
}

impl LlmClient for ScriptedLlm {
    fn chat_stream(
        &self,
        _config: &ModelConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<BoxStream<'_, Result<StreamDelta>>>> {
        Box::pin(async move {
            let prompt = messages
                .iter()
                .map(|m| m.content.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            let answer = self.answer(&prompt);
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(prompt);
            }

            // Split in two to exercise delta accumulation.
            let mid = answer
                .char_indices()
                .map(|(i, _)| i)
                .nth(answer.chars().count() / 2)
                .unwrap_or(0);
            let (head, tail) = answer.split_at(mid);
            let deltas = vec![
                Ok(StreamDelta::TextDelta(head.to_string())),
                Ok(StreamDelta::TextDelta(tail.to_string())),
                Ok(StreamDelta::Stop(StopReason::EndTurn)),
            ];
            Ok(Box::pin(futures::stream::iter(deltas)) as BoxStream<'_, _>)
        })
    }
}

/// Generation service that always fails.
pub struct FailingLlm;

impl LlmClient for FailingLlm {
    fn chat_stream(
        &self,
        _config: &ModelConfig,
        _messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<BoxStream<'_, Result<StreamDelta>>>> {
        Box::pin(async { Err(WayfarerError::LlmRequest("HTTP 503: unavailable".into())) })
    }
}

/// Place lookup answering from a keyword table; unknown queries find nothing.
#[derive(Default)]
pub struct MockPlaceLookup {
    entries: Vec<(String, Vec<PlaceCandidate>)>,
    fail: bool,
    queries: Mutex<Vec<String>>,
}

impl MockPlaceLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queries containing `keyword` get `candidates`.
    pub fn with(mut self, keyword: &str, candidates: Vec<PlaceCandidate>) -> Self {
        self.entries.push((keyword.to_string(), candidates));
        self
    }

    /// Every lookup errors.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl PlaceLookup for MockPlaceLookup {
    fn lookup(&self, query: &str) -> BoxFuture<'_, Result<Vec<PlaceCandidate>>> {
        let query = query.to_string();
        Box::pin(async move {
            if let Ok(mut queries) = self.queries.lock() {
                queries.push(query.clone());
            }
            if self.fail {
                return Err(WayfarerError::Lookup("mock lookup failure".into()));
            }
            Ok(self
                .entries
                .iter()
                .find(|(keyword, _)| query.contains(keyword.as_str()))
                .map(|(_, candidates)| candidates.clone())
                .unwrap_or_default())
        })
    }
}

/// Recorded flight search call.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightQuery {
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    pub return_date: Option<NaiveDate>,
}

/// Flight search answering from a queue; an exhausted queue finds nothing.
#[derive(Default)]
pub struct MockFlightSearch {
    responses: Mutex<VecDeque<Vec<FlightOffer>>>,
    calls: AtomicUsize,
    queries: Mutex<Vec<FlightQuery>>,
}

impl MockFlightSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn always_empty() -> Self {
        Self::default()
    }

    pub fn then(self, offers: Vec<FlightOffer>) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(offers);
        }
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<FlightQuery> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl FlightSearch for MockFlightSearch {
    fn search(
        &self,
        origin: &str,
        destination: &str,
        depart_date: NaiveDate,
        return_date: Option<NaiveDate>,
    ) -> BoxFuture<'_, Result<Vec<FlightOffer>>> {
        let query = FlightQuery {
            origin: origin.to_string(),
            destination: destination.to_string(),
            depart_date,
            return_date,
        };
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut queries) = self.queries.lock() {
                queries.push(query);
            }
            Ok(self
                .responses
                .lock()
                .ok()
                .and_then(|mut r| r.pop_front())
                .unwrap_or_default())
        })
    }
}

/// Price search with a fixed answer.
pub struct MockPriceSearch {
    answer: Option<String>,
    calls: AtomicUsize,
}

impl MockPriceSearch {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceSearch for MockPriceSearch {
    fn search_prices(&self, _query: &str) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.answer.clone().ok_or_else(|| WayfarerError::Search {
                provider: "mock".into(),
                message: "mock search failure".into(),
            })
        })
    }
}

/// Human port answering from a queue; an exhausted queue is an input failure.
#[derive(Default)]
pub struct ScriptedHuman {
    answers: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedHuman {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        self.answers.lock().map(|a| a.len()).unwrap_or(0)
    }
}

impl HumanPort for ScriptedHuman {
    fn prompt(&self, text: &str) -> BoxFuture<'_, Result<String>> {
        let text = text.to_string();
        Box::pin(async move {
            if let Ok(mut prompts) = self.prompts.lock() {
                prompts.push(text);
            }
            self.answers
                .lock()
                .ok()
                .and_then(|mut a| a.pop_front())
                .ok_or_else(|| WayfarerError::HumanInput("no scripted answer left".into()))
        })
    }
}

/// Renderer that records calls instead of writing files.
#[derive(Default)]
pub struct RecordingRenderer {
    renders: AtomicUsize,
    last: Mutex<Option<WorkflowState>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    pub fn last_state(&self) -> Option<WorkflowState> {
        self.last.lock().ok().and_then(|s| s.clone())
    }
}

impl ReportRenderer for RecordingRenderer {
    fn render(&self, state: &WorkflowState) -> BoxFuture<'_, Result<ArtifactPaths>> {
        let state = state.clone();
        Box::pin(async move {
            self.renders.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut last) = self.last.lock() {
                *last = Some(state);
            }
            Ok(vec![PathBuf::from("outputs/trip.html")])
        })
    }
}

// Fixtures

pub fn rome_request() -> TripRequest {
    TripRequest::new("Rome", 2).with_interests("history, food")
}

pub fn candidate(name: &str, address: &str, rating: f32) -> PlaceCandidate {
    PlaceCandidate {
        name: name.to_string(),
        address: address.to_string(),
        rating: Some(rating),
        id: format!("id-{}", name.to_lowercase().replace(' ', "-")),
    }
}

pub fn verified_place(name: &str) -> Place {
    Place {
        name: name.to_string(),
        address: format!("{}, Roma", name),
        rating: Rating::Score(4.5),
        verification: Verification::Verified {
            place_id: format!("id-{}", name.to_lowercase()),
        },
        cost: None,
    }
}

pub fn day(number: u32, focus: &str, places: Vec<Place>) -> DayPlan {
    DayPlan {
        day_number: number,
        focus: focus.to_string(),
        places,
    }
}

pub fn offer(title: &str, price_text: Option<&str>) -> FlightOffer {
    FlightOffer {
        title: title.to_string(),
        price_text: price_text.map(String::from),
        depart_time: Some("08:00".into()),
        url: None,
        source: "mock".into(),
    }
}

/// JSON itinerary as the planner prompt asks for it.
pub fn itinerary_json(days: &[(&str, &[&str])]) -> String {
    let days: Vec<serde_json::Value> = days
        .iter()
        .enumerate()
        .map(|(i, (focus, places))| {
            serde_json::json!({
                "day_number": i + 1,
                "focus": focus,
                "places": places.iter().map(|p| serde_json::json!({"name": p})).collect::<Vec<_>>(),
            })
        })
        .collect();
    serde_json::Value::Array(days).to_string()
}
