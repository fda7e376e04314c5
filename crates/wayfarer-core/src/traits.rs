use chrono::NaiveDate;
use futures::future::BoxFuture;
use futures::stream::BoxStream;

use crate::config::ModelConfig;
use crate::error::Result;
use crate::state::WorkflowState;
use crate::types::*;

/// Generation service for streaming chat completion.
pub trait LlmClient: Send + Sync + 'static {
    /// Send a chat request and receive a stream of deltas.
    fn chat_stream(
        &self,
        config: &ModelConfig,
        messages: Vec<ChatMessage>,
    ) -> BoxFuture<'_, Result<BoxStream<'_, Result<StreamDelta>>>>;
}

/// Place lookup: text query to an ordered list of matches.
///
/// An empty list is a normal "not found" outcome, not an error.
pub trait PlaceLookup: Send + Sync + 'static {
    fn lookup(&self, query: &str) -> BoxFuture<'_, Result<Vec<PlaceCandidate>>>;
}

/// Flight search for one leg (or a round trip when `return_date` is set).
pub trait FlightSearch: Send + Sync + 'static {
    fn search(
        &self,
        origin: &str,
        destination: &str,
        depart_date: NaiveDate,
        return_date: Option<NaiveDate>,
    ) -> BoxFuture<'_, Result<Vec<FlightOffer>>>;
}

/// Free-text price research (entry tickets, free activities).
pub trait PriceSearch: Send + Sync + 'static {
    fn search_prices(&self, query: &str) -> BoxFuture<'_, Result<String>>;
}

/// Report renderer, invoked once from the publishing stage.
pub trait ReportRenderer: Send + Sync + 'static {
    fn render(&self, state: &WorkflowState) -> BoxFuture<'_, Result<ArtifactPaths>>;
}

/// Human interaction port: a blocking question/answer exchange.
pub trait HumanPort: Send + Sync + 'static {
    fn prompt(&self, text: &str) -> BoxFuture<'_, Result<String>>;
}
