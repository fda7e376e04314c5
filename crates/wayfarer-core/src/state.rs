use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WayfarerError};
use crate::trip::{DayPlan, FlightOption, TravelStyle, TripRequest};

/// Upper bound on rejection-driven re-plans before the run fails.
pub const MAX_RETRIES: u32 = 3;

/// The aggregate threaded through every node of a run.
///
/// Created with defaults, mutated only by merging a [`StateUpdate`] after
/// each node, frozen once a terminal node has run.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WorkflowState {
    /// Set once by the init node.
    pub request: Option<TripRequest>,
    pub travel_style: Option<TravelStyle>,
    pub itinerary: Vec<DayPlan>,
    pub flight_options: Vec<FlightOption>,
    pub flight_summary: Option<String>,
    pub flight_confidence_score: f64,
    pub critic_feedback: Option<String>,
    pub budget_context: Option<String>,
    pub confidence_score: f64,
    pub is_approved: bool,
    pub retry_count: u32,
    pub banned_places: BTreeSet<String>,
    pub report_paths: Vec<PathBuf>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The trip request, or an error when the init node has not run yet.
    pub fn trip(&self) -> Result<&TripRequest> {
        self.request.as_ref().ok_or(WayfarerError::MissingTripRequest)
    }

    pub fn retries_exhausted(&self) -> bool {
        self.retry_count >= MAX_RETRIES
    }

    pub fn total_places(&self) -> usize {
        self.itinerary.iter().map(|d| d.places.len()).sum()
    }
}

/// The subset of [`WorkflowState`] a node changed.
///
/// `None` leaves the field untouched. Nullable fields use a nested option
/// so a node can explicitly clear them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub request: Option<TripRequest>,
    pub travel_style: Option<TravelStyle>,
    pub itinerary: Option<Vec<DayPlan>>,
    pub flight_options: Option<Vec<FlightOption>>,
    pub flight_summary: Option<Option<String>>,
    pub flight_confidence_score: Option<f64>,
    pub critic_feedback: Option<Option<String>>,
    pub budget_context: Option<Option<String>>,
    pub confidence_score: Option<f64>,
    pub is_approved: Option<bool>,
    /// Must equal the previous count plus one.
    pub retry_count: Option<u32>,
    /// Merged by set union.
    pub banned_places: Option<BTreeSet<String>>,
    pub report_paths: Option<Vec<PathBuf>>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Names of the fields this update touches, for logging.
    pub fn touched_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.request.is_some() {
            fields.push("request");
        }
        if self.travel_style.is_some() {
            fields.push("travel_style");
        }
        if self.itinerary.is_some() {
            fields.push("itinerary");
        }
        if self.flight_options.is_some() {
            fields.push("flight_options");
        }
        if self.flight_summary.is_some() {
            fields.push("flight_summary");
        }
        if self.flight_confidence_score.is_some() {
            fields.push("flight_confidence_score");
        }
        if self.critic_feedback.is_some() {
            fields.push("critic_feedback");
        }
        if self.budget_context.is_some() {
            fields.push("budget_context");
        }
        if self.confidence_score.is_some() {
            fields.push("confidence_score");
        }
        if self.is_approved.is_some() {
            fields.push("is_approved");
        }
        if self.retry_count.is_some() {
            fields.push("retry_count");
        }
        if self.banned_places.is_some() {
            fields.push("banned_places");
        }
        if self.report_paths.is_some() {
            fields.push("report_paths");
        }
        fields
    }

    pub fn with_request(mut self, request: TripRequest) -> Self {
        self.request = Some(request);
        self
    }

    pub fn with_travel_style(mut self, style: TravelStyle) -> Self {
        self.travel_style = Some(style);
        self
    }

    pub fn with_itinerary(mut self, itinerary: Vec<DayPlan>) -> Self {
        self.itinerary = Some(itinerary);
        self
    }

    pub fn with_flights(
        mut self,
        options: Vec<FlightOption>,
        summary: Option<String>,
        confidence: f64,
    ) -> Self {
        self.flight_options = Some(options);
        self.flight_summary = Some(summary);
        self.flight_confidence_score = Some(confidence);
        self
    }

    pub fn with_feedback(mut self, feedback: Option<String>) -> Self {
        self.critic_feedback = Some(feedback);
        self
    }

    pub fn with_budget_context(mut self, context: impl Into<String>) -> Self {
        self.budget_context = Some(Some(context.into()));
        self
    }

    pub fn with_confidence(mut self, score: f64) -> Self {
        self.confidence_score = Some(score);
        self
    }

    pub fn with_approval(mut self, approved: bool) -> Self {
        self.is_approved = Some(approved);
        self
    }

    pub fn with_retry_count(mut self, count: u32) -> Self {
        self.retry_count = Some(count);
        self
    }

    pub fn with_banned_places(mut self, names: BTreeSet<String>) -> Self {
        self.banned_places = Some(names);
        self
    }

    pub fn with_report_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.report_paths = Some(paths);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = WorkflowState::new();
        assert!(state.request.is_none());
        assert_eq!(state.retry_count, 0);
        assert!(!state.is_approved);
        assert!(state.itinerary.is_empty());
        assert!(matches!(state.trip(), Err(WayfarerError::MissingTripRequest)));
    }

    #[test]
    fn test_retries_exhausted_at_bound() {
        let mut state = WorkflowState::new();
        state.retry_count = MAX_RETRIES - 1;
        assert!(!state.retries_exhausted());
        state.retry_count = MAX_RETRIES;
        assert!(state.retries_exhausted());
    }

    #[test]
    fn test_touched_fields() {
        let update = StateUpdate::new()
            .with_approval(true)
            .with_feedback(None);
        assert_eq!(update.touched_fields(), vec!["critic_feedback", "is_approved"]);
        assert!(StateUpdate::new().is_empty());
        assert!(!update.is_empty());
    }
}
