//! Prompt templates sent to the generation service.

use std::collections::BTreeSet;

use serde::Deserialize;

use wayfarer_core::trip::{DayPlan, TravelStyle, TripRequest};

/// Shared system message.
pub const SYSTEM: &str = "You are an expert travel assistant. \
Answer with valid JSON only, no markdown and no commentary.";

pub fn router(request: &TripRequest) -> String {
    format!(
        r#"Classify the travel style of this trip request:
"{}"

Pick exactly ONE of: "RELAX", "ADVENTURE", "CULTURAL", "GASTRONOMIC", "LUXURY", "LOW COST".

Respond with JSON:
{{
  "reasoning": "short explanation",
  "style": "CHOSEN_STYLE"
}}"#,
        request.summary()
    )
}

/// Router answer.
#[derive(Debug, Default, Deserialize)]
pub struct StyleChoice {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub reasoning: Option<String>,
}

pub fn planner(
    request: &TripRequest,
    style: TravelStyle,
    budget_context: Option<&str>,
    feedback: Option<&str>,
    banned: &BTreeSet<String>,
) -> String {
    let mut constraints = String::new();
    if let Some(feedback) = feedback {
        constraints.push_str(&format!(
            "FIX THE PREVIOUS ITINERARY. It was rejected for this reason: {}\n",
            feedback
        ));
    }
    if !banned.is_empty() {
        constraints.push_str(&format!(
            "Do NOT use any of these places again: {}\n",
            banned.iter().cloned().collect::<Vec<_>>().join(", ")
        ));
    }

    format!(
        r#"Create a day-by-day itinerary for {destination}, exactly {days} days.

PROFILE:
- Style: {style}
- Interests: {interests}
- Budget: {budget} (choose restaurants and activities that fit it)
- Group: {companion} (adapt the pace to this group)

PRICE NOTES:
{prices}

{constraints}
Respond with a JSON array, one object per day:
[
  {{
    "day_number": 1,
    "focus": "Theme of the day",
    "places": [
      {{ "name": "Place name", "address": "Street address", "cost": "Entry price or free" }}
    ]
  }}
]"#,
        destination = request.destination,
        days = request.days,
        style = style.label(),
        interests = if request.interests.is_empty() {
            "none given"
        } else {
            &request.interests
        },
        budget = request.budget,
        companion = request.companion,
        prices = budget_context.unwrap_or("none"),
        constraints = constraints,
    )
}

pub fn critic(request: &TripRequest, itinerary: &[DayPlan]) -> String {
    let itinerary = serde_json::to_string_pretty(itinerary).unwrap_or_default();
    format!(
        r#"Review this itinerary for {} ({} days, budget {}, group {}):
{}

Check logistics, distances and consistency (for example, do not send a low-cost
traveller to a Michelin-starred restaurant).
Respond with JSON:
{{
  "approved": true,
  "critique": "reason for rejection, be specific"
}}"#,
        request.destination, request.days, request.budget, request.companion, itinerary
    )
}

/// Critic answer.
#[derive(Debug, Deserialize)]
pub struct CriticVerdict {
    #[serde(default = "approve")]
    pub approved: bool,
    #[serde(default)]
    pub critique: Option<String>,
}

fn approve() -> bool {
    true
}

impl Default for CriticVerdict {
    fn default() -> Self {
        Self {
            approved: true,
            critique: None,
        }
    }
}
