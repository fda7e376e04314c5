use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::Value;

use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::trip::{DayPlan, Place, TripRequest};

use crate::graph::{Node, NodeContext};
use crate::json::try_parse;
use crate::llm::Generator;
use crate::prompts;

const FILLER_FOCUS: &str = "Free exploration";

#[derive(Debug, Deserialize)]
struct DraftDay {
    #[serde(default)]
    focus: Option<String>,
    #[serde(default)]
    places: Vec<DraftPlace>,
}

#[derive(Debug, Deserialize)]
struct DraftPlace {
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    cost: Option<Value>,
}

impl DraftPlace {
    fn into_place(self) -> Option<Place> {
        let name = self.name.trim();
        if name.is_empty() {
            return None;
        }
        let mut place = Place::unverified(name, self.address.unwrap_or_default().trim());
        place.cost = match self.cost {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        };
        Some(place)
    }
}

/// Turn generation output into exactly `request.days` contiguous days.
///
/// Accepts a bare array or an object with an `itinerary` array. Returns
/// `None` when nothing usable came back.
pub fn normalize_itinerary(text: &str, request: &TripRequest) -> Option<Vec<DayPlan>> {
    let value: Value = try_parse(text)?;
    let days = match value {
        Value::Array(days) => days,
        Value::Object(mut map) => match map.remove("itinerary") {
            Some(Value::Array(days)) => days,
            _ => return None,
        },
        _ => return None,
    };

    let mut plan: Vec<DayPlan> = days
        .into_iter()
        .filter_map(|day| serde_json::from_value::<DraftDay>(day).ok())
        .map(|day| DayPlan {
            day_number: 0,
            focus: day
                .focus
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| FILLER_FOCUS.to_string()),
            places: day.places.into_iter().filter_map(DraftPlace::into_place).collect(),
        })
        .collect();
    if plan.is_empty() {
        return None;
    }

    let wanted = request.days.max(1) as usize;
    plan.truncate(wanted);
    while plan.len() < wanted {
        plan.push(DayPlan {
            day_number: 0,
            focus: FILLER_FOCUS.to_string(),
            places: vec![],
        });
    }
    for (i, day) in plan.iter_mut().enumerate() {
        day.day_number = i as u32 + 1;
    }
    Some(plan)
}

/// Deterministic stand-in for unusable generation output.
pub fn fallback_itinerary(request: &TripRequest) -> Vec<DayPlan> {
    vec![DayPlan {
        day_number: 1,
        focus: FILLER_FOCUS.to_string(),
        places: vec![Place::unverified(
            format!("{} city centre", request.destination),
            "",
        )],
    }]
}

/// Drafts the itinerary, carrying rejection feedback and banned places.
pub struct PlannerNode {
    generator: Generator,
}

impl PlannerNode {
    pub fn new(generator: Generator) -> Self {
        Self { generator }
    }
}

impl Node for PlannerNode {
    fn name(&self) -> &str {
        super::PLANNER
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            let trip = state.trip()?;
            let style = state.travel_style.unwrap_or_default();
            if let Some(feedback) = &state.critic_feedback {
                ctx.warning(format!("Revising after feedback: {}", feedback));
            }

            let prompt = prompts::planner(
                trip,
                style,
                state.budget_context.as_deref(),
                state.critic_feedback.as_deref(),
                &state.banned_places,
            );
            ctx.action(format!(
                "Drafting {} days in {} (attempt {})",
                trip.days,
                trip.destination,
                state.retry_count + 1
            ));

            let itinerary = match self.generator.generate(prompts::SYSTEM, &prompt).await {
                Ok(text) => normalize_itinerary(&text, trip),
                Err(e) => {
                    ctx.warning(format!("Planner generation failed: {}", e));
                    None
                }
            };
            let itinerary = itinerary.unwrap_or_else(|| {
                ctx.warning("Unusable itinerary, using the single-day fallback");
                fallback_itinerary(trip)
            });

            ctx.thought(format!(
                "Draft with {} days and {} places",
                itinerary.len(),
                itinerary.iter().map(|d| d.places.len()).sum::<usize>()
            ));
            Ok(StateUpdate::new()
                .with_itinerary(itinerary)
                .with_approval(false))
        })
    }
}
