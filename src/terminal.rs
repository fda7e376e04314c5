use wayfarer_agent::ExecutionResult;
use wayfarer_core::event::WorkflowEvent;
use wayfarer_core::state::WorkflowState;
use wayfarer_core::trip::{FlightStatus, Verification};

const RULE: &str = "============================================================";

/// One-line rendering of a progress event, or `None` for events the
/// console does not show.
pub fn event_line(event: &WorkflowEvent) -> Option<String> {
    match event {
        WorkflowEvent::NodeStarted { node } => Some(format!("[{}]", node)),
        WorkflowEvent::Thought { node, message } => Some(format!("  {}: {}", node, message)),
        WorkflowEvent::Action { node, message } => Some(format!("  {} -> {}", node, message)),
        WorkflowEvent::Warning { node, message } => Some(format!("  {} ! {}", node, message)),
        WorkflowEvent::RetryScheduled {
            retry_count,
            banned,
            feedback,
        } => Some(format!(
            "  retry {} ({} places banned): {}",
            retry_count, banned, feedback
        )),
        WorkflowEvent::RunFailed { error } => Some(format!("[error: {}]", error)),
        _ => None,
    }
}

/// Final report, or the failure banner when the plan never passed review.
pub fn render(result: &ExecutionResult) -> String {
    let state = &result.state;
    let mut out = String::new();
    out.push_str(RULE);
    out.push('\n');

    if !state.is_approved && state.itinerary.is_empty() {
        out.push_str("VALIDATION FAILED\n");
        out.push_str(&format!(
            "{}\n",
            state
                .critic_feedback
                .as_deref()
                .unwrap_or("The plan was not approved.")
        ));
        out.push_str(RULE);
        out.push('\n');
        return out;
    }

    if let Some(trip) = &state.request {
        out.push_str(&format!("{} | {} days\n", trip.destination.to_uppercase(), trip.days));
    }
    if let Some(style) = state.travel_style {
        out.push_str(&format!("Style: {}\n", style.label()));
    }
    out.push_str(&format!(
        "Confidence: {:.2} | attempts: {}\n",
        state.confidence_score,
        state.retry_count + 1
    ));
    out.push_str(&flights(state));

    for day in &state.itinerary {
        out.push_str(&format!("\nDay {}: {}\n", day.day_number, day.focus));
        for place in &day.places {
            let mark = match place.verification {
                Verification::Verified { .. } => "ok",
                Verification::Unverified => "??",
            };
            out.push_str(&format!("  [{}] {} ({})", mark, place.name, place.rating));
            if !place.address.is_empty() {
                out.push_str(&format!(" - {}", place.address));
            }
            if let Some(cost) = &place.cost {
                out.push_str(&format!(" | {}", cost));
            }
            out.push('\n');
        }
    }

    if !state.report_paths.is_empty() {
        out.push_str("\nReports:\n");
        for path in &state.report_paths {
            out.push_str(&format!("  - {}\n", path.display()));
        }
    }
    out.push_str(RULE);
    out.push('\n');
    out
}

fn flights(state: &WorkflowState) -> String {
    let confirmed = state
        .flight_options
        .iter()
        .find(|f| f.status == FlightStatus::Confirmed);
    match (confirmed, &state.flight_summary) {
        (Some(flight), _) => format!(
            "Flight: {} {} -> {} on {} ({})\n",
            flight.title,
            flight.origin,
            flight.destination,
            flight.depart_date,
            flight.price_text.as_deref().unwrap_or("price n/a")
        ),
        (None, Some(summary)) => format!("Flights: {}\n", summary),
        (None, None) => String::new(),
    }
}
