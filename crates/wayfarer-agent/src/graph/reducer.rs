use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::state::{StateUpdate, WorkflowState};

/// Merge a node's partial update into the running state.
///
/// Present keys overwrite, absent keys are untouched, with three
/// per-key exceptions:
/// - `request` is write-once;
/// - `retry_count` may only move to `old + 1`;
/// - `banned_places` is merged by set union.
///
/// Scores must already be clamped to `[0, 1]` by their producer.
pub fn merge(mut state: WorkflowState, update: StateUpdate) -> Result<WorkflowState> {
    check(&state, &update)?;

    let StateUpdate {
        request,
        travel_style,
        itinerary,
        flight_options,
        flight_summary,
        flight_confidence_score,
        critic_feedback,
        budget_context,
        confidence_score,
        is_approved,
        retry_count,
        banned_places,
        report_paths,
    } = update;

    if request.is_some() {
        state.request = request;
    }
    if travel_style.is_some() {
        state.travel_style = travel_style;
    }
    if let Some(itinerary) = itinerary {
        state.itinerary = itinerary;
    }
    if let Some(options) = flight_options {
        state.flight_options = options;
    }
    if let Some(summary) = flight_summary {
        state.flight_summary = summary;
    }
    if let Some(score) = flight_confidence_score {
        state.flight_confidence_score = score;
    }
    if let Some(feedback) = critic_feedback {
        state.critic_feedback = feedback;
    }
    if let Some(context) = budget_context {
        state.budget_context = context;
    }
    if let Some(score) = confidence_score {
        state.confidence_score = score;
    }
    if let Some(approved) = is_approved {
        state.is_approved = approved;
    }
    if let Some(count) = retry_count {
        state.retry_count = count;
    }
    if let Some(names) = banned_places {
        state.banned_places.extend(names);
    }
    if let Some(paths) = report_paths {
        state.report_paths = paths;
    }

    Ok(state)
}

fn check(state: &WorkflowState, update: &StateUpdate) -> Result<()> {
    if update.request.is_some() && state.request.is_some() {
        return Err(WayfarerError::InvalidUpdate {
            field: "request",
            reason: "trip request is already set".into(),
        });
    }

    if let Some(count) = update.retry_count {
        let expected = state.retry_count + 1;
        if count != expected {
            return Err(WayfarerError::InvalidUpdate {
                field: "retry_count",
                reason: format!("expected {}, got {}", expected, count),
            });
        }
    }

    for (field, score) in [
        ("confidence_score", update.confidence_score),
        ("flight_confidence_score", update.flight_confidence_score),
    ] {
        if let Some(score) = score {
            if !(0.0..=1.0).contains(&score) {
                return Err(WayfarerError::InvalidUpdate {
                    field,
                    reason: format!("{} is outside [0, 1]", score),
                });
            }
        }
    }

    Ok(())
}
