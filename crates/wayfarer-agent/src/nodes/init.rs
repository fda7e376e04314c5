use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::BoxFuture;

use wayfarer_core::error::{Result, WayfarerError};
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::traits::HumanPort;
use wayfarer_core::trip::{BudgetDescriptor, TripRequest};

use crate::answers::{non_empty, parse_date};
use crate::graph::{Node, NodeContext};

const DEFAULT_DAYS: u32 = 3;
const DEFAULT_BUDGET: &str = "Medium";
const DEFAULT_COMPANION: &str = "Solo";

/// Trip parameters known before the run, e.g. from command-line flags.
///
/// Anything left `None` is asked through the human port. An origin of
/// `Some("")` means "no flights" and suppresses the date questions.
#[derive(Debug, Clone, Default)]
pub struct TripDraft {
    pub destination: Option<String>,
    pub days: Option<u32>,
    pub interests: Option<String>,
    pub budget: Option<String>,
    pub companion: Option<String>,
    pub origin: Option<String>,
    pub depart_date: Option<NaiveDate>,
    pub return_date: Option<NaiveDate>,
}

/// Collects the trip request. The only node that sets it.
pub struct InitNode {
    human: Arc<dyn HumanPort>,
    draft: TripDraft,
}

impl InitNode {
    pub fn new(human: Arc<dyn HumanPort>, draft: TripDraft) -> Self {
        Self { human, draft }
    }

    /// Optional question: a failed prompt counts as a blank answer.
    async fn ask(&self, ctx: &NodeContext, question: &str) -> Option<String> {
        match self.human.prompt(question).await {
            Ok(answer) => non_empty(&answer),
            Err(e) => {
                ctx.warning(format!("No answer to {:?}: {}", question, e));
                None
            }
        }
    }

    async fn collect(&self, ctx: &NodeContext) -> Result<TripRequest> {
        let draft = &self.draft;

        let destination = match draft.destination.as_deref().and_then(non_empty) {
            Some(destination) => destination,
            None => {
                let answer = self.human.prompt("Where do you want to go?").await?;
                non_empty(&answer)
                    .ok_or_else(|| WayfarerError::HumanInput("a destination is required".into()))?
            }
        };

        let days = match draft.days.filter(|d| *d > 0) {
            Some(days) => days,
            None => self
                .ask(ctx, "How many days?")
                .await
                .and_then(|a| a.parse::<u32>().ok())
                .filter(|d| *d > 0)
                .unwrap_or(DEFAULT_DAYS),
        };

        let interests = match &draft.interests {
            Some(interests) => interests.trim().to_string(),
            None => self.ask(ctx, "Interests?").await.unwrap_or_default(),
        };

        let budget = match draft.budget.as_deref().and_then(non_empty) {
            Some(budget) => budget,
            None => self
                .ask(ctx, "Budget? (Low / Medium / Luxury, or an amount)")
                .await
                .unwrap_or_else(|| DEFAULT_BUDGET.to_string()),
        };

        let companion = match draft.companion.as_deref().and_then(non_empty) {
            Some(companion) => companion,
            None => self
                .ask(ctx, "Who are you travelling with? (Solo / Couple / Family / Friends)")
                .await
                .unwrap_or_else(|| DEFAULT_COMPANION.to_string()),
        };

        let origin = match &draft.origin {
            Some(origin) => non_empty(origin),
            None => {
                self.ask(ctx, "Departure city for flights? (leave empty to skip)")
                    .await
            }
        };

        let mut depart_date = None;
        let mut return_date = None;
        if origin.is_some() {
            depart_date = match draft.depart_date {
                Some(date) => Some(date),
                None => self.ask_date(ctx, "Departure date? (YYYY-MM-DD)").await,
            };
            if let Some(depart) = depart_date {
                return_date = match draft.return_date {
                    Some(date) => Some(date),
                    None => {
                        self.ask_date(ctx, "Return date? (YYYY-MM-DD, empty for one-way)")
                            .await
                    }
                };
                if return_date.is_some_and(|r| r < depart) {
                    ctx.warning("Return date is before departure, treating as one-way");
                    return_date = None;
                }
            }
        }

        let mut request = TripRequest::new(destination, days)
            .with_interests(interests)
            .with_budget(BudgetDescriptor::parse(&budget))
            .with_companion(companion)
            .with_dates(depart_date, return_date);
        request.origin = origin;
        Ok(request)
    }

    async fn ask_date(&self, ctx: &NodeContext, question: &str) -> Option<NaiveDate> {
        let answer = self.ask(ctx, question).await?;
        let date = parse_date(&answer);
        if date.is_none() {
            ctx.warning(format!("Not a date: {:?}", answer));
        }
        date
    }
}

impl Node for InitNode {
    fn name(&self) -> &str {
        super::INIT
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            if state.request.is_some() {
                ctx.thought("Trip request already set");
                return Ok(StateUpdate::new());
            }

            let request = self.collect(ctx).await?;
            ctx.thought(format!("New trip: {}", request.summary()));
            Ok(StateUpdate::new().with_request(request))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_core::trip::BudgetTier;
    use wayfarer_test_utils::ScriptedHuman;

    use crate::nodes::testing::ctx;

    async fn run(human: Arc<ScriptedHuman>, draft: TripDraft) -> Result<StateUpdate> {
        let node = InitNode::new(human, draft);
        node.execute(&ctx("init"), &WorkflowState::new()).await
    }

    #[tokio::test]
    async fn test_collects_everything_interactively() {
        let human = Arc::new(ScriptedHuman::new(&[
            "Rome",
            "2",
            "history, food",
            "1200",
            "Couple",
            "Milan",
            "2026-05-01",
            "2026-05-03",
        ]));
        let update = run(human.clone(), TripDraft::default()).await.unwrap();
        let request = update.request.unwrap();
        assert_eq!(request.destination, "Rome");
        assert_eq!(request.days, 2);
        assert_eq!(request.budget, BudgetDescriptor::Total(1200.0));
        assert_eq!(request.companion, "Couple");
        assert_eq!(request.origin.as_deref(), Some("Milan"));
        assert_eq!(request.return_date, NaiveDate::from_ymd_opt(2026, 5, 3));
        assert_eq!(human.remaining(), 0);
    }

    #[tokio::test]
    async fn test_defaults_for_blank_answers() {
        let human = Arc::new(ScriptedHuman::new(&["Lisbon", "many", "", "", "", ""]));
        let request = run(human, TripDraft::default()).await.unwrap().request.unwrap();
        assert_eq!(request.days, 3);
        assert_eq!(request.budget, BudgetDescriptor::Tier(BudgetTier::Medium));
        assert_eq!(request.companion, "Solo");
        assert!(request.origin.is_none());
        assert!(request.depart_date.is_none());
    }

    #[tokio::test]
    async fn test_draft_prefills_and_empty_origin_skips_dates() {
        let human = Arc::new(ScriptedHuman::new(&[]));
        let draft = TripDraft {
            destination: Some("Rome".into()),
            days: Some(2),
            interests: Some("art".into()),
            budget: Some("Low".into()),
            companion: Some("Family".into()),
            origin: Some(String::new()),
            ..TripDraft::default()
        };
        let request = run(human.clone(), draft).await.unwrap().request.unwrap();
        assert_eq!(request.destination, "Rome");
        assert!(request.origin.is_none());
        assert!(human.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_destination_is_an_error() {
        let human = Arc::new(ScriptedHuman::new(&["   "]));
        let err = run(human, TripDraft::default()).await.unwrap_err();
        assert!(matches!(err, WayfarerError::HumanInput(_)));
    }

    #[tokio::test]
    async fn test_does_not_overwrite_existing_request() {
        let human = Arc::new(ScriptedHuman::new(&[]));
        let node = InitNode::new(human, TripDraft::default());
        let mut state = WorkflowState::new();
        state.request = Some(TripRequest::new("Rome", 2));
        let update = node.execute(&ctx("init"), &state).await.unwrap();
        assert!(update.is_empty());
    }
}
