use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use wayfarer_agent::graph::ExecutionResult;
use wayfarer_agent::nodes::{ASK_HUMAN, CONFIDENCE, CRITIC, FAILURE_HANDLER, FINDER, PLANNER, PUBLISHER};
use wayfarer_agent::routing;
use wayfarer_agent::{build_workflow, run_workflow, Generator, GraphExecutor, TripDraft, WorkflowDeps};
use wayfarer_core::config::AppConfig;
use wayfarer_core::event::{EventBus, WorkflowEvent};
use wayfarer_core::state::{WorkflowState, MAX_RETRIES};
use wayfarer_core::traits::LlmClient;
use wayfarer_core::trip::{FlightStatus, TravelStyle};
use wayfarer_core::types::RunId;
use wayfarer_test_utils::*;

const ROUTER: &str = "Classify the travel style";
const PLANNER_PROMPT: &str = "Create a day-by-day itinerary";
const CRITIC_PROMPT: &str = "Review this itinerary";

const CULTURAL: &str = r#"{"style": "Cultural", "reasoning": "history first"}"#;
const APPROVE: &str = r#"{"approved": true, "critique": ""}"#;

struct Harness {
    llm: Arc<ScriptedLlm>,
    places: Arc<MockPlaceLookup>,
    prices: Arc<MockPriceSearch>,
    flights: Arc<MockFlightSearch>,
    renderer: Arc<RecordingRenderer>,
    human: Arc<ScriptedHuman>,
    events: Arc<EventBus>,
    graph: GraphExecutor,
}

impl Harness {
    fn new(
        llm: ScriptedLlm,
        places: MockPlaceLookup,
        flights: MockFlightSearch,
        human: &[&str],
        draft: TripDraft,
    ) -> Self {
        let llm = Arc::new(llm);
        let places = Arc::new(places);
        let prices = Arc::new(MockPriceSearch::new("Dinner for two around 60 EUR"));
        let flights = Arc::new(flights);
        let renderer = Arc::new(RecordingRenderer::new());
        let human = Arc::new(ScriptedHuman::new(human));
        let events = Arc::new(EventBus::default());

        let config = AppConfig::from_toml("[model]\nmodel_id = \"test-model\"\n").unwrap();
        let client: Arc<dyn LlmClient> = llm.clone();
        let deps = WorkflowDeps {
            generator: Generator::new(client, config.model.clone()),
            places: places.clone(),
            prices: prices.clone(),
            flights: flights.clone(),
            renderer: renderer.clone(),
            human: human.clone(),
            aliases: Arc::new(wayfarer_tools::load_aliases(None).unwrap()),
            draft,
            max_flight_attempts: config.workflow.max_flight_attempts,
            max_steps: config.workflow.max_steps,
        };
        let graph = build_workflow(deps, events.clone()).unwrap();

        Self {
            llm,
            places,
            prices,
            flights,
            renderer,
            human,
            events,
            graph,
        }
    }

    async fn run(&self) -> ExecutionResult {
        run_workflow(&self.graph, RunId::new("scenario")).await.unwrap()
    }
}

/// Rome for two days, no flights: init asks nothing.
fn rome_draft() -> TripDraft {
    TripDraft {
        destination: Some("Rome".into()),
        days: Some(2),
        interests: Some("history, food".into()),
        budget: Some("Medium".into()),
        companion: Some("Couple".into()),
        origin: Some(String::new()),
        ..TripDraft::default()
    }
}

fn rome_plan() -> String {
    itinerary_json(&[
        ("Ancient Rome", &["Colosseum", "Roman Forum"]),
        ("Trastevere", &["Santa Maria in Trastevere"]),
    ])
}

fn rome_lookup() -> MockPlaceLookup {
    MockPlaceLookup::new()
        .with("Colosseum", vec![candidate("Colosseo", "Piazza del Colosseo, Roma", 4.7)])
        .with("Roman Forum", vec![candidate("Foro Romano", "Via della Salara Vecchia, Roma", 4.6)])
        .with(
            "Santa Maria in Trastevere",
            vec![candidate("Santa Maria in Trastevere", "Piazza di S. Maria in Trastevere, Roma", 4.8)],
        )
}

#[tokio::test]
async fn test_happy_path_publishes_verified_plan() {
    let llm = ScriptedLlm::new()
        .on(CRITIC_PROMPT, &[APPROVE])
        .on(ROUTER, &[CULTURAL])
        .on(PLANNER_PROMPT, &[&rome_plan()]);
    let h = Harness::new(llm, rome_lookup(), MockFlightSearch::new(), &[], rome_draft());

    let result = h.run().await;
    let state = &result.state;

    assert_eq!(
        result.path(),
        vec![
            "init", "flights", "router", "budget", "planner", "finder", "confidence", "critic",
            "publisher"
        ]
    );
    assert!(state.is_approved);
    assert_eq!(state.retry_count, 0);
    assert_eq!(state.travel_style, Some(TravelStyle::Cultural));
    assert_eq!(state.confidence_score, 0.8);
    assert_eq!(state.total_places(), 3);
    assert!(state.itinerary.iter().flat_map(|d| &d.places).all(|p| p.is_verified()));
    assert_eq!(state.itinerary[0].places[0].name, "Colosseo");
    assert_eq!(
        state.budget_context.as_deref(),
        Some("Dinner for two around 60 EUR")
    );
    assert_eq!(state.report_paths, vec![PathBuf::from("outputs/trip.html")]);

    assert_eq!(h.renderer.renders(), 1);
    assert!(h.renderer.last_state().unwrap().is_approved);
    assert_eq!(h.prices.calls(), 1);
    assert_eq!(h.places.queries().len(), 3);
    assert_eq!(h.human.prompts().len(), 0);
}

#[tokio::test]
async fn test_no_origin_skips_flight_search() {
    let llm = ScriptedLlm::new()
        .on(CRITIC_PROMPT, &[APPROVE])
        .on(PLANNER_PROMPT, &[&rome_plan()])
        .with_fallback(CULTURAL);
    let h = Harness::new(llm, rome_lookup(), MockFlightSearch::new(), &[], rome_draft());

    let state = h.run().await.state;

    assert_eq!(h.flights.calls(), 0);
    assert!(state.flight_options.is_empty());
    assert_eq!(state.flight_confidence_score, 0.0);
    assert!(state.request.as_ref().unwrap().origin.is_none());
}

#[tokio::test]
async fn test_confirmed_flight_is_carried_to_report() {
    let llm = ScriptedLlm::new()
        .on(CRITIC_PROMPT, &[APPROVE])
        .on(PLANNER_PROMPT, &[&rome_plan()])
        .with_fallback(CULTURAL);
    let flights = MockFlightSearch::new().then(vec![
        offer("ITA Airways AZ2041", Some("€129")),
        offer("Ryanair FR4821", Some("€49")),
    ]);
    let draft = TripDraft {
        origin: Some("Milan".into()),
        depart_date: NaiveDate::from_ymd_opt(2026, 5, 10),
        ..rome_draft()
    };
    // One-way: the return-date question gets an empty answer.
    let h = Harness::new(llm, rome_lookup(), flights, &["", "yes"], draft);

    let state = h.run().await.state;

    assert_eq!(h.flights.calls(), 1);
    let query = &h.flights.queries()[0];
    assert_eq!(query.origin, "Milan");
    assert_eq!(query.destination, "Rome");
    assert_eq!(state.flight_options.len(), 1);
    assert_eq!(state.flight_options[0].title, "Ryanair FR4821");
    assert_eq!(state.flight_options[0].status, FlightStatus::Confirmed);
    assert_eq!(state.flight_confidence_score, 0.8);
    assert!(h.renderer.last_state().unwrap().flight_options[0].price.is_some());
}

#[tokio::test]
async fn test_three_critic_rejections_reach_failure_handler() {
    let llm = ScriptedLlm::new()
        .on(
            CRITIC_PROMPT,
            &[r#"{"approved": false, "critique": "Day 2 is too far from the centre"}"#],
        )
        .on(ROUTER, &[CULTURAL])
        .on(PLANNER_PROMPT, &[&rome_plan()]);
    let h = Harness::new(llm, rome_lookup(), MockFlightSearch::new(), &[], rome_draft());

    let result = h.run().await;
    let state = &result.state;

    assert_eq!(result.terminal_node(), Some(FAILURE_HANDLER));
    assert!(state.itinerary.is_empty());
    assert!(!state.is_approved);
    assert_eq!(state.retry_count, MAX_RETRIES);
    let feedback = state.critic_feedback.as_deref().unwrap();
    assert!(feedback.starts_with("Validation failed after 3 attempts"));
    assert!(feedback.contains("too far from the centre"));

    assert_eq!(h.llm.calls_matching(PLANNER_PROMPT), 3);
    assert_eq!(h.llm.calls_matching(CRITIC_PROMPT), 3);
    assert_eq!(h.renderer.renders(), 0);

    // Rejected drafts are banned under their verified names.
    assert!(state.banned_places.contains("Colosseo"));
    assert!(state.banned_places.contains("Foro Romano"));
    let last_planner_prompt = h
        .llm
        .prompts()
        .into_iter()
        .filter(|p| p.contains(PLANNER_PROMPT))
        .last()
        .unwrap();
    assert!(last_planner_prompt.contains("Do NOT use any of these places again"));
    assert!(last_planner_prompt.contains("too far from the centre"));
}

#[tokio::test]
async fn test_human_confirms_low_confidence_plan() {
    let llm = ScriptedLlm::new()
        .on(CRITIC_PROMPT, &[APPROVE])
        .on(PLANNER_PROMPT, &[&rome_plan()])
        .with_fallback(CULTURAL);
    // Nothing is found, so every place stays unverified.
    let h = Harness::new(llm, MockPlaceLookup::new(), MockFlightSearch::new(), &["yes"], rome_draft());

    let result = h.run().await;

    let confidence = result.steps.iter().position(|s| s.node == CONFIDENCE).unwrap();
    assert_eq!(result.steps[confidence].label, Some(routing::ASK_HUMAN));
    let ask = &result.steps[confidence + 1];
    assert_eq!(ask.node, ASK_HUMAN);
    assert_eq!(ask.label, Some(routing::APPROVED));
    assert_eq!(ask.next, FINDER);

    assert_eq!(h.human.prompts().len(), 1);
    assert!(h.human.prompts()[0].contains("Colosseum (unverified)"));

    let state = &result.state;
    assert!(state.is_approved);
    assert!(state.critic_feedback.is_none());
    assert_eq!(state.retry_count, 0);
    assert_eq!(state.confidence_score, 0.4);
    assert_eq!(h.llm.calls_matching(PLANNER_PROMPT), 1);
    assert_eq!(h.renderer.renders(), 1);
}

#[tokio::test]
async fn test_traveller_rejects_until_failure() {
    let llm = ScriptedLlm::new()
        .on(CRITIC_PROMPT, &[APPROVE])
        .on(PLANNER_PROMPT, &[&rome_plan()])
        .with_fallback(CULTURAL);
    // Nothing ever verifies, so every draft goes back to the traveller.
    let h = Harness::new(
        llm,
        MockPlaceLookup::new(),
        MockFlightSearch::new(),
        &["no", "no", "no"],
        rome_draft(),
    );

    let result = h.run().await;
    let state = &result.state;

    assert_eq!(result.terminal_node(), Some(FAILURE_HANDLER));
    assert!(state.itinerary.is_empty());
    assert!(!state.is_approved);
    assert_eq!(state.retry_count, MAX_RETRIES);
    let feedback = state.critic_feedback.as_deref().unwrap();
    assert!(feedback.starts_with("Validation failed after 3 attempts"));

    assert_eq!(h.human.remaining(), 0);
    assert_eq!(h.llm.calls_matching(PLANNER_PROMPT), 3);
    assert_eq!(h.llm.calls_matching(CRITIC_PROMPT), 0);
    assert_eq!(h.renderer.renders(), 0);

    let last_ask = result.steps.iter().filter(|s| s.node == ASK_HUMAN).last().unwrap();
    assert_eq!(last_ask.label, Some(routing::FAIL));
    assert_eq!(last_ask.next, FAILURE_HANDLER);
}

#[tokio::test]
async fn test_human_feedback_is_sent_back_to_planner() {
    let llm = ScriptedLlm::new()
        .on(CRITIC_PROMPT, &[APPROVE])
        .on(PLANNER_PROMPT, &[&rome_plan()])
        .with_fallback(CULTURAL);
    let h = Harness::new(
        llm,
        MockPlaceLookup::new(),
        MockFlightSearch::new(),
        &["Add a food market on day 2", "yes"],
        rome_draft(),
    );
    let mut rx = h.events.subscribe();

    let result = h.run().await;

    let ask = result.steps.iter().find(|s| s.node == ASK_HUMAN).unwrap();
    assert_eq!(ask.label, Some(routing::REJECTED));
    assert_eq!(ask.next, PLANNER);

    let revision = h
        .llm
        .prompts()
        .into_iter()
        .filter(|p| p.contains(PLANNER_PROMPT))
        .nth(1)
        .unwrap();
    assert!(revision.contains("Add a food market on day 2"));
    assert_eq!(result.state.retry_count, 1);
    assert!(result.state.is_approved);

    let mut retries = 0;
    while let Ok(event) = rx.try_recv() {
        if let WorkflowEvent::RetryScheduled { feedback, .. } = event {
            assert_eq!(feedback, "Add a food market on day 2");
            retries += 1;
        }
    }
    assert_eq!(retries, 1);
}

#[tokio::test]
async fn test_empty_itinerary_goes_to_human_review() {
    let llm = ScriptedLlm::new()
        .on(CRITIC_PROMPT, &[APPROVE])
        .on(PLANNER_PROMPT, &[&rome_plan()])
        .with_fallback(CULTURAL);
    let h = Harness::new(llm, rome_lookup(), MockFlightSearch::new(), &["no"], rome_draft());

    let initial = WorkflowState {
        request: Some(rome_request()),
        ..WorkflowState::default()
    };
    let result = h
        .graph
        .run(RunId::new("empty"), CONFIDENCE, initial)
        .await
        .unwrap();

    let first = &result.steps[0];
    assert_eq!(first.node, CONFIDENCE);
    assert_eq!(first.label, Some(routing::ASK_HUMAN));
    assert_eq!(first.next, ASK_HUMAN);

    // The declined empty plan goes back to the planner and is then approved.
    assert_eq!(result.steps[1].next, PLANNER);
    assert!(result.state.is_approved);
    assert_eq!(result.terminal_node(), Some(PUBLISHER));
}

#[tokio::test]
async fn test_generation_outage_still_finishes() {
    let h = Harness::new(
        ScriptedLlm::new(),
        MockPlaceLookup::failing(),
        MockFlightSearch::new(),
        &["yes"],
        rome_draft(),
    );

    let result = h.run().await;
    let state = &result.state;

    // Empty answers: default style, single-day fallback, critic waves it through.
    assert_eq!(state.travel_style, Some(TravelStyle::Relax));
    assert_eq!(state.itinerary.len(), 1);
    assert_eq!(state.itinerary[0].places[0].name, "Rome city centre");
    assert!(state.is_approved);
    assert!(result.path().contains(&CRITIC));
    assert_eq!(h.renderer.renders(), 1);
}
