use std::cmp::Ordering;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

use wayfarer_core::state::StateUpdate;
use wayfarer_core::traits::{FlightSearch, HumanPort};
use wayfarer_core::trip::{FlightOption, FlightStatus, ReturnLeg, TripRequest};
use wayfarer_core::types::FlightOffer;

use crate::answers::{is_change, is_yes, parse_date};
use crate::graph::NodeContext;

/// Confidence of a confirmed offer with a parsed price.
pub const CONFIRMED_PRICED: f64 = 0.8;
/// Confidence of a confirmed offer without a usable price.
pub const CONFIRMED_UNPRICED: f64 = 0.5;
/// Confidence when the traveller skips the selection.
pub const SKIPPED: f64 = 0.4;

/// Prompts allowed to obtain a valid date once a change was requested.
const DATE_PROMPTS: u32 = 3;

/// What the negotiation commits to the state.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightOutcome {
    pub options: Vec<FlightOption>,
    pub summary: Option<String>,
    pub confidence: f64,
}

impl FlightOutcome {
    fn none(summary: impl Into<String>) -> Self {
        Self {
            options: vec![],
            summary: Some(summary.into()),
            confidence: 0.0,
        }
    }

    pub fn into_update(self) -> StateUpdate {
        StateUpdate::new().with_flights(self.options, self.summary, self.confidence)
    }
}

fn price_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\d(?:[\d.,]*\d)?").expect("valid price pattern"))
}

/// First amount in a price text, accepting `1.234,56` and `1,234.56` styles.
pub fn parse_price(text: &str) -> Option<f64> {
    let raw = price_regex().find(text)?.as_str();
    let digits_after = |idx: usize| raw.len() - idx - 1;

    let normalized = match (raw.rfind('.'), raw.rfind(',')) {
        (Some(dot), Some(comma)) if dot > comma => raw.replace(',', ""),
        (Some(_), Some(_)) => raw.replace('.', "").replace(',', "."),
        (None, Some(comma)) => {
            if raw.matches(',').count() > 1 || digits_after(comma) == 3 {
                raw.replace(',', "")
            } else {
                raw.replace(',', ".")
            }
        }
        (Some(dot), None) => {
            if raw.matches('.').count() > 1 || digits_after(dot) == 3 {
                raw.replace('.', "")
            } else {
                raw.to_string()
            }
        }
        (None, None) => raw.to_string(),
    };
    normalized.parse().ok()
}

fn by_price(a: &FlightOption, b: &FlightOption) -> Ordering {
    match (a.price, b.price) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Offers as options, cheapest first; offers without a price go last.
pub fn rank_offers(
    offers: Vec<FlightOffer>,
    origin: &str,
    destination: &str,
    date: NaiveDate,
) -> Vec<FlightOption> {
    let mut options: Vec<FlightOption> = offers
        .into_iter()
        .map(|offer| FlightOption {
            price: offer.price_text.as_deref().and_then(parse_price),
            title: offer.title,
            source: offer.source,
            url: offer.url,
            price_text: offer.price_text,
            origin: origin.to_string(),
            destination: destination.to_string(),
            depart_date: date,
            depart_time: offer.depart_time,
            return_leg: None,
            status: FlightStatus::Proposed,
        })
        .collect();
    options.sort_by(by_price);
    options
}

fn describe(option: &FlightOption) -> String {
    let mut text = format!(
        "{} on {}{} ({})",
        option.title,
        option.depart_date,
        option
            .depart_time
            .as_deref()
            .map(|t| format!(" at {}", t))
            .unwrap_or_default(),
        option.price_text.as_deref().unwrap_or("price n/a")
    );
    if let Some(ret) = &option.return_leg {
        text.push_str(&format!(
            "; return {} on {}{}",
            ret.title,
            ret.date,
            ret.price
                .map(|p| format!(" ({:.2})", p))
                .unwrap_or_default()
        ));
    }
    text
}

/// Keep the trip length when the departure moves.
fn shift_return(ret: Option<NaiveDate>, old: NaiveDate, new: NaiveDate) -> Option<NaiveDate> {
    ret.and_then(|r| r.checked_add_signed(new - old))
}

/// Bounded flight-date negotiation between the search service and the traveller.
pub struct FlightNegotiator<'a> {
    search: &'a dyn FlightSearch,
    human: &'a dyn HumanPort,
    max_attempts: u32,
}

impl<'a> FlightNegotiator<'a> {
    pub fn new(search: &'a dyn FlightSearch, human: &'a dyn HumanPort, max_attempts: u32) -> Self {
        Self {
            search,
            human,
            max_attempts: max_attempts.max(1),
        }
    }

    /// Searches up to `max_attempts` times, asking the traveller for a new
    /// date after an empty result. An empty result on the last attempt ends
    /// the search without asking.
    pub async fn negotiate(&self, ctx: &NodeContext, request: &TripRequest) -> FlightOutcome {
        let origin = request.origin.as_deref().unwrap_or("").trim();
        let destination = request.destination.trim();
        if origin.is_empty() || destination.is_empty() {
            ctx.thought("Flight search skipped: origin or destination missing");
            return FlightOutcome::none("Flight search skipped: origin or destination missing");
        }
        let Some(mut depart) = request.depart_date else {
            ctx.thought("Flight search skipped: no departure date");
            return FlightOutcome::none("Flight search skipped: no departure date");
        };
        let mut ret = request.return_date;

        for attempt in 1..=self.max_attempts {
            let last = attempt == self.max_attempts;
            ctx.action(format!(
                "Searching flights {} -> {} on {} (attempt {}/{})",
                origin, destination, depart, attempt, self.max_attempts
            ));

            let offers = match self.search.search(origin, destination, depart, None).await {
                Ok(offers) => offers,
                Err(e) => {
                    ctx.warning(format!("Flight search failed: {}", e));
                    vec![]
                }
            };

            if offers.is_empty() {
                if last {
                    break;
                }
                let question = format!(
                    "No flights found from {} to {} on {}. Change the date? (yes, a new date YYYY-MM-DD, or no)",
                    origin, destination, depart
                );
                match self.ask_change(ctx, &question).await {
                    Some(new) => {
                        ret = shift_return(ret, depart, new);
                        depart = new;
                        continue;
                    }
                    None => {
                        return FlightOutcome::none("No flights found; search closed by the traveller")
                    }
                }
            }

            let mut best = match rank_offers(offers, origin, destination, depart).into_iter().next() {
                Some(best) => best,
                None => break,
            };
            if let Some(ret_date) = ret {
                best.return_leg = self.return_leg(ctx, origin, destination, ret_date).await;
            }

            let question = format!(
                "Proposed flight: {}. Confirm (yes), change date (change or a new date), or anything else to skip",
                describe(&best)
            );
            let answer = match self.human.prompt(&question).await {
                Ok(answer) => answer,
                Err(e) => {
                    ctx.warning(format!("No answer on the flight proposal: {}", e));
                    return FlightOutcome::none("Flight proposal left unanswered");
                }
            };

            if is_yes(&answer) {
                best.status = FlightStatus::Confirmed;
                let confidence = if best.price.is_some() {
                    CONFIRMED_PRICED
                } else {
                    CONFIRMED_UNPRICED
                };
                let summary = format!("Confirmed: {}", describe(&best));
                ctx.thought(summary.clone());
                return FlightOutcome {
                    options: vec![best],
                    summary: Some(summary),
                    confidence,
                };
            }

            if is_change(&answer) || parse_date(&answer).is_some() {
                if last {
                    break;
                }
                let new = match parse_date(&answer) {
                    Some(date) => Some(date),
                    None => self.ask_date(ctx).await,
                };
                match new {
                    Some(new) => {
                        ret = shift_return(ret, depart, new);
                        depart = new;
                        continue;
                    }
                    None => return FlightOutcome::none("Date change abandoned"),
                }
            }

            ctx.thought("Flight selection skipped by the traveller");
            return FlightOutcome {
                options: vec![],
                summary: Some("Flight selection skipped by the traveller".into()),
                confidence: SKIPPED,
            };
        }

        ctx.warning(format!(
            "No flight confirmed after {} attempts",
            self.max_attempts
        ));
        FlightOutcome::none(format!(
            "No flight confirmed after {} attempts",
            self.max_attempts
        ))
    }

    /// "Change the date?" answered with a date, a yes (then ask), or anything else.
    async fn ask_change(&self, ctx: &NodeContext, question: &str) -> Option<NaiveDate> {
        let answer = match self.human.prompt(question).await {
            Ok(answer) => answer,
            Err(e) => {
                ctx.warning(format!("No answer on date change: {}", e));
                return None;
            }
        };
        if let Some(date) = parse_date(&answer) {
            return Some(date);
        }
        if is_yes(&answer) {
            return self.ask_date(ctx).await;
        }
        None
    }

    /// The new date is mandatory: re-ask a few times, then give up.
    async fn ask_date(&self, ctx: &NodeContext) -> Option<NaiveDate> {
        for _ in 0..DATE_PROMPTS {
            match self.human.prompt("New departure date (YYYY-MM-DD)").await {
                Ok(answer) => {
                    if let Some(date) = parse_date(&answer) {
                        return Some(date);
                    }
                    ctx.warning(format!("Not a date: {:?}", answer.trim()));
                }
                Err(e) => {
                    ctx.warning(format!("No answer on new date: {}", e));
                    return None;
                }
            }
        }
        None
    }

    /// One-shot return search; not counted against the attempts.
    async fn return_leg(
        &self,
        ctx: &NodeContext,
        origin: &str,
        destination: &str,
        date: NaiveDate,
    ) -> Option<ReturnLeg> {
        ctx.action(format!(
            "Searching return flights {} -> {} on {}",
            destination, origin, date
        ));
        let offers = match self.search.search(destination, origin, date, None).await {
            Ok(offers) => offers,
            Err(e) => {
                ctx.warning(format!("Return flight search failed: {}", e));
                return None;
            }
        };
        rank_offers(offers, destination, origin, date)
            .into_iter()
            .next()
            .map(|best| ReturnLeg {
                title: best.title,
                date,
                time: best.depart_time,
                price: best.price,
                source: best.source,
            })
    }
}
