use std::collections::BTreeSet;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Below this daily budget the confidence evaluator applies its budget penalty.
pub const LOW_BUDGET_PER_DAY: f64 = 60.0;

/// Trip parameters collected at Init. Immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TripRequest {
    pub destination: String,
    /// Trip length in days, always >= 1.
    pub days: u32,
    #[serde(default)]
    pub interests: String,
    pub budget: BudgetDescriptor,
    #[serde(default = "default_companion")]
    pub companion: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub depart_date: Option<NaiveDate>,
    #[serde(default)]
    pub return_date: Option<NaiveDate>,
}

fn default_companion() -> String {
    "Solo".to_string()
}

impl TripRequest {
    pub fn new(destination: impl Into<String>, days: u32) -> Self {
        Self {
            destination: destination.into(),
            days: days.max(1),
            interests: String::new(),
            budget: BudgetDescriptor::Tier(BudgetTier::Medium),
            companion: default_companion(),
            origin: None,
            depart_date: None,
            return_date: None,
        }
    }

    pub fn with_interests(mut self, interests: impl Into<String>) -> Self {
        self.interests = interests.into();
        self
    }

    pub fn with_budget(mut self, budget: BudgetDescriptor) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_companion(mut self, companion: impl Into<String>) -> Self {
        self.companion = companion.into();
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_dates(mut self, depart: Option<NaiveDate>, ret: Option<NaiveDate>) -> Self {
        self.depart_date = depart;
        self.return_date = ret;
        self
    }

    /// One-line summary used in prompts and logs.
    pub fn summary(&self) -> String {
        format!(
            "{} days in {}, interests: {}. Budget: {}, group: {}",
            self.days,
            self.destination,
            if self.interests.is_empty() { "none given" } else { &self.interests },
            self.budget,
            self.companion
        )
    }

    /// Estimated spend per day, if the budget says anything about it.
    pub fn daily_budget(&self) -> Option<f64> {
        self.budget.daily_budget(self.days)
    }
}

/// Budget as given by the traveller: a total amount or a qualitative tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum BudgetDescriptor {
    Total(f64),
    Tier(BudgetTier),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTier {
    Low,
    Medium,
    Luxury,
    Unspecified,
}

impl BudgetTier {
    fn nominal_per_day(self) -> Option<f64> {
        match self {
            Self::Low => Some(50.0),
            Self::Medium => Some(150.0),
            Self::Luxury => Some(400.0),
            Self::Unspecified => None,
        }
    }
}

fn amount_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d+(?:\.\d+)?)\s*(k|mila|milion[ei]?|millions?|m)?\b")
            .expect("budget amount pattern is valid")
    })
}

impl BudgetDescriptor {
    /// Parse free budget text.
    ///
    /// The first number wins; `k`/`mila` multiply by a thousand and
    /// `m`/`milione`/`million` by a million. Text without a number is
    /// matched against tier words.
    pub fn parse(text: &str) -> Self {
        let clean = text.to_lowercase().replace(',', "");
        let clean = clean.trim();

        if let Some(caps) = amount_regex().captures(clean) {
            if let Ok(number) = caps[1].parse::<f64>() {
                let multiplier = match caps.get(2).map(|m| m.as_str()) {
                    Some("k") | Some("mila") => 1_000.0,
                    Some(_) => 1_000_000.0,
                    None => 1.0,
                };
                return Self::Total(number * multiplier);
            }
        }

        let tier = if ["low", "basso", "economic", "cheap"]
            .iter()
            .any(|w| clean.contains(w))
        {
            BudgetTier::Low
        } else if ["lusso", "luxury", "high"].iter().any(|w| clean.contains(w)) {
            BudgetTier::Luxury
        } else if ["medi", "mid", "moderate", "standard"]
            .iter()
            .any(|w| clean.contains(w))
        {
            BudgetTier::Medium
        } else {
            BudgetTier::Unspecified
        };
        Self::Tier(tier)
    }

    /// Total budget if known, spread over `days` (at least one day).
    pub fn daily_budget(&self, days: u32) -> Option<f64> {
        match self {
            Self::Total(total) => Some(total / f64::from(days.max(1))),
            Self::Tier(tier) => tier.nominal_per_day(),
        }
    }
}

impl std::fmt::Display for BudgetDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Total(total) => write!(f, "{:.0} total", total),
            Self::Tier(BudgetTier::Low) => write!(f, "Low"),
            Self::Tier(BudgetTier::Medium) => write!(f, "Medium"),
            Self::Tier(BudgetTier::Luxury) => write!(f, "Luxury"),
            Self::Tier(BudgetTier::Unspecified) => write!(f, "Unspecified"),
        }
    }
}

/// Travel style derived by the router stage.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TravelStyle {
    #[default]
    Relax,
    Adventure,
    Cultural,
    Gastronomic,
    Luxury,
    LowCost,
}

impl TravelStyle {
    /// Lenient parse of a style label. Unknown labels fall back to `Relax`.
    pub fn from_label(label: &str) -> Self {
        let upper = label.trim().to_uppercase().replace(['_', '-'], " ");
        if upper.contains("LOW COST") || upper.contains("LOWCOST") || upper.contains("BUDGET") {
            Self::LowCost
        } else if upper.contains("ADVENT") || upper.contains("AVVENTURA") {
            Self::Adventure
        } else if upper.contains("CULTUR") {
            Self::Cultural
        } else if upper.contains("GASTRO") || upper.contains("FOOD") {
            Self::Gastronomic
        } else if upper.contains("LUSSO") || upper.contains("LUXURY") {
            Self::Luxury
        } else {
            Self::Relax
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Relax => "RELAX",
            Self::Adventure => "ADVENTURE",
            Self::Cultural => "CULTURAL",
            Self::Gastronomic => "GASTRONOMIC",
            Self::Luxury => "LUXURY",
            Self::LowCost => "LOW COST",
        }
    }
}

/// Place rating as reported by the lookup service.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Rating {
    Score(f32),
    #[default]
    Unknown,
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Score(score) => write!(f, "{:.1}", score),
            Self::Unknown => write!(f, "N/A"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    /// Confirmed by the place-lookup collaborator.
    Verified { place_id: String },
    /// No lookup match; the planner's own entry was kept.
    #[default]
    Unverified,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub verification: Verification,
    #[serde(default)]
    pub cost: Option<String>,
}

impl Place {
    /// An entry straight from the planner, not yet looked up.
    pub fn unverified(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            rating: Rating::Unknown,
            verification: Verification::Unverified,
            cost: None,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.verification, Verification::Verified { .. })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayPlan {
    /// 1-based, contiguous across the itinerary.
    pub day_number: u32,
    pub focus: String,
    #[serde(default)]
    pub places: Vec<Place>,
}

/// Every place name mentioned in an itinerary.
pub fn place_names(itinerary: &[DayPlan]) -> BTreeSet<String> {
    itinerary
        .iter()
        .flat_map(|day| day.places.iter())
        .map(|p| p.name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FlightStatus {
    #[default]
    Proposed,
    Confirmed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReturnLeg {
    pub title: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlightOption {
    pub title: String,
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub price_text: Option<String>,
    pub origin: String,
    pub destination: String,
    pub depart_date: NaiveDate,
    #[serde(default)]
    pub depart_time: Option<String>,
    #[serde(default)]
    pub return_leg: Option<ReturnLeg>,
    #[serde(default)]
    pub status: FlightStatus,
}
