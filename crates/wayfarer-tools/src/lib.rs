pub mod aliases;
pub mod builtin;
pub mod report;

use std::sync::Arc;

use wayfarer_core::config::AppConfig;
use wayfarer_core::traits::{FlightSearch, PlaceLookup, PriceSearch};

pub use aliases::load_aliases;
pub use builtin::{GooglePlacesLookup, TavilySearch, Unavailable};
pub use report::{maps_search_link, FileReportRenderer};

/// Place lookup for the configured provider, or a stand-in answering "not found".
pub fn create_place_lookup(config: &AppConfig) -> Arc<dyn PlaceLookup> {
    match &config.places {
        Some(places) => Arc::new(GooglePlacesLookup::new(places)),
        None => Arc::new(Unavailable::new("places")),
    }
}

/// Price and flight search share one provider.
pub fn create_search(config: &AppConfig) -> (Arc<dyn PriceSearch>, Arc<dyn FlightSearch>) {
    match &config.search {
        Some(search) if search.provider == "tavily" => {
            let tavily = Arc::new(TavilySearch::new(search));
            (tavily.clone() as Arc<dyn PriceSearch>, tavily as Arc<dyn FlightSearch>)
        }
        Some(search) => {
            tracing::warn!(provider = %search.provider, "Unknown search provider, searches disabled");
            let none = Arc::new(Unavailable::new("search"));
            (none.clone() as Arc<dyn PriceSearch>, none as Arc<dyn FlightSearch>)
        }
        None => {
            let none = Arc::new(Unavailable::new("search"));
            (none.clone() as Arc<dyn PriceSearch>, none as Arc<dyn FlightSearch>)
        }
    }
}
