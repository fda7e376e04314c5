use chrono::NaiveDate;
use futures::future::BoxFuture;
use tracing::warn;

use wayfarer_core::error::Result;
use wayfarer_core::traits::{FlightSearch, PlaceLookup, PriceSearch};
use wayfarer_core::types::{FlightOffer, PlaceCandidate};

/// Stand-in for a collaborator with no configuration section.
///
/// Every call answers "nothing found", which the workflow already handles
/// as a lookup miss.
pub struct Unavailable {
    what: &'static str,
}

impl Unavailable {
    pub fn new(what: &'static str) -> Self {
        Self { what }
    }
}

impl PlaceLookup for Unavailable {
    fn lookup(&self, query: &str) -> BoxFuture<'_, Result<Vec<PlaceCandidate>>> {
        let query = query.to_string();
        Box::pin(async move {
            warn!(service = self.what, query = %query, "Place lookup not configured");
            Ok(vec![])
        })
    }
}

impl PriceSearch for Unavailable {
    fn search_prices(&self, _query: &str) -> BoxFuture<'_, Result<String>> {
        Box::pin(async move {
            warn!(service = self.what, "Price search not configured");
            Ok(String::new())
        })
    }
}

impl FlightSearch for Unavailable {
    fn search(
        &self,
        _origin: &str,
        _destination: &str,
        _depart_date: NaiveDate,
        _return_date: Option<NaiveDate>,
    ) -> BoxFuture<'_, Result<Vec<FlightOffer>>> {
        Box::pin(async move {
            warn!(service = self.what, "Flight search not configured");
            Ok(vec![])
        })
    }
}
