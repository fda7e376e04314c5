use std::sync::Arc;

use futures::future::BoxFuture;

use wayfarer_core::aliases::DestinationAliases;
use wayfarer_core::error::Result;
use wayfarer_core::state::{StateUpdate, WorkflowState};
use wayfarer_core::traits::PlaceLookup;
use wayfarer_core::trip::{DayPlan, Place, Rating, Verification};
use wayfarer_core::types::PlaceCandidate;

use crate::graph::{Node, NodeContext};

/// Checks every drafted place against the lookup service.
///
/// A match must sit in the destination (or one of its aliases). Misses and
/// lookup failures keep the planner's entry as unverified. Places already
/// verified are left alone.
pub struct FinderNode {
    lookup: Arc<dyn PlaceLookup>,
    aliases: Arc<DestinationAliases>,
}

impl FinderNode {
    pub fn new(lookup: Arc<dyn PlaceLookup>, aliases: Arc<DestinationAliases>) -> Self {
        Self { lookup, aliases }
    }

    async fn verify(&self, ctx: &NodeContext, place: &Place, destination: &str) -> Place {
        let query = format!("{} {}", place.name, destination);
        ctx.action(format!("Looking up {}", query));

        let candidates = match self.lookup.lookup(&query).await {
            Ok(candidates) => candidates,
            Err(e) => {
                ctx.warning(format!("Lookup failed for {}: {}", place.name, e));
                return place.clone();
            }
        };

        match candidates
            .into_iter()
            .find(|c| self.aliases.address_matches(&c.address, destination))
        {
            Some(found) => verified(found, place),
            None => {
                ctx.warning(format!("Not found in {}: {}", destination, place.name));
                place.clone()
            }
        }
    }
}

fn verified(found: PlaceCandidate, drafted: &Place) -> Place {
    Place {
        name: found.name,
        address: found.address,
        rating: found.rating.map(Rating::Score).unwrap_or_default(),
        verification: Verification::Verified {
            place_id: found.id,
        },
        cost: drafted.cost.clone(),
    }
}

impl Node for FinderNode {
    fn name(&self) -> &str {
        super::FINDER
    }

    fn execute<'a>(
        &'a self,
        ctx: &'a NodeContext,
        state: &'a WorkflowState,
    ) -> BoxFuture<'a, Result<StateUpdate>> {
        Box::pin(async move {
            let trip = state.trip()?;
            let mut itinerary = Vec::with_capacity(state.itinerary.len());
            let mut checked = 0usize;

            for day in &state.itinerary {
                let mut places = Vec::with_capacity(day.places.len());
                for place in &day.places {
                    if place.is_verified() {
                        places.push(place.clone());
                    } else {
                        checked += 1;
                        places.push(self.verify(ctx, place, &trip.destination).await);
                    }
                }
                itinerary.push(DayPlan {
                    day_number: day.day_number,
                    focus: day.focus.clone(),
                    places,
                });
            }

            let total: usize = itinerary.iter().map(|d| d.places.len()).sum();
            let confirmed = itinerary
                .iter()
                .flat_map(|d| d.places.iter())
                .filter(|p| p.is_verified())
                .count();
            ctx.thought(format!(
                "{}/{} places verified ({} looked up)",
                confirmed, total, checked
            ));
            Ok(StateUpdate::new().with_itinerary(itinerary))
        })
    }
}
