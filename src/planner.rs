// Flight pipeline: retrieve, rank, resolve booking tokens, format

use crate::booking::resolve_booking_token;
use crate::display::FlightCard;
use crate::flight::SearchRequest;
use crate::ranking::rank_offers;
use crate::serpapi::{retrieve, FlightSearchApi};
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct FlightPlanner {
    api: Arc<dyn FlightSearchApi>,
}

impl FlightPlanner {
    pub fn new(api: Arc<dyn FlightSearchApi>) -> Self {
        Self { api }
    }

    // Never fails: every sub-call degrades on its own, so the worst case is an
    // empty list or cards with "#" links.
    pub async fn cheapest_flights(&self, request: &SearchRequest) -> Vec<FlightCard> {
        let outcome = retrieve(self.api.as_ref(), request).await;
        let failed = outcome.is_failure();
        let results = outcome.into_results();
        let ranked = rank_offers(&results);

        // One continuation lookup at a time, in ranked order
        let mut cards = Vec::with_capacity(ranked.len());
        for offer in &ranked {
            let token = resolve_booking_token(self.api.as_ref(), offer, request).await;
            cards.push(FlightCard::new(offer, &request.currency, token.as_ref()));
        }

        info!(
            origin = %request.origin,
            destination = %request.destination,
            offers = cards.len(),
            search_failed = failed,
            "Flight options ready"
        );
        cards
    }
}
