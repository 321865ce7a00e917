// Booking-token resolution for a ranked offer
//
// The continuation lookup answers with the offers that complete the selected
// departure. The token is taken from that answer alone: the first offer that
// carries one, whichever position the selected offer had in the caller's list.

use crate::flight::{BookingToken, FlightOffer, SearchRequest, SearchResults};
use crate::serpapi::FlightSearchApi;
use reqwest::Url;
use tracing::{debug, warn};

pub const BOOKING_BASE_URL: &str = "https://www.google.com/travel/flights";
pub const NO_BOOKING_LINK: &str = "#";

fn first_booking_token(results: SearchResults) -> Option<BookingToken> {
    results
        .best_flights
        .into_iter()
        .chain(results.other_flights)
        .filter_map(|offer| offer.booking_token)
        .find(|token| !token.is_empty())
        .map(BookingToken::new)
}

pub async fn resolve_booking_token(
    api: &dyn FlightSearchApi,
    offer: &FlightOffer,
    request: &SearchRequest,
) -> Option<BookingToken> {
    let departure_token = offer.continuation_token()?;

    match api.search(request, Some(departure_token)).await {
        Ok(results) => {
            let token = first_booking_token(results);
            if token.is_none() {
                debug!(departure_token, "Continuation returned no booking token");
            }
            token
        }
        Err(e) => {
            warn!(error = %e, "Error fetching booking token");
            None
        }
    }
}

/// Deep link for a resolved token, or `#` when there is none.
pub fn booking_link(token: Option<&BookingToken>) -> String {
    match token {
        Some(token) => Url::parse_with_params(BOOKING_BASE_URL, &[("tfs", token.as_str())])
            .map(String::from)
            .unwrap_or_else(|_| NO_BOOKING_LINK.to_string()),
        None => NO_BOOKING_LINK.to_string(),
    }
}
