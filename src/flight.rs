// Flight search data model
// Mirrors the shape of the Google Flights results returned by SerpApi

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CURRENCY: &str = "INR";
pub const DEFAULT_LOCALE: &str = "en";

// One user search: built per action, never persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub origin: String,
    pub destination: String,
    pub outbound_date: NaiveDate,
    pub return_date: NaiveDate,
    pub currency: String,
    pub locale: String,
}

impl SearchRequest {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        outbound_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            outbound_date,
            return_date,
            currency: DEFAULT_CURRENCY.to_string(),
            locale: DEFAULT_LOCALE.to_string(),
        }
    }

    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }
}

// Raw search result. Both lists default to empty, so `SearchResults::default()`
// is the "no data" value every failure path degrades to.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchResults {
    pub best_flights: Vec<FlightOffer>,
    pub other_flights: Vec<FlightOffer>,
}

impl SearchResults {
    pub fn is_empty(&self) -> bool {
        self.best_flights.is_empty() && self.other_flights.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlightOffer {
    pub flights: Vec<FlightLeg>,
    pub price: Option<f64>,
    pub total_duration: Option<u32>,
    pub airline_logo: Option<String>,
    #[serde(rename = "type")]
    pub offer_type: Option<String>,
    pub departure_token: Option<String>,
    pub booking_token: Option<String>,
}

impl FlightOffer {
    pub const UNKNOWN_AIRLINE: &'static str = "Unknown Airline";

    /// Airline operating the first leg.
    pub fn airline_name(&self) -> &str {
        self.flights
            .first()
            .and_then(|leg| leg.airline.as_deref())
            .unwrap_or(Self::UNKNOWN_AIRLINE)
    }

    pub fn departure(&self) -> Option<&AirportStop> {
        self.flights.first().map(|leg| &leg.departure_airport)
    }

    pub fn arrival(&self) -> Option<&AirportStop> {
        self.flights.last().map(|leg| &leg.arrival_airport)
    }

    // Continuation token, ignoring the empty string the service sometimes sends
    pub fn continuation_token(&self) -> Option<&str> {
        self.departure_token.as_deref().filter(|t| !t.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FlightLeg {
    pub departure_airport: AirportStop,
    pub arrival_airport: AirportStop,
    pub duration: Option<u32>,
    pub airline: Option<String>,
    pub airline_logo: Option<String>,
    pub flight_number: Option<String>,
    pub travel_class: Option<String>,
    pub airplane: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AirportStop {
    pub id: Option<String>,
    pub name: Option<String>,
    // "YYYY-MM-DD HH:MM" local time
    pub time: Option<String>,
}

// Opaque token that deep-links to a bookable itinerary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingToken(String);

impl BookingToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESULTS: &str = r#"{
        "search_metadata": { "status": "Success" },
        "best_flights": [
            {
                "flights": [
                    {
                        "departure_airport": { "name": "Chhatrapati Shivaji", "id": "BOM", "time": "2025-03-06 18:20" },
                        "arrival_airport": { "name": "Indira Gandhi", "id": "DEL", "time": "2025-03-06 20:35" },
                        "duration": 135,
                        "airline": "IndiGo",
                        "flight_number": "6E 2112",
                        "travel_class": "Economy"
                    },
                    {
                        "departure_airport": { "name": "Indira Gandhi", "id": "DEL", "time": "2025-03-06 22:00" },
                        "arrival_airport": { "name": "Sri Guru Ram Dass Jee", "id": "ATQ", "time": "2025-03-06 23:15" },
                        "duration": 75,
                        "airline": "Air India"
                    }
                ],
                "total_duration": 295,
                "price": 5120,
                "type": "Round trip",
                "airline_logo": "https://www.gstatic.com/flights/airline_logos/70px/6E.png",
                "departure_token": "WyJDalJJ"
            }
        ]
    }"#;

    #[test]
    fn test_deserialize_search_results() {
        let results: SearchResults = serde_json::from_str(SAMPLE_RESULTS).unwrap();
        assert_eq!(results.best_flights.len(), 1);
        assert!(results.other_flights.is_empty());

        let offer = &results.best_flights[0];
        assert_eq!(offer.price, Some(5120.0));
        assert_eq!(offer.total_duration, Some(295));
        assert_eq!(offer.offer_type.as_deref(), Some("Round trip"));
        assert_eq!(offer.continuation_token(), Some("WyJDalJJ"));
        assert_eq!(offer.booking_token, None);
    }

    #[test]
    fn test_offer_endpoints_span_all_legs() {
        let results: SearchResults = serde_json::from_str(SAMPLE_RESULTS).unwrap();
        let offer = &results.best_flights[0];

        assert_eq!(offer.airline_name(), "IndiGo");
        assert_eq!(offer.departure().unwrap().id.as_deref(), Some("BOM"));
        assert_eq!(offer.arrival().unwrap().id.as_deref(), Some("ATQ"));
        assert_eq!(
            offer.arrival().unwrap().time.as_deref(),
            Some("2025-03-06 23:15")
        );
    }

    #[test]
    fn test_offer_without_legs() {
        let offer: FlightOffer = serde_json::from_str(r#"{"price": 100}"#).unwrap();
        assert_eq!(offer.airline_name(), FlightOffer::UNKNOWN_AIRLINE);
        assert!(offer.departure().is_none());
        assert!(offer.arrival().is_none());
    }

    #[test]
    fn test_empty_continuation_token_is_absent() {
        let offer = FlightOffer {
            departure_token: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(offer.continuation_token(), None);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let results: SearchResults = serde_json::from_str("{}").unwrap();
        assert!(results.is_empty());
        assert_eq!(results, SearchResults::default());
    }

    #[test]
    fn test_request_defaults_and_overrides() {
        let out = NaiveDate::from_ymd_opt(2025, 3, 6).unwrap();
        let back = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();

        let request = SearchRequest::new("BOM", "DEL", out, back);
        assert_eq!(request.currency, "INR");
        assert_eq!(request.locale, "en");

        let request = request.with_currency("USD").with_locale("fr");
        assert_eq!(request.currency, "USD");
        assert_eq!(request.locale, "fr");
    }
}
