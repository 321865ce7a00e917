// Presentation helpers for flight offers

use crate::booking::booking_link;
use crate::flight::{BookingToken, FlightOffer};
use chrono::NaiveDateTime;
use serde::Serialize;

pub const NOT_AVAILABLE: &str = "N/A";
pub const PRICE_NOT_AVAILABLE: &str = "Not Available";

const INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";
const OUTPUT_FORMAT: &str = "%b-%d, %Y | %I:%M %p";

/// Formats `"2025-03-06 18:20"` as `"Mar-06, 2025 | 06:20 PM"`; anything
/// unparsable becomes `"N/A"`.
pub fn format_timestamp(raw: Option<&str>) -> String {
    raw.and_then(|s| NaiveDateTime::parse_from_str(s, INPUT_FORMAT).ok())
        .map(|dt| dt.format(OUTPUT_FORMAT).to_string())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub fn format_duration(minutes: Option<u32>) -> String {
    minutes.map_or_else(|| NOT_AVAILABLE.to_string(), |m| format!("{} min", m))
}

pub fn format_price(price: Option<f64>, currency: &str) -> String {
    price.map_or_else(
        || PRICE_NOT_AVAILABLE.to_string(),
        |amount| format!("{} {}", currency, amount),
    )
}

// Display-ready view of one ranked offer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightCard {
    pub airline: String,
    pub airline_logo: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub duration: String,
    pub price: String,
    pub booking_link: String,
}

impl FlightCard {
    pub fn new(offer: &FlightOffer, currency: &str, token: Option<&BookingToken>) -> Self {
        Self {
            airline: offer.airline_name().to_string(),
            airline_logo: offer.airline_logo.clone().unwrap_or_default(),
            departure_time: format_timestamp(offer.departure().and_then(|a| a.time.as_deref())),
            arrival_time: format_timestamp(offer.arrival().and_then(|a| a.time.as_deref())),
            duration: format_duration(offer.total_duration),
            price: format_price(offer.price, currency),
            booking_link: booking_link(token),
        }
    }
}
