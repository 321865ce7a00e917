// Main library file for the trip planner

// Flight offer pipeline
pub mod booking;
pub mod display;
pub mod flight;
pub mod planner;
pub mod ranking;
pub mod serpapi;

// Voice call relay and its chat model
pub mod gemini;
pub mod voice_relay;

pub mod config;
pub mod server;

// Re-export key types for convenience
pub use booking::{booking_link, resolve_booking_token};
pub use config::{ConfigError, PlannerConfig};
pub use display::{format_timestamp, FlightCard};
pub use flight::{AirportStop, BookingToken, FlightLeg, FlightOffer, SearchRequest, SearchResults};
pub use gemini::{ChatError, ChatModel, ChatTurn, GeminiClient, GeminiConfig};
pub use planner::FlightPlanner;
pub use ranking::{rank_offers, MAX_RANKED_OFFERS};
pub use serpapi::{
    fetch_flights, retrieve, FlightSearchApi, SearchError, SearchOutcome, SerpApiClient,
    SerpApiConfig,
};
pub use server::{app, AppState};
pub use voice_relay::{SessionStore, VoiceRelay};
