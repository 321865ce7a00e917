// Flight offer retrieval against the SerpApi Google Flights engine
// One request per search, no retries: failures degrade to an empty result

use crate::flight::{SearchRequest, SearchResults};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const ENGINE: &str = "google_flights";
pub const DEFAULT_BASE_URL: &str = "https://serpapi.com";

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error: {status_code} - {message}")]
    Api { status_code: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SearchError::Decode(err.to_string())
        } else {
            SearchError::Network(err.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct SerpApiConfig {
    pub base_url: String,
    pub api_key: String,
    // None keeps the request open until the service answers
    pub timeout: Option<Duration>,
}

impl SerpApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout: None,
        }
    }
}

// Flight search service seam. `departure_token` turns a search into the
// continuation lookup used for booking tokens.
#[async_trait]
pub trait FlightSearchApi: Send + Sync + 'static {
    async fn search(
        &self,
        request: &SearchRequest,
        departure_token: Option<&str>,
    ) -> Result<SearchResults, SearchError>;
}

pub struct SerpApiClient {
    config: SerpApiConfig,
    http: reqwest::Client,
}

// SerpApi reports some failures in a 200 body
#[derive(Debug, Deserialize)]
struct SerpApiEnvelope {
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    results: SearchResults,
}

impl SerpApiClient {
    pub fn new(config: SerpApiConfig) -> Result<Self, SearchError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;
        Ok(Self { config, http })
    }

    fn search_url(&self) -> String {
        format!("{}/search.json", self.config.base_url.trim_end_matches('/'))
    }

    pub fn query_params(
        &self,
        request: &SearchRequest,
        departure_token: Option<&str>,
    ) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("engine", ENGINE.to_string()),
            ("departure_id", request.origin.clone()),
            ("arrival_id", request.destination.clone()),
            ("outbound_date", request.outbound_date.to_string()),
            ("return_date", request.return_date.to_string()),
            ("currency", request.currency.clone()),
            ("hl", request.locale.clone()),
            ("api_key", self.config.api_key.clone()),
        ];
        if let Some(token) = departure_token {
            params.push(("departure_token", token.to_string()));
        }
        params
    }
}

#[async_trait]
impl FlightSearchApi for SerpApiClient {
    async fn search(
        &self,
        request: &SearchRequest,
        departure_token: Option<&str>,
    ) -> Result<SearchResults, SearchError> {
        debug!(
            origin = %request.origin,
            destination = %request.destination,
            continuation = departure_token.is_some(),
            "Querying flight search"
        );

        let response = self
            .http
            .get(self.search_url())
            .query(&self.query_params(request, departure_token))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SearchError::Api {
                status_code: status.as_u16(),
                message: body,
            });
        }

        let envelope: SerpApiEnvelope =
            serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))?;
        if let Some(message) = envelope.error {
            return Err(SearchError::Api {
                status_code: status.as_u16(),
                message,
            });
        }

        Ok(envelope.results)
    }
}

// Outcome of a retrieval, keeping "nothing found" apart from "call failed"
#[derive(Debug)]
pub enum SearchOutcome {
    Offers(SearchResults),
    NoData,
    Failed(SearchError),
}

impl SearchOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, SearchOutcome::Failed(_))
    }

    // Both NoData and Failed render the same way downstream
    pub fn into_results(self) -> SearchResults {
        match self {
            SearchOutcome::Offers(results) => results,
            SearchOutcome::NoData | SearchOutcome::Failed(_) => SearchResults::default(),
        }
    }
}

pub async fn retrieve(api: &dyn FlightSearchApi, request: &SearchRequest) -> SearchOutcome {
    match api.search(request, None).await {
        Ok(results) if results.is_empty() => {
            debug!(origin = %request.origin, destination = %request.destination, "No offers returned");
            SearchOutcome::NoData
        }
        Ok(results) => SearchOutcome::Offers(results),
        Err(e) => {
            warn!(
                origin = %request.origin,
                destination = %request.destination,
                error = %e,
                "Error fetching flights"
            );
            SearchOutcome::Failed(e)
        }
    }
}

pub async fn fetch_flights(api: &dyn FlightSearchApi, request: &SearchRequest) -> SearchResults {
    retrieve(api, request).await.into_results()
}
