// Process configuration, read once at start-up from the environment

use crate::flight::{DEFAULT_CURRENCY, DEFAULT_LOCALE};
use crate::gemini::{self, GeminiConfig};
use crate::serpapi::{self, SerpApiConfig};
use crate::voice_relay::SYSTEM_PROMPT;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8080;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct PlannerConfig {
    pub port: u16,
    // Public host the telephony provider reaches, e.g. an ngrok domain
    pub public_domain: String,
    pub currency: String,
    pub locale: String,
    pub serpapi: SerpApiConfig,
    pub gemini: GeminiConfig,
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        let serpapi_key = required("SERPAPI_KEY")?;
        let google_api_key = required("GOOGLE_API_KEY")?;
        let public_domain = required("NGROK_URL")?;

        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value,
            })?,
            None => DEFAULT_PORT,
        };

        // Zero would make every outbound call time out immediately
        let timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(value) => match value.parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "HTTP_TIMEOUT_SECS",
                        value,
                    })
                }
            },
            None => None,
        };

        let serpapi = SerpApiConfig {
            base_url: lookup("SERPAPI_BASE_URL")
                .unwrap_or_else(|| serpapi::DEFAULT_BASE_URL.to_string()),
            api_key: serpapi_key,
            timeout,
        };

        let gemini = GeminiConfig {
            base_url: lookup("GEMINI_BASE_URL")
                .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string()),
            model: lookup("GEMINI_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()),
            timeout,
            ..GeminiConfig::new(google_api_key)
        }
        .with_system_instruction(SYSTEM_PROMPT);

        Ok(Self {
            port,
            public_domain,
            currency: lookup("FLIGHT_CURRENCY").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            locale: lookup("FLIGHT_LOCALE").unwrap_or_else(|| DEFAULT_LOCALE.to_string()),
            serpapi,
            gemini,
        })
    }

    pub fn ws_url(&self) -> String {
        format!("wss://{}/ws", self.public_domain)
    }
}
