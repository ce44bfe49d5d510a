use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::editor::{DEFAULT_CONTEXT_RADIUS, DEFAULT_TRIGGER};
use crate::util::{env_non_empty, is_local_endpoint_url, parse_bool_flag};

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 60;
const MIN_TIMEOUT_SECS: u64 = 5;
const MAX_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub api_url: String,
    pub trigger: String,
    pub context_radius: usize,
    /// Answer from the scripted echo collaborator instead of the network.
    pub offline: bool,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            trigger: DEFAULT_TRIGGER.to_string(),
            context_radius: DEFAULT_CONTEXT_RADIUS,
            offline: false,
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let api_key = env_non_empty("GEMINI_API_KEY").or_else(|| env_non_empty("API_KEY"));
        let api_url = env_non_empty("AGENTKEY_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let trigger = std::env::var("AGENTKEY_TRIGGER").unwrap_or_else(|_| DEFAULT_TRIGGER.to_string());

        let context_radius = match env_non_empty("AGENTKEY_CONTEXT_RADIUS") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(radius) => radius,
                Err(_) => bail!("Invalid AGENTKEY_CONTEXT_RADIUS '{raw}': expected a non-negative integer"),
            },
            None => DEFAULT_CONTEXT_RADIUS,
        };

        let offline = env_non_empty("AGENTKEY_OFFLINE")
            .and_then(parse_bool_flag)
            .unwrap_or(false);

        let timeout_secs = match env_non_empty("AGENTKEY_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(secs) => secs.clamp(MIN_TIMEOUT_SECS, MAX_TIMEOUT_SECS),
                Err(_) => bail!("Invalid AGENTKEY_TIMEOUT_SECS '{raw}': expected whole seconds"),
            },
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            api_url,
            trigger,
            context_radius,
            offline,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.trigger.is_empty() || self.trigger.chars().any(char::is_whitespace) {
            bail!(
                "Invalid AGENTKEY_TRIGGER '{}': expected a non-empty sequence without whitespace",
                self.trigger
            );
        }

        if self.offline {
            return Ok(());
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            bail!(
                "Invalid AGENTKEY_API_URL '{}': expected http:// or https:// URL",
                self.api_url
            );
        }

        if !self.is_local_endpoint() && self.api_key.is_none() {
            bail!(
                "GEMINI_API_KEY must be set for non-local endpoints (url: '{}'); set AGENTKEY_OFFLINE=1 to run without one",
                self.api_url
            );
        }

        Ok(())
    }

    pub fn is_local_endpoint(&self) -> bool {
        is_local_endpoint_url(&self.api_url)
    }
}
