//! Environment configuration.
//!
//! All external endpoints and credentials come from the environment (a
//! `.env` file is honored via `dotenv` in `main`). Loaded once into a typed
//! struct and passed down explicitly.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Process configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the ChatBI analytics backend (`CHATBI_DOMAIN`).
    pub chatbi_domain: String,
    /// Optional bearer token for ChatBI (`CHATBI_TOKEN`).
    pub chatbi_token: Option<String>,
    /// API keys per model provider.
    pub deepseek_api_key: Option<String>,
    pub alibaba_api_key: Option<String>,
    pub moonshot_api_key: Option<String>,
    /// Base URL of the chart export service (`CHART_RENDERER_URL`).
    pub chart_renderer_url: Option<String>,
    /// Base directory for per-session report folders (`REPORTS_DIR`).
    pub reports_dir: PathBuf,
}

impl Config {
    /// Load configuration from the environment. Only the ChatBI domain is
    /// required; everything else is checked at the point of use.
    pub fn from_env() -> Result<Self> {
        let chatbi_domain =
            env::var("CHATBI_DOMAIN").context("CHATBI_DOMAIN must be set to the backend URL")?;
        Ok(Self {
            chatbi_domain,
            chatbi_token: env::var("CHATBI_TOKEN").ok(),
            deepseek_api_key: env::var("DEEPSEEK_API_KEY").ok(),
            alibaba_api_key: env::var("ALIBABA_API_KEY").ok(),
            moonshot_api_key: env::var("MOONSHOT_API_KEY").ok(),
            chart_renderer_url: env::var("CHART_RENDERER_URL").ok(),
            reports_dir: env::var("REPORTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("reports")),
        })
    }
}
