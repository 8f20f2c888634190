//! Editor configuration.
//!
//! The library never reads the environment on its own. Binaries call
//! [`EditorConfig::from_env`] and hand the result to
//! [`GeminiEditor::from_config`](crate::GeminiEditor::from_config).

use crate::image::providers::GeminiModel;
use std::env;
use std::time::Duration;

/// Environment variables checked for the API key, in order.
pub const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY", "API_KEY"];

/// Resolved editor settings.
#[derive(Debug, Clone)]
pub struct EditorConfig {
    /// Gemini API key. `None` makes every edit fail with a configuration error.
    pub api_key: Option<String>,
    /// Model variant.
    pub model: GeminiModel,
    /// API base URL.
    pub base_url: String,
    /// Caller-side deadline for a single edit.
    pub timeout: Option<Duration>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: GeminiModel::default(),
            base_url: crate::image::providers::DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl EditorConfig {
    /// Creates a config with defaults and no API key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from the process environment.
    ///
    /// Unparseable `GENEDIT_MODEL` or `GENEDIT_TIMEOUT_SECS` values are logged
    /// and ignored.
    pub fn from_env() -> Self {
        let api_key = API_KEY_ENV_VARS
            .iter()
            .filter_map(|var| env::var(var).ok())
            .find(|value| !value.trim().is_empty());

        let model = match env::var("GENEDIT_MODEL") {
            Ok(value) => value.parse().unwrap_or_else(|e| {
                tracing::warn!("ignoring GENEDIT_MODEL: {e}");
                GeminiModel::default()
            }),
            Err(_) => GeminiModel::default(),
        };

        let base_url = env::var("GENEDIT_BASE_URL")
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| crate::image::providers::DEFAULT_BASE_URL.to_string());

        let timeout = env::var("GENEDIT_TIMEOUT_SECS").ok().and_then(|value| {
            match value.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Some(Duration::from_secs(secs)),
                _ => {
                    tracing::warn!(value = %value, "ignoring invalid GENEDIT_TIMEOUT_SECS");
                    None
                }
            }
        });

        Self {
            api_key,
            model,
            base_url,
            timeout,
        }
    }

    /// Sets the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the model variant.
    pub fn with_model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    /// Sets the per-edit timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
