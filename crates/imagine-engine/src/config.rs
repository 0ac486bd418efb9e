use std::env;
use std::time::Duration;

pub const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const AZURE_API_VERSION: &str = "2025-04-01-preview";
/// High-quality gpt-image renders regularly outlast reqwest's 30s default.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 180;
const MIN_REQUEST_TIMEOUT_SECS: u64 = 15;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 600;

/// Vendor base URLs and the per-request timeout. Credentials are never read from here; they
/// are collected per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub openai_api_base: String,
    pub gemini_api_base: String,
    pub request_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            openai_api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            gemini_api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base = |key: &str, default: &str| {
            lookup(key)
                .map(|value| value.trim().trim_end_matches('/').to_string())
                .filter(|value| !value.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        // Unparseable values fall back to the default; out-of-range ones are clamped.
        let timeout_secs = lookup("IMAGINE_REQUEST_TIMEOUT_SECS")
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .clamp(MIN_REQUEST_TIMEOUT_SECS, MAX_REQUEST_TIMEOUT_SECS);
        Self {
            openai_api_base: base("IMAGINE_OPENAI_API_BASE", DEFAULT_OPENAI_API_BASE),
            gemini_api_base: base("IMAGINE_GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE),
            request_timeout: Duration::from_secs(timeout_secs),
        }
    }
}
