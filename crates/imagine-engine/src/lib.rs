use imagine_contracts::errors::GenerationError;
use imagine_contracts::models::ModelTarget;
use reqwest::blocking::Response as HttpResponse;
use serde_json::Value;

pub mod acquire;
pub mod artifacts;
pub mod config;
pub mod providers;
pub mod session;

pub use acquire::{HttpImageFetcher, ImageAcquirer, ImageFetcher};
pub use artifacts::{artifact_file_name, ArtifactWriter, DirectoryArtifactWriter};
pub use config::EngineConfig;
pub use providers::{build_provider, ProviderSettings};
pub use session::{RunReport, Session, SessionError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBytes {
    pub bytes: Vec<u8>,
    pub mime_type: Option<String>,
}

/// What a provider hands back before any download happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawImageResult {
    Url(String),
    Bytes(ImageBytes),
    Empty,
}

pub trait ImageProvider: Send + Sync {
    fn name(&self) -> &str;
    fn generate(&self, target: &ModelTarget, prompt: &str)
        -> Result<RawImageResult, GenerationError>;
}

const ERROR_BODY_MAX_CHARS: usize = 512;

fn response_json_or_error(
    provider: &str,
    response: HttpResponse,
) -> Result<Value, GenerationError> {
    let status = response.status();
    let body = response.text().map_err(|err| GenerationError::Transport {
        provider: provider.to_string(),
        message: format!("response body read failed: {}", error_chain_text(&err)),
    })?;
    if !status.is_success() {
        return Err(GenerationError::Http {
            provider: provider.to_string(),
            status: status.as_u16(),
            message: error_body_message(&body),
        });
    }
    serde_json::from_str(&body).map_err(|err| GenerationError::InvalidResponse {
        provider: provider.to_string(),
        message: format!("invalid JSON payload: {err}"),
    })
}

/// Prefers the vendor's `error.message` over the raw body.
fn error_body_message(body: &str) -> String {
    let vendor_message = serde_json::from_str::<Value>(body).ok().and_then(|parsed| {
        parsed
            .get("error")
            .and_then(|error| error.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
    });
    match vendor_message {
        Some(message) if !message.trim().is_empty() => {
            truncate_text(message.trim(), ERROR_BODY_MAX_CHARS)
        }
        _ => truncate_text(body.trim(), ERROR_BODY_MAX_CHARS),
    }
}

fn transport_error(provider: &str, err: &reqwest::Error) -> GenerationError {
    GenerationError::Transport {
        provider: provider.to_string(),
        message: error_chain_text(err),
    }
}

fn error_chain_text(err: &(dyn std::error::Error + 'static)) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut current = Some(err);
    while let Some(cause) = current {
        let text = cause.to_string();
        let trimmed = text.trim();
        if !trimmed.is_empty() && parts.last().map(|last| last != trimmed).unwrap_or(true) {
            parts.push(trimmed.to_string());
        }
        current = cause.source();
    }
    truncate_text(&parts.join(" | caused by: "), ERROR_BODY_MAX_CHARS)
}

fn truncate_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }
    value.chars().take(max_chars).collect::<String>() + "…"
}
