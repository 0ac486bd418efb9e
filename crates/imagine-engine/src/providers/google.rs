use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use imagine_contracts::errors::GenerationError;
use imagine_contracts::models::ModelTarget;
use reqwest::blocking::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::{response_json_or_error, transport_error, ImageBytes, ImageProvider, RawImageResult};

const PROVIDER: &str = "Google AI";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mime_type: Option<String>,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

pub struct GoogleProvider {
    api_base: String,
    api_key: String,
    http: HttpClient,
    timeout: Duration,
}

impl GoogleProvider {
    pub fn new(api_base: &str, api_key: &str) -> Self {
        Self {
            api_base: api_base.trim().trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: HttpClient::new(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint_for_model(&self, model: &str) -> String {
        let trimmed = model.trim();
        let model_path = if trimmed.starts_with("models/") {
            trimmed.to_string()
        } else {
            format!("models/{trimmed}")
        };
        format!("{}/{}:generateContent", self.api_base, model_path)
    }

    fn request_body(prompt: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: None,
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                    inline_data: None,
                }],
            }],
        }
    }
}

/// First part with non-empty inline data across all candidates, in response order. Later
/// candidates are ignored once one image is found.
fn extract_inline_image(
    response: &GenerateContentResponse,
    model: &str,
) -> Result<ImageBytes, GenerationError> {
    let inline = response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.is_empty())
        .ok_or_else(|| GenerationError::NoImageData {
            provider: PROVIDER.to_string(),
            model: model.to_string(),
        })?;

    let bytes = BASE64
        .decode(inline.data.as_bytes())
        .map_err(|err| GenerationError::InvalidResponse {
            provider: PROVIDER.to_string(),
            message: format!("inline image base64 decode failed: {err}"),
        })?;
    Ok(ImageBytes {
        bytes,
        mime_type: inline.mime_type.clone(),
    })
}

impl ImageProvider for GoogleProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn generate(
        &self,
        target: &ModelTarget,
        prompt: &str,
    ) -> Result<RawImageResult, GenerationError> {
        let endpoint = self.endpoint_for_model(&target.deployment);
        let response = self
            .http
            .post(&endpoint)
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(prompt))
            .send()
            .map_err(|err| transport_error(PROVIDER, &err))?;
        let response_payload = response_json_or_error(PROVIDER, response)?;
        let parsed: GenerateContentResponse = serde_json::from_value(response_payload)
            .map_err(|err| GenerationError::InvalidResponse {
                provider: PROVIDER.to_string(),
                message: format!("unexpected generateContent shape: {err}"),
            })?;
        extract_inline_image(&parsed, &target.deployment).map(RawImageResult::Bytes)
    }
}
