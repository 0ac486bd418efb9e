use anyhow::{bail, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use imagine_contracts::errors::GenerationError;
use imagine_contracts::models::{ModelOptions, ModelTarget};
use imagine_contracts::providers::Provider;
use serde_json::{json, Map, Value};

use crate::config::EngineConfig;
use crate::{ImageBytes, ImageProvider, RawImageResult};

mod azure;
mod google;
mod openai;

pub use azure::AzureProvider;
pub use google::GoogleProvider;
pub use openai::OpenAiProvider;

/// Validated credentials for one session.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub provider: Provider,
    pub api_key: String,
    pub endpoint: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

pub fn build_provider(
    settings: &ProviderSettings,
    config: &EngineConfig,
) -> Result<Box<dyn ImageProvider>> {
    let provider: Box<dyn ImageProvider> = match settings.provider {
        Provider::AzureOpenAi => {
            let Some(endpoint) = settings.endpoint.as_deref() else {
                bail!("Azure OpenAI requires an endpoint");
            };
            Box::new(
                AzureProvider::new(endpoint, &settings.api_key)
                    .with_timeout(config.request_timeout),
            )
        }
        Provider::OpenAi => Box::new(
            OpenAiProvider::new(&config.openai_api_base, &settings.api_key)
                .with_timeout(config.request_timeout),
        ),
        Provider::GoogleAi => Box::new(
            GoogleProvider::new(&config.gemini_api_base, &settings.api_key)
                .with_timeout(config.request_timeout),
        ),
    };
    Ok(provider)
}

fn target_options(provider: &str, target: &ModelTarget) -> Result<ModelOptions, GenerationError> {
    target.options.ok_or_else(|| {
        GenerationError::Other(format!(
            "{provider}: no generation options for model type '{}'",
            target.model_type
        ))
    })
}

/// Shared `images/generations` body for Azure and OpenAI. Azure addresses the model through
/// the deployment path and gets no `model` field.
fn images_payload(model: Option<&str>, prompt: &str, options: &ModelOptions) -> Map<String, Value> {
    let mut payload = Map::new();
    if let Some(model) = model {
        payload.insert("model".to_string(), Value::String(model.to_string()));
    }
    payload.insert("prompt".to_string(), Value::String(prompt.to_string()));
    payload.insert("n".to_string(), json!(1));
    payload.insert(
        "size".to_string(),
        Value::String(options.size.as_str().to_string()),
    );
    if let Some(quality) = options.quality.wire_value() {
        payload.insert("quality".to_string(), Value::String(quality.to_string()));
    }
    if let Some(style) = options.style {
        payload.insert(
            "style".to_string(),
            Value::String(style.wire_value().to_string()),
        );
    }
    if let Some(format) = options.response_format {
        payload.insert(
            "response_format".to_string(),
            Value::String(format.wire_value().to_string()),
        );
    }
    payload
}

/// Reads `data[0]`: a URL wins over inline base64; neither is `Empty`.
fn raw_result_from_images_response(
    provider: &str,
    response_payload: &Value,
) -> Result<RawImageResult, GenerationError> {
    let Some(first) = response_payload
        .get("data")
        .and_then(Value::as_array)
        .and_then(|rows| rows.first())
    else {
        return Ok(RawImageResult::Empty);
    };

    if let Some(url) = first
        .get("url")
        .and_then(Value::as_str)
        .filter(|url| !url.trim().is_empty())
    {
        return Ok(RawImageResult::Url(url.trim().to_string()));
    }

    if let Some(b64) = first
        .get("b64_json")
        .and_then(Value::as_str)
        .filter(|b64| !b64.is_empty())
    {
        let bytes = BASE64
            .decode(b64.as_bytes())
            .map_err(|err| GenerationError::InvalidResponse {
                provider: provider.to_string(),
                message: format!("image base64 decode failed: {err}"),
            })?;
        return Ok(RawImageResult::Bytes(ImageBytes {
            bytes,
            mime_type: None,
        }));
    }

    Ok(RawImageResult::Empty)
}

#[cfg(test)]
mod tests {
    use imagine_contracts::models::{ModelOptionsCatalog, VendorContext};

    use super::*;

    #[test]
    fn dalle_payload_carries_every_option() {
        let options = ModelOptionsCatalog::new()
            .resolve("dall-e-3", VendorContext::OpenAi)
            .unwrap();
        let payload = images_payload(Some("dall-e-3"), "a red fox", &options);
        assert_eq!(
            Value::Object(payload),
            json!({
                "model": "dall-e-3",
                "prompt": "a red fox",
                "n": 1,
                "size": "1792x1024",
                "quality": "standard",
                "style": "vivid",
                "response_format": "url",
            })
        );
    }

    #[test]
    fn default_fields_are_left_out() {
        let options = ModelOptionsCatalog::new()
            .resolve("gpt-image-1.5", VendorContext::OpenAi)
            .unwrap();
        let payload = images_payload(Some("gpt-image-1.5"), "a red fox", &options);
        assert!(!payload.contains_key("quality"));
        assert!(!payload.contains_key("style"));
        assert!(!payload.contains_key("response_format"));

        let azure = ModelOptionsCatalog::new()
            .resolve("gpt-image-1", VendorContext::Azure)
            .unwrap();
        let payload = images_payload(None, "a red fox", &azure);
        assert!(!payload.contains_key("model"));
        assert_eq!(payload["quality"], json!("high"));
        assert_eq!(payload["response_format"], json!("b64_json"));
    }

    #[test]
    fn images_response_shapes_map_to_raw_results() {
        let url = json!({"data": [{"url": "https://cdn.example/img.png"}]});
        assert_eq!(
            raw_result_from_images_response("OpenAI", &url).unwrap(),
            RawImageResult::Url("https://cdn.example/img.png".to_string())
        );

        let inline = json!({"data": [{"b64_json": BASE64.encode(b"png-bytes")}]});
        assert_eq!(
            raw_result_from_images_response("OpenAI", &inline).unwrap(),
            RawImageResult::Bytes(ImageBytes {
                bytes: b"png-bytes".to_vec(),
                mime_type: None,
            })
        );

        for empty in [json!({}), json!({"data": []}), json!({"data": [{"revised_prompt": "x"}]})] {
            assert_eq!(
                raw_result_from_images_response("OpenAI", &empty).unwrap(),
                RawImageResult::Empty
            );
        }
    }

    #[test]
    fn malformed_inline_base64_is_an_invalid_response() {
        let payload = json!({"data": [{"b64_json": "%%% not base64 %%%"}]});
        let err = raw_result_from_images_response("Azure OpenAI", &payload).unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse { .. }));
    }

    #[test]
    fn azure_provider_needs_an_endpoint() {
        let settings = ProviderSettings {
            provider: Provider::AzureOpenAi,
            api_key: "0123456789abcdef".to_string(),
            endpoint: None,
        };
        assert!(build_provider(&settings, &EngineConfig::default()).is_err());

        let settings = ProviderSettings {
            endpoint: Some("https://res.openai.azure.com".to_string()),
            ..settings
        };
        let provider = build_provider(&settings, &EngineConfig::default()).unwrap();
        assert_eq!(provider.name(), "Azure OpenAI");
    }

    #[test]
    fn settings_debug_output_hides_the_key() {
        let settings = ProviderSettings {
            provider: Provider::OpenAi,
            api_key: "sk-secret-value".to_string(),
            endpoint: None,
        };
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("sk-secret-value"));
        assert!(rendered.contains("<redacted>"));
    }
}
