use std::time::Duration;

use imagine_contracts::errors::GenerationError;
use imagine_contracts::models::ModelTarget;
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;

use super::{images_payload, raw_result_from_images_response, target_options};
use crate::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use crate::{response_json_or_error, transport_error, ImageProvider, RawImageResult};

const PROVIDER: &str = "OpenAI";

pub struct OpenAiProvider {
    api_base: String,
    api_key: String,
    http: HttpClient,
    timeout: Duration,
}

impl OpenAiProvider {
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
}

impl ImageProvider for OpenAiProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn generate(
        &self,
        target: &ModelTarget,
        prompt: &str,
    ) -> Result<RawImageResult, GenerationError> {
        let options = target_options(PROVIDER, target)?;
        let endpoint = format!("{}/images/generations", self.api_base);
        let payload = images_payload(Some(&target.deployment), prompt, &options);

        let response = self
            .http
            .post(&endpoint)
            .timeout(self.timeout)
            .bearer_auth(&self.api_key)
            .json(&Value::Object(payload))
            .send()
            .map_err(|err| transport_error(PROVIDER, &err))?;
        let response_payload = response_json_or_error(PROVIDER, response)?;
        raw_result_from_images_response(PROVIDER, &response_payload)
    }
}

#[cfg(test)]
mod tests {
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use httpmock::prelude::*;
    use imagine_contracts::errors::{classify, ErrorCategory};
    use imagine_contracts::models::ModelOptionsCatalog;
    use imagine_contracts::providers::{select_menu_targets, Provider};
    use serde_json::json;

    use super::*;
    use crate::ImageBytes;

    fn target(model: &str) -> ModelTarget {
        let (targets, _) = select_menu_targets(
            Provider::OpenAi,
            &[model.to_string()],
            &ModelOptionsCatalog::new(),
        );
        targets.get(model).cloned().unwrap()
    }

    #[test]
    fn gpt_image_request_leaves_defaults_to_openai() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/images/generations")
                .header("authorization", "Bearer sk-test-0123456789")
                .json_body(json!({
                    "model": "gpt-image-1",
                    "prompt": "paper boat",
                    "n": 1,
                    "size": "1536x1024",
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({"created": 1, "data": [{"b64_json": BASE64.encode(b"boat")}]}));
        });

        let provider = OpenAiProvider::new(&server.url("/v1"), "sk-test-0123456789");
        let result = provider.generate(&target("gpt-image-1"), "paper boat").unwrap();
        mock.assert();
        assert_eq!(
            result,
            RawImageResult::Bytes(ImageBytes {
                bytes: b"boat".to_vec(),
                mime_type: None,
            })
        );
    }

    #[test]
    fn rate_limit_surfaces_status_429() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/images/generations");
            then.status(429)
                .header("content-type", "application/json")
                .body(r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#);
        });

        let provider = OpenAiProvider::new(&server.url("/v1"), "sk-test-0123456789");
        let err = provider
            .generate(&target("dall-e-3"), "paper boat")
            .unwrap_err();
        assert_eq!(err.status(), Some(429));
        assert_eq!(classify(&err).category, ErrorCategory::RateLimited);
    }

    #[test]
    fn unreachable_host_is_a_transport_error() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let provider = OpenAiProvider::new(&format!("http://{addr}/v1"), "sk-test-0123456789");
        let err = provider
            .generate(&target("dall-e-3"), "paper boat")
            .unwrap_err();
        assert!(matches!(err, GenerationError::Transport { .. }));
        assert_eq!(classify(&err).category, ErrorCategory::Other);
    }

    #[test]
    fn non_json_success_body_is_an_invalid_response() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/images/generations");
            then.status(200).body("<html>proxy</html>");
        });

        let provider = OpenAiProvider::new(&server.url("/v1"), "sk-test-0123456789");
        let err = provider
            .generate(&target("gpt-image-1-mini"), "paper boat")
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidResponse { .. }));
    }

    #[test]
    fn slow_renders_are_bounded_by_the_request_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/images/generations");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(json!({"created": 1, "data": [{"b64_json": BASE64.encode(b"late")}]}));
        });

        let provider = OpenAiProvider::new(&server.url("/v1"), "sk-test-0123456789")
            .with_timeout(Duration::from_millis(300));
        let err = provider
            .generate(&target("gpt-image-1"), "paper boat")
            .unwrap_err();
        assert!(matches!(err, GenerationError::Transport { .. }));
    }

    #[test]
    fn default_timeout_outlasts_a_thirty_second_render() {
        let provider = OpenAiProvider::new("https://api.openai.com/v1", "sk-test-0123456789");
        assert!(provider.timeout > Duration::from_secs(30));
        assert_eq!(
            provider.timeout,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)
        );
    }
}
