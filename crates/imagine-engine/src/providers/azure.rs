use std::time::Duration;

use imagine_contracts::errors::GenerationError;
use imagine_contracts::models::ModelTarget;
use reqwest::blocking::Client as HttpClient;
use serde_json::Value;

use super::{images_payload, raw_result_from_images_response, target_options};
use crate::config::{AZURE_API_VERSION, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::{response_json_or_error, transport_error, ImageProvider, RawImageResult};

const PROVIDER: &str = "Azure OpenAI";

pub struct AzureProvider {
    endpoint: String,
    api_key: String,
    http: HttpClient,
    timeout: Duration,
}

impl AzureProvider {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.trim().trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            http: HttpClient::new(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint_for_deployment(&self, deployment: &str) -> String {
        format!(
            "{}/openai/deployments/{}/images/generations",
            self.endpoint,
            deployment.trim()
        )
    }
}

impl ImageProvider for AzureProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn generate(
        &self,
        target: &ModelTarget,
        prompt: &str,
    ) -> Result<RawImageResult, GenerationError> {
        let options = target_options(PROVIDER, target)?;
        let endpoint = self.endpoint_for_deployment(&target.deployment);
        let payload = images_payload(None, prompt, &options);

        let response = self
            .http
            .post(&endpoint)
            .timeout(self.timeout)
            .query(&[("api-version", AZURE_API_VERSION)])
            .header("api-key", &self.api_key)
            .json(&Value::Object(payload))
            .send()
            .map_err(|err| transport_error(PROVIDER, &err))?;
        let response_payload = response_json_or_error(PROVIDER, response)?;
        raw_result_from_images_response(PROVIDER, &response_payload)
    }
}
