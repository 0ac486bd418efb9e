//! Interactive session: provider choice, credentials, targets, prompt, then one sequential pass
//! over the targets.
//!
//! Only an empty target set ends the session early. Every failure after that is caught at the
//! target boundary, classified, reported and folded into the outcome log.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use imagine_contracts::errors::{classify, ConfigurationError, GenerationError};
use imagine_contracts::events::{EventKind, EventPayload, EventWriter};
use imagine_contracts::interaction::InteractionSurface;
use imagine_contracts::models::{parse_deployments, ModelOptionsCatalog, ModelTarget, ModelTargets};
use imagine_contracts::providers::{select_menu_targets, Provider};
use imagine_contracts::runs::{RunSummary, TargetOutcome};
use imagine_contracts::validation::{DALLE_PROMPT_MAX_CHARS, MIN_API_KEY_CHARS};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::acquire::ImageAcquirer;
use crate::artifacts::ArtifactWriter;
use crate::providers::ProviderSettings;
use crate::{ImageProvider, RawImageResult};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("{0:#}")]
    Interaction(#[from] anyhow::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub provider: Provider,
    pub outcomes: Vec<TargetOutcome>,
    pub summary: RunSummary,
}

struct Generated {
    path: PathBuf,
    elapsed: Duration,
    mime_type: Option<String>,
}

pub struct Session<'a> {
    surface: &'a mut dyn InteractionSurface,
    events: EventWriter,
    catalog: ModelOptionsCatalog,
    acquirer: ImageAcquirer,
    writer: Box<dyn ArtifactWriter>,
}

impl<'a> Session<'a> {
    pub fn new(
        surface: &'a mut dyn InteractionSurface,
        events: EventWriter,
        acquirer: ImageAcquirer,
        writer: Box<dyn ArtifactWriter>,
    ) -> Self {
        Self {
            surface,
            events,
            catalog: ModelOptionsCatalog::new(),
            acquirer,
            writer,
        }
    }

    /// Runs the whole session. `build_provider` is called once, after credentials and targets
    /// are settled.
    pub fn run<F>(&mut self, build_provider: F) -> Result<RunReport, SessionError>
    where
        F: FnOnce(&ProviderSettings) -> anyhow::Result<Box<dyn ImageProvider>>,
    {
        let provider = self.choose_provider()?;
        self.emit(
            EventKind::SessionStarted,
            map_object(json!({ "provider": provider.id() })),
        );

        let (settings, targets) = match self.configure(provider) {
            Ok(configured) => configured,
            Err(SessionError::Configuration(err)) => {
                self.surface.error(&format!("Configuration error: {err}."));
                self.emit(
                    EventKind::ConfigurationFailed,
                    map_object(json!({ "reason": err.to_string() })),
                );
                return Err(err.into());
            }
            Err(err) => return Err(err),
        };
        self.surface.info(&format!("Provider: {}", provider.label()));
        self.surface.info(&format!("Targets: {}", targets.keys().join(", ")));
        self.emit(
            EventKind::TargetsConfigured,
            map_object(json!({ "targets": targets.keys() })),
        );

        let client = build_provider(&settings)?;
        let prompt = self.read_prompt(&targets)?;

        let outcomes = self.generate_all(client.as_ref(), &targets, &prompt);
        let summary = self.summarize(&outcomes);
        Ok(RunReport {
            provider,
            outcomes,
            summary,
        })
    }

    pub fn choose_provider(&mut self) -> anyhow::Result<Provider> {
        let choice = self
            .surface
            .select_one("Select an AI provider", &Provider::labels())?;
        Provider::from_label(&choice)
            .ok_or_else(|| anyhow::anyhow!("unknown provider selection '{choice}'"))
    }

    /// Collects credentials and builds the target set for `provider`.
    pub fn configure(
        &mut self,
        provider: Provider,
    ) -> Result<(ProviderSettings, ModelTargets), SessionError> {
        let endpoint = match provider {
            Provider::AzureOpenAi => Some(
                self.surface
                    .read_https_url("Azure OpenAI endpoint (https://...)")?,
            ),
            Provider::OpenAi | Provider::GoogleAi => None,
        };
        let api_key = self
            .surface
            .read_secret(&format!("{provider} API key"), MIN_API_KEY_CHARS)?;

        let (targets, warnings) = match provider {
            Provider::AzureOpenAi => {
                let raw = self.surface.read_text(
                    "Deployments as name:modelType, comma separated (e.g. my-dalle:dall-e-3)",
                    None,
                )?;
                let parsed = parse_deployments(&raw, &self.catalog);
                (parsed.targets, parsed.warnings)
            }
            Provider::OpenAi | Provider::GoogleAi => {
                let menu = provider
                    .model_menu()
                    .iter()
                    .map(|model| (*model).to_string())
                    .collect::<Vec<String>>();
                let selected = self.surface.select_many("Select image models", &menu)?;
                select_menu_targets(provider, &selected, &self.catalog)
            }
        };

        for warning in &warnings {
            self.surface.warn(warning);
            self.emit(
                EventKind::TargetSkipped,
                map_object(json!({ "reason": warning })),
            );
        }

        if targets.is_empty() {
            return Err(match provider {
                Provider::AzureOpenAi => ConfigurationError::NoDeployments,
                Provider::OpenAi | Provider::GoogleAi => ConfigurationError::NoModels,
            }
            .into());
        }

        let settings = ProviderSettings {
            provider,
            api_key,
            endpoint,
        };
        Ok((settings, targets))
    }

    pub fn read_prompt(&mut self, targets: &ModelTargets) -> anyhow::Result<String> {
        let max_chars = targets
            .contains_model_type("dall-e-3")
            .then_some(DALLE_PROMPT_MAX_CHARS);
        self.surface.read_text("Image prompt", max_chars)
    }

    /// One pass over `targets` in insertion order. Never stops early.
    pub fn generate_all(
        &mut self,
        provider: &dyn ImageProvider,
        targets: &ModelTargets,
        prompt: &str,
    ) -> Vec<TargetOutcome> {
        let total = targets.len();
        let mut outcomes = Vec::with_capacity(total);

        for (idx, target) in targets.iter().enumerate() {
            self.surface.info(&format!(
                "[{}/{}] Generating with {} ({})...",
                idx + 1,
                total,
                target.key,
                target.model_type
            ));
            self.emit(
                EventKind::TargetStarted,
                map_object(json!({
                    "key": target.key,
                    "model_type": target.model_type,
                    "provider": provider.name(),
                    "prompt_chars": prompt.chars().count(),
                })),
            );

            let outcome = match self.generate_target(provider, target, prompt) {
                Ok(Generated {
                    path,
                    elapsed,
                    mime_type,
                }) => {
                    self.surface.info(&format!(
                        "{}: saved {} in {:.2}s",
                        target.key,
                        path.display(),
                        elapsed.as_secs_f64()
                    ));
                    self.emit(
                        EventKind::ArtifactCreated,
                        map_object(json!({
                            "key": target.key,
                            "path": path.to_string_lossy(),
                            "elapsed_s": elapsed.as_secs_f64(),
                            "mime_type": mime_type,
                        })),
                    );
                    TargetOutcome::Success {
                        key: target.key.clone(),
                        path,
                        elapsed,
                    }
                }
                Err(err) => {
                    let classified = classify(&err);
                    self.surface
                        .error(&format!("{}: {}", target.key, classified.message));
                    self.emit(
                        EventKind::TargetFailed,
                        map_object(json!({
                            "key": target.key,
                            "category": classified.category.as_str(),
                            "status": err.status(),
                            "message": err.to_string(),
                        })),
                    );
                    TargetOutcome::Failure {
                        key: target.key.clone(),
                        category: classified.category,
                        message: classified.message,
                    }
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    fn generate_target(
        &self,
        provider: &dyn ImageProvider,
        target: &ModelTarget,
        prompt: &str,
    ) -> Result<Generated, GenerationError> {
        let started = Instant::now();
        let raw = provider.generate(target, prompt)?;
        let mime_type = match &raw {
            RawImageResult::Bytes(image) => image.mime_type.clone(),
            RawImageResult::Url(_) | RawImageResult::Empty => None,
        };
        let bytes = self.acquirer.to_bytes(raw, &target.key)?;
        let path = self.writer.write(&bytes, &target.key)?;
        Ok(Generated {
            path,
            elapsed: started.elapsed(),
            mime_type,
        })
    }

    pub fn summarize(&mut self, outcomes: &[TargetOutcome]) -> RunSummary {
        let summary = RunSummary::from_outcomes(outcomes);
        self.surface.info(&format!(
            "Finished: {} succeeded, {} failed.",
            summary.success_count, summary.failure_count
        ));
        self.emit(
            EventKind::SessionFinished,
            map_object(json!({
                "success_count": summary.success_count,
                "failure_count": summary.failure_count,
            })),
        );
        summary
    }

    /// The event log is best effort: a write failure is shown once per event and the run goes on.
    fn emit(&mut self, kind: EventKind, payload: EventPayload) {
        if let Err(err) = self.events.emit(kind, payload) {
            self.surface
                .warn(&format!("Event log write failed ({}): {err:#}", kind.as_str()));
        }
    }
}

fn map_object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}
