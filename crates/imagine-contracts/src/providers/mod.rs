use std::fmt;

use crate::models::{ModelOptionsCatalog, ModelTarget, ModelTargets, VendorContext};

pub const OPENAI_IMAGE_MODELS: &[&str] =
    &["dall-e-3", "gpt-image-1", "gpt-image-1-mini", "gpt-image-1.5"];

pub const GOOGLE_IMAGE_MODELS: &[&str] = &["gemini-2.5-flash-image", "gemini-3-pro-image-preview"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    AzureOpenAi,
    OpenAi,
    GoogleAi,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Self::AzureOpenAi, Self::OpenAi, Self::GoogleAi];

    pub fn label(self) -> &'static str {
        match self {
            Self::AzureOpenAi => "Azure OpenAI",
            Self::OpenAi => "OpenAI",
            Self::GoogleAi => "Google AI",
        }
    }

    /// Stable lowercase id used in the event log.
    pub fn id(self) -> &'static str {
        match self {
            Self::AzureOpenAi => "azure-openai",
            Self::OpenAi => "openai",
            Self::GoogleAi => "google-ai",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|provider| provider.label() == label.trim())
    }

    pub fn labels() -> Vec<String> {
        Self::ALL
            .iter()
            .map(|provider| provider.label().to_string())
            .collect()
    }

    /// Fixed model menu. Azure has none: its targets come from deployment input.
    pub fn model_menu(self) -> &'static [&'static str] {
        match self {
            Self::AzureOpenAi => &[],
            Self::OpenAi => OPENAI_IMAGE_MODELS,
            Self::GoogleAi => GOOGLE_IMAGE_MODELS,
        }
    }

    pub fn vendor_context(self) -> Option<VendorContext> {
        match self {
            Self::AzureOpenAi => Some(VendorContext::Azure),
            Self::OpenAi => Some(VendorContext::OpenAi),
            Self::GoogleAi => None,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Builds targets from menu selections. Selections outside the provider's menu, or without
/// catalog options where the provider needs them, are skipped with a warning.
pub fn select_menu_targets(
    provider: Provider,
    selected: &[String],
    catalog: &ModelOptionsCatalog,
) -> (ModelTargets, Vec<String>) {
    let mut targets = ModelTargets::new();
    let mut warnings = Vec::new();

    for model in selected {
        let model = model.trim();
        if !provider.model_menu().contains(&model) {
            warnings.push(format!("Skipping '{model}': not offered by {provider}."));
            continue;
        }
        let options = match provider.vendor_context() {
            Some(vendor) => match catalog.resolve(model, vendor) {
                Some(options) => Some(options),
                None => {
                    warnings.push(format!("Skipping '{model}': unknown model type."));
                    continue;
                }
            },
            None => None,
        };
        targets.insert(ModelTarget {
            key: model.to_string(),
            deployment: model.to_string(),
            model_type: model.to_string(),
            options,
        });
    }

    (targets, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_round_trip_through_menu_text() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_label(provider.label()), Some(provider));
        }
        assert_eq!(Provider::from_label("Bing"), None);
        assert_eq!(Provider::labels(), vec!["Azure OpenAI", "OpenAI", "Google AI"]);
    }

    #[test]
    fn every_openai_menu_entry_has_catalog_options() {
        let catalog = ModelOptionsCatalog::new();
        for model in OPENAI_IMAGE_MODELS {
            assert!(catalog.resolve(model, VendorContext::OpenAi).is_some(), "{model}");
        }
    }

    #[test]
    fn openai_selection_resolves_options_in_selection_order() {
        let selected = vec!["gpt-image-1.5".to_string(), "dall-e-3".to_string()];
        let (targets, warnings) =
            select_menu_targets(Provider::OpenAi, &selected, &ModelOptionsCatalog::new());
        assert!(warnings.is_empty());
        assert_eq!(targets.keys(), vec!["gpt-image-1.5", "dall-e-3"]);
        assert!(targets.iter().all(|target| target.options.is_some()));
    }

    #[test]
    fn google_selection_carries_no_catalog_options() {
        let selected = vec!["gemini-2.5-flash-image".to_string()];
        let (targets, warnings) =
            select_menu_targets(Provider::GoogleAi, &selected, &ModelOptionsCatalog::new());
        assert!(warnings.is_empty());
        let target = targets.get("gemini-2.5-flash-image").unwrap();
        assert_eq!(target.deployment, "gemini-2.5-flash-image");
        assert!(target.options.is_none());
    }

    #[test]
    fn selections_outside_the_menu_are_skipped() {
        let selected = vec!["dall-e-3".to_string(), "midjourney".to_string()];
        let (targets, warnings) =
            select_menu_targets(Provider::GoogleAi, &selected, &ModelOptionsCatalog::new());
        assert!(targets.is_empty());
        assert_eq!(warnings.len(), 2);
    }
}
