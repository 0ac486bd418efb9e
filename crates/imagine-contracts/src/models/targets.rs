use indexmap::IndexMap;

use super::catalog::{ModelOptions, ModelOptionsCatalog, VendorContext};

/// One unit of generation work.
///
/// `key` names the output file, `deployment` is what goes on the wire (an Azure deployment name or
/// a vendor model id). Targets without options build their own request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelTarget {
    pub key: String,
    pub deployment: String,
    pub model_type: String,
    pub options: Option<ModelOptions>,
}

/// Insertion-ordered target set keyed by `ModelTarget::key`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelTargets {
    targets: IndexMap<String, ModelTarget>,
}

impl ModelTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any earlier target with the same key.
    pub fn insert(&mut self, target: ModelTarget) {
        self.targets.insert(target.key.clone(), target);
    }

    pub fn get(&self, key: &str) -> Option<&ModelTarget> {
        self.targets.get(key)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelTarget> {
        self.targets.values()
    }

    pub fn keys(&self) -> Vec<String> {
        self.targets.keys().cloned().collect()
    }

    pub fn contains_model_type(&self, model_type: &str) -> bool {
        self.iter().any(|target| target.model_type == model_type)
    }
}

#[derive(Debug, Clone, Default)]
pub struct DeploymentParse {
    pub targets: ModelTargets,
    pub warnings: Vec<String>,
}

/// Azure's deployment name alphabet. Keys in this set are also safe file-name stems, so two
/// targets can never map to the same artifact name.
fn is_deployment_name(name: &str) -> bool {
    name.chars()
        .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-'))
}

/// Parses `deploymentName:modelType` pairs separated by commas.
///
/// Malformed entries and unknown model types are skipped with a warning each; blank entries
/// (stray commas) are ignored.
pub fn parse_deployments(raw: &str, catalog: &ModelOptionsCatalog) -> DeploymentParse {
    let mut parsed = DeploymentParse::default();

    for entry in raw.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }

        let parts = entry.split(':').map(str::trim).collect::<Vec<&str>>();
        let [name, model_type] = parts.as_slice() else {
            parsed
                .warnings
                .push(format!("Skipping '{entry}': expected deploymentName:modelType."));
            continue;
        };
        if name.is_empty() || model_type.is_empty() {
            parsed.warnings.push(format!(
                "Skipping '{entry}': deployment name and model type must both be set."
            ));
            continue;
        }

        if !is_deployment_name(name) {
            parsed.warnings.push(format!(
                "Skipping '{name}': deployment names use only letters, digits, '.', '_' or '-'."
            ));
            continue;
        }

        let Some(options) = catalog.resolve(model_type, VendorContext::Azure) else {
            parsed.warnings.push(format!(
                "Skipping '{name}': unknown model type '{model_type}'."
            ));
            continue;
        };

        parsed.targets.insert(ModelTarget {
            key: (*name).to_string(),
            deployment: (*name).to_string(),
            model_type: (*model_type).to_string(),
            options: Some(options),
        });
    }

    parsed
}
