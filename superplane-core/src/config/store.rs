//! File-backed context store.
//!
//! The whole document is loaded once when the store is opened and rewritten
//! after every mutation. Clones share the same in-memory document.

use super::{
    context_selector, normalize_context_selector, ConfigContext, CONFIG_FILE_NAME,
    CONFIG_KEY_CURRENT_CONTEXT, CONFIG_KEY_OUTPUT, ENV_PREFIX,
};
use crate::error::{CliError, CliResult};
use fs2::FileExt;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// On-disk layout of the config file.
///
/// Context entries are kept as raw YAML values so that a single malformed
/// entry cannot make the rest of the file unreadable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub contexts: Vec<serde_yaml::Value>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub current_context: String,

    /// Keys this client does not know about, preserved across rewrites.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Environment-variable overrides for individual config keys.
///
/// Overrides only affect reads; they are never written back to the file.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    output: Option<String>,
    current_context: Option<String>,
}

impl EnvOverrides {
    /// Reads `SUPERPLANE_OUTPUT` and `SUPERPLANE_CURRENTCONTEXT`.
    pub fn from_env() -> Self {
        Self {
            output: env_value(CONFIG_KEY_OUTPUT),
            current_context: env_value(CONFIG_KEY_CURRENT_CONTEXT),
        }
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_current_context(mut self, selector: impl Into<String>) -> Self {
        self.current_context = Some(selector.into());
        self
    }
}

fn env_value(key: &str) -> Option<String> {
    let name = format!("{}_{}", ENV_PREFIX, key.to_uppercase());
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Persisted set of contexts plus the pointer to the current one.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    overrides: EnvOverrides,
    document: Arc<Mutex<ConfigDocument>>,
}

impl ConfigStore {
    /// `$HOME/.superplane.yaml`.
    pub fn default_path() -> CliResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(CONFIG_FILE_NAME))
            .ok_or_else(|| CliError::not_found("failed to find home directory"))
    }

    /// Creates an empty config file at `path` when none exists.
    pub fn ensure_file(path: &Path) {
        if path.exists() {
            return;
        }

        if let Err(e) = OpenOptions::new().create(true).append(true).open(path) {
            warn!(
                path = %path.display(),
                error = %e,
                "Could not ensure config file exists"
            );
        }
    }

    /// Opens the store at `path`, applying environment overrides.
    pub fn open(path: impl Into<PathBuf>) -> CliResult<Self> {
        Self::open_with_overrides(path, EnvOverrides::from_env())
    }

    /// Opens the store at `path` with explicit overrides.
    ///
    /// A missing or blank file is an empty configuration.
    pub fn open_with_overrides(
        path: impl Into<PathBuf>,
        overrides: EnvOverrides,
    ) -> CliResult<Self> {
        let path = path.into();
        let document = Self::load_document(&path)?;
        debug!(path = %path.display(), "Using config file");

        Ok(Self {
            path,
            overrides,
            document: Arc::new(Mutex::new(document)),
        })
    }

    fn load_document(path: &Path) -> CliResult<ConfigDocument> {
        if !path.exists() {
            return Ok(ConfigDocument::default());
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("failed to read {}", path.display()), e))?;

        if contents.trim().is_empty() {
            return Ok(ConfigDocument::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| CliError::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> MutexGuard<'_, ConfigDocument> {
        self.document.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configured default output format, if any.
    pub fn output_format(&self) -> Option<String> {
        if let Some(output) = &self.overrides.output {
            return Some(output.clone());
        }

        self.lock()
            .output
            .clone()
            .filter(|output| !output.trim().is_empty())
    }

    /// All valid contexts, normalized, in stored order.
    pub fn get_contexts(&self) -> Vec<ConfigContext> {
        let document = self.lock();
        valid_contexts(&document)
    }

    /// The context whose selector matches the persisted current selector.
    pub fn get_current_context(&self) -> Option<ConfigContext> {
        let document = self.lock();
        let contexts = valid_contexts(&document);
        if contexts.is_empty() {
            return None;
        }

        let raw = self
            .overrides
            .current_context
            .as_deref()
            .unwrap_or(&document.current_context);
        let current = normalize_context_selector(raw);
        if current.is_empty() {
            return None;
        }

        contexts
            .into_iter()
            .find(|context| matches_selector(context, &current))
    }

    /// Inserts or replaces the context with the same selector and makes it current.
    pub fn upsert_context(&self, context: ConfigContext) -> CliResult<ConfigContext> {
        let context = context.normalized();
        if context.url.is_empty() {
            return Err(CliError::validation("organization URL is required"));
        }
        if context.api_token.is_empty() {
            return Err(CliError::validation("API token is required"));
        }

        let selector = context_selector(&context);
        let mut document = self.lock();
        let mut contexts = valid_contexts(&document);

        match contexts
            .iter()
            .position(|existing| context_selector(existing) == selector)
        {
            Some(index) => contexts[index] = context.clone(),
            None => contexts.push(context.clone()),
        }

        document.contexts = contexts
            .iter()
            .map(serde_yaml::to_value)
            .collect::<Result<_, _>>()?;
        document.current_context = selector.clone();
        self.write(&document)?;

        debug!(context = %selector, "Context saved as current");
        Ok(context)
    }

    /// Switches the current context to the one matching `selector`.
    pub fn save_current_context_by_selector(&self, selector: &str) -> CliResult<ConfigContext> {
        let mut document = self.lock();
        let contexts = valid_contexts(&document);
        if contexts.is_empty() {
            return Err(CliError::not_found("no contexts configured"));
        }

        let normalized = normalize_context_selector(selector);
        if normalized.is_empty() {
            return Err(CliError::not_found("context selector is required"));
        }

        let selected = contexts
            .into_iter()
            .find(|context| matches_selector(context, &normalized))
            .ok_or_else(|| CliError::not_found(format!("context {:?} not found", normalized)))?;

        document.current_context = context_selector(&selected);
        self.write(&document)?;

        debug!(context = %document.current_context, "Switched current context");
        Ok(selected)
    }

    /// Rewrites the whole file under an exclusive lock.
    fn write(&self, document: &ConfigDocument) -> CliResult<()> {
        let yaml = serde_yaml::to_string(document)?;
        let write_error = |e| CliError::io("failed to write configuration", e);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(write_error)?;

        file.lock_exclusive().map_err(write_error)?;
        file.set_len(0).map_err(write_error)?;
        file.write_all(yaml.as_bytes()).map_err(write_error)?;
        file.flush().map_err(write_error)?;
        file.sync_all().map_err(write_error)?;

        debug!(
            path = %self.path.display(),
            contexts = document.contexts.len(),
            "Configuration written"
        );
        Ok(())
    }
}

fn valid_contexts(document: &ConfigDocument) -> Vec<ConfigContext> {
    document
        .contexts
        .iter()
        .filter_map(|value| serde_yaml::from_value::<ConfigContext>(value.clone()).ok())
        .map(|context| context.normalized())
        .filter(ConfigContext::is_valid)
        .collect()
}

fn matches_selector(context: &ConfigContext, normalized: &str) -> bool {
    normalize_context_selector(&context_selector(context)) == normalized
}
