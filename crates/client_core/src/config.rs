use std::{fs, path::Path, str::FromStr};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use shared::protocol::{ErrorBodySchema, FormFields, DEFAULT_ANALYZE_PATH};
use url::Url;

use crate::controller::ResubmitPolicy;

pub const SETTINGS_FILE: &str = "report_client.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientSettings {
    pub server_url: String,
    pub analyze_path: String,
    pub fields: FormFields,
    pub error_message_keys: ErrorBodySchema,
    pub resubmit_policy: ResubmitPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            analyze_path: DEFAULT_ANALYZE_PATH.into(),
            fields: FormFields::default(),
            error_message_keys: ErrorBodySchema::default(),
            resubmit_policy: ResubmitPolicy::default(),
        }
    }
}

/// Optional overrides read from the settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    server_url: Option<String>,
    analyze_path: Option<String>,
    file_field: Option<String>,
    title_field: Option<String>,
    error_message_keys: Option<Vec<String>>,
    resubmit_policy: Option<ResubmitPolicy>,
}

impl ClientSettings {
    pub fn analyze_endpoint(&self) -> anyhow::Result<Url> {
        let base = self.server_url.trim().trim_end_matches('/');
        let path = self.analyze_path.trim();
        let raw = if path.starts_with('/') {
            format!("{base}{path}")
        } else {
            format!("{base}/{path}")
        };

        let url = Url::parse(&raw)
            .with_context(|| format!("invalid analyze endpoint '{raw}'"))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("analyze endpoint '{raw}' must use http or https");
        }
        Ok(url)
    }

    fn apply_file(&mut self, file: SettingsFile) {
        if let Some(v) = file.server_url {
            self.server_url = v;
        }
        if let Some(v) = file.analyze_path {
            self.analyze_path = v;
        }
        if let Some(v) = file.file_field {
            self.fields.file = v;
        }
        if let Some(v) = file.title_field {
            self.fields.title = v;
        }
        if let Some(v) = file.error_message_keys {
            self.error_message_keys = ErrorBodySchema { message_keys: v };
        }
        if let Some(v) = file.resubmit_policy {
            self.resubmit_policy = v;
        }
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = env("REPORT_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = env("APP__SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = env("APP__ANALYZE_PATH") {
            self.analyze_path = v;
        }
        if let Some(v) = env("APP__FILE_FIELD") {
            self.fields.file = v;
        }
        if let Some(v) = env("APP__TITLE_FIELD") {
            self.fields.title = v;
        }
        if let Some(v) = env("APP__ERROR_MESSAGE_KEYS") {
            self.error_message_keys = ErrorBodySchema {
                message_keys: v
                    .split(',')
                    .map(str::trim)
                    .filter(|key| !key.is_empty())
                    .map(str::to_string)
                    .collect(),
            };
        }
        if let Some(v) = env("APP__RESUBMIT_POLICY") {
            self.resubmit_policy = v.parse().context("invalid APP__RESUBMIT_POLICY")?;
        }
        Ok(())
    }
}

/// Process environment lookup; blank values count as unset.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Settings from `path` layered with the process environment.
pub fn load_settings(path: &Path) -> anyhow::Result<ClientSettings> {
    load_settings_from(path, env_lookup)
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
        let file: SettingsFile = toml::from_str(&raw)
            .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
        settings.apply_file(file);
    }

    settings.apply_env(env)?;
    Ok(settings)
}

impl FromStr for ResubmitPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ignore" => Ok(Self::Ignore),
            "supersede" => Ok(Self::Supersede),
            other => bail!("unknown resubmit policy '{other}' (expected 'ignore' or 'supersede')"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
