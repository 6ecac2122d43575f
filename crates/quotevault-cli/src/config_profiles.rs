//! Persistent CLI profile configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quotevault_core::{ClientConfig, ThemeMode};
use serde::{Deserialize, Serialize};

const CONFIG_DIR_NAME: &str = "quotevault";
const CONFIG_FILE_NAME: &str = "cli-config.json";

pub const PROFILE_ENV: &str = "QUOTEVAULT_PROFILE";
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfilesConfig {
    #[serde(default = "default_config_version")]
    pub version: u32,
    #[serde(default)]
    pub active_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, CliProfile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CliProfile {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
    #[serde(default)]
    pub backdrop_bucket: Option<String>,
    #[serde(default)]
    pub theme: Option<ThemeMode>,
}

const fn default_config_version() -> u32 {
    1
}

pub fn default_config_path() -> Result<PathBuf, String> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or_else(|| "Failed to resolve CLI config directory".to_string())
}

pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    quotevault_core::util::normalize_text_option(value)
}

pub fn normalize_profile_name(value: Option<&str>) -> Option<String> {
    let value = value?.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl CliProfilesConfig {
    pub fn load() -> Result<Self, String> {
        Self::load_from_path(&default_config_path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|error| format!("Failed to read config at {}: {}", path.display(), error))?;
        let mut config = serde_json::from_str::<Self>(&raw)
            .map_err(|error| format!("Failed to parse config at {}: {}", path.display(), error))?;
        config.normalize();
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, String> {
        let path = default_config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    error
                )
            })?;
        }

        let mut normalized = self.clone();
        normalized.normalize();
        let serialized = serde_json::to_string_pretty(&normalized)
            .map_err(|error| format!("Failed to serialize config: {error}"))?;
        std::fs::write(path, serialized)
            .map_err(|error| format!("Failed to write config at {}: {}", path.display(), error))
    }

    /// Explicit flag, then `QUOTEVAULT_PROFILE`, then the active profile, then `default`.
    pub fn resolve_profile_name(&self, explicit: Option<&str>) -> String {
        let from_env = std::env::var(PROFILE_ENV).ok();
        self.resolve_profile_name_with_env(explicit, from_env.as_deref())
    }

    pub fn resolve_profile_name_with_env(
        &self,
        explicit: Option<&str>,
        from_env: Option<&str>,
    ) -> String {
        normalize_profile_name(explicit)
            .or_else(|| normalize_profile_name(from_env))
            .or_else(|| normalize_profile_name(self.active_profile.as_deref()))
            .unwrap_or_else(|| "default".to_string())
    }

    pub fn profile(&self, name: &str) -> Option<&CliProfile> {
        self.profiles.get(name)
    }

    pub fn profile_mut_or_default(&mut self, name: &str) -> &mut CliProfile {
        self.profiles.entry(name.to_string()).or_default()
    }

    fn normalize(&mut self) {
        self.active_profile = normalize_profile_name(self.active_profile.as_deref());
        for profile in self.profiles.values_mut() {
            profile.normalize();
        }
    }
}

impl CliProfile {
    pub fn theme(&self) -> ThemeMode {
        self.theme.unwrap_or_default()
    }

    /// Backend config for this profile; environment values win over the file.
    pub fn client_config(
        &self,
        env_url: Option<String>,
        env_anon_key: Option<String>,
    ) -> Result<Option<ClientConfig>, String> {
        let url = normalize_text_option(env_url).or_else(|| self.supabase_url.clone());
        let anon_key = normalize_text_option(env_anon_key).or_else(|| self.supabase_anon_key.clone());
        let config = ClientConfig::from_optional(url, anon_key).map_err(|error| error.to_string())?;
        Ok(config.map(|config| match self.backdrop_bucket.clone() {
            Some(bucket) => config.with_backdrop_bucket(bucket),
            None => config,
        }))
    }

    fn normalize(&mut self) {
        self.supabase_url = normalize_text_option(self.supabase_url.take())
            .map(|url| url.trim_end_matches('/').to_string());
        self.supabase_anon_key = normalize_text_option(self.supabase_anon_key.take());
        self.backdrop_bucket = normalize_text_option(self.backdrop_bucket.take());
    }
}
