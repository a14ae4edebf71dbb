//! Configuration persistence and prompt presets

mod prompts;

pub use prompts::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::codec::CompressionSettings;
use crate::error::{Error, Result};
use crate::vision::{AuthMode, ProviderConfig, ProviderKind};

/// Instruction sent as the system message on every request.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "你必须用中文回复所有内容。无论用户用什么语言提问，都要用中文回答。";

/// Process name of the Dota 2 client, without extension.
pub const DEFAULT_TARGET_PROCESS: &str = "dota2";

/// Per-provider credential and endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub api_key: String,
    pub endpoint: String,
    pub auth_mode: AuthMode,
}

impl ProviderSettings {
    /// Defaults for a given provider with an empty key.
    pub fn for_kind(kind: ProviderKind) -> Self {
        Self {
            api_key: String::new(),
            endpoint: kind.default_endpoint().to_string(),
            auth_mode: kind.default_auth_mode(),
        }
    }
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self::for_kind(ProviderKind::OpenAi)
    }
}

/// Overlay appearance and auto-hide behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlaySettings {
    pub enabled: bool,
    /// Maximum panel width in pixels
    pub width: i32,
    pub font_size: i32,
    pub auto_hide_enabled: bool,
    pub auto_hide_seconds: u64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 600,
            font_size: 16,
            auto_hide_enabled: true,
            auto_hide_seconds: 30,
        }
    }
}

impl OverlaySettings {
    /// Countdown before the overlay fades out, if auto-hide is on.
    pub fn auto_hide_after(&self) -> Option<Duration> {
        (self.auto_hide_enabled && self.auto_hide_seconds > 0)
            .then(|| Duration::from_secs(self.auto_hide_seconds))
    }
}

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Active provider
    pub provider: ProviderKind,
    pub openai: ProviderSettings,
    pub zhipu: ProviderSettings,
    pub doubao: ProviderSettings,
    /// Model override. Empty means the provider's default model.
    pub model_name: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub request_timeout_secs: u64,
    pub system_instruction: String,

    /// Seconds between automatic captures
    pub interval_seconds: u64,
    /// Only capture while the tracked process owns the foreground window
    pub dota2_only: bool,
    pub target_process: String,
    pub show_preview: bool,
    pub auto_start: bool,

    pub selected_prompt: PromptType,
    pub custom_prompt: String,

    pub overlay: OverlaySettings,
    pub compression: CompressionSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenAi,
            openai: ProviderSettings::for_kind(ProviderKind::OpenAi),
            zhipu: ProviderSettings::for_kind(ProviderKind::ZhipuAi),
            doubao: ProviderSettings::for_kind(ProviderKind::Doubao),
            model_name: String::new(),
            max_tokens: 500,
            temperature: 0.7,
            request_timeout_secs: 60,
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
            interval_seconds: 60,
            dota2_only: true,
            target_process: DEFAULT_TARGET_PROCESS.to_string(),
            show_preview: true,
            auto_start: false,
            selected_prompt: PromptType::Default,
            custom_prompt: String::new(),
            overlay: OverlaySettings::default(),
            compression: CompressionSettings::default(),
        }
    }
}

/// Default model name for a provider.
pub fn default_model(kind: ProviderKind) -> &'static str {
    kind.default_model()
}

impl AppConfig {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("GameAssist").join("config.json"))
    }

    /// Load config from disk, creating it with defaults if absent.
    ///
    /// Read or parse failures fall back to defaults.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load from an explicit path; same fallback rules as [`AppConfig::load`].
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            let config = Self::default();
            if let Err(e) = config.save_to(path) {
                tracing::warn!("Could not write default config to {}: {}", path.display(), e);
            }
            return config;
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Invalid config at {}: {}", path.display(), e);
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Could not read config at {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save config to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| Error::Configuration("no configuration directory".into()))?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Configuration(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Stored settings for a provider.
    pub fn provider_settings(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::OpenAi => &self.openai,
            ProviderKind::ZhipuAi => &self.zhipu,
            ProviderKind::Doubao => &self.doubao,
        }
    }

    /// Snapshot of the active provider for the vision client.
    pub fn active_provider(&self) -> ProviderConfig {
        let settings = self.provider_settings(self.provider);
        let model = if self.model_name.trim().is_empty() {
            default_model(self.provider).to_string()
        } else {
            self.model_name.trim().to_string()
        };
        let endpoint = if settings.endpoint.trim().is_empty() {
            self.provider.default_endpoint().to_string()
        } else {
            settings.endpoint.trim().to_string()
        };

        ProviderConfig {
            kind: self.provider,
            api_key: settings.api_key.trim().to_string(),
            endpoint,
            model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            auth_mode: settings.auth_mode,
            system_instruction: self.system_instruction.clone(),
        }
    }

    pub fn prompt_selection(&self) -> PromptSelection {
        PromptSelection::new(self.selected_prompt, self.custom_prompt.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    /// Capture interval, never shorter than one second.
    pub fn capture_interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.provider, ProviderKind::OpenAi);
        assert_eq!(config.max_tokens, 500);
        assert_eq!(config.interval_seconds, 60);
        assert!(config.dota2_only);
        assert_eq!(config.overlay.width, 600);
        assert_eq!(config.overlay.auto_hide_seconds, 30);
        assert_eq!(config.target_process, "dota2");
    }

    #[test]
    fn test_active_provider_uses_default_model() {
        let mut config = AppConfig::default();
        config.provider = ProviderKind::ZhipuAi;
        config.zhipu.api_key = "  id.secret  ".into();

        let provider = config.active_provider();
        assert_eq!(provider.kind, ProviderKind::ZhipuAi);
        assert_eq!(provider.model, "glm-4.6v");
        assert_eq!(provider.api_key, "id.secret");
        assert_eq!(provider.auth_mode, AuthMode::SignedToken);
    }

    #[test]
    fn test_model_override() {
        let mut config = AppConfig::default();
        config.model_name = "gpt-4o-mini".into();
        assert_eq!(config.active_provider().model, "gpt-4o-mini");
    }

    #[test]
    fn test_load_creates_defaults_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("GameAssist").join("config.json");

        let config = AppConfig::load_from(&path);
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_roundtrip_and_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");

        let mut config = AppConfig::default();
        config.openai.api_key = "sk-test".into();
        config.selected_prompt = PromptType::TeamFight;
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path), config);

        std::fs::write(&path, r#"{"interval_seconds": 15}"#).unwrap();
        let partial = AppConfig::load_from(&path);
        assert_eq!(partial.interval_seconds, 15);
        assert_eq!(partial.max_tokens, 500);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();
        assert_eq!(AppConfig::load_from(&path), AppConfig::default());
    }

    #[test]
    fn test_auto_hide_after() {
        let mut overlay = OverlaySettings::default();
        assert_eq!(overlay.auto_hide_after(), Some(Duration::from_secs(30)));
        overlay.auto_hide_enabled = false;
        assert_eq!(overlay.auto_hide_after(), None);
    }
}
