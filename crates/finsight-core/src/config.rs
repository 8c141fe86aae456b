//! Application configuration
//!
//! Resolution order (later wins):
//! 1. Embedded defaults (`config/default.toml`, compiled into binary)
//! 2. Override file (`--config` path, else ~/.local/share/finsight/config.toml)
//! 3. Environment variables
//!
//! Override files may be partial; tables are merged key by key.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/default.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub ai: AiConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Empty means the platform data dir
    pub data_dir: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub api_keys: Vec<String>,
    pub cors_origins: Vec<String>,
}

/// Which text-generation backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AiBackendKind {
    Ollama,
    #[serde(alias = "openai", alias = "vllm", alias = "localai", alias = "llamacpp")]
    OpenaiCompatible,
    Mock,
    None,
}

impl std::str::FromStr for AiBackendKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai_compatible" | "openai" | "vllm" | "localai" | "llamacpp" => {
                Ok(Self::OpenaiCompatible)
            }
            "mock" => Ok(Self::Mock),
            "none" | "off" | "" => Ok(Self::None),
            other => Err(format!("Unknown AI backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfig {
    pub backend: AiBackendKind,
    pub ollama_host: String,
    pub ollama_model: String,
    pub openai_host: String,
    pub openai_model: String,
    pub openai_api_key: String,
    /// Token budget per completion
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
}

impl AiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// ISO code used when formatting amounts
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        // Hard-coded copy, used only if the embedded file fails to parse
        parse_toml(DEFAULT_CONFIG).unwrap_or_else(|_| Config {
            storage: StorageConfig {
                data_dir: String::new(),
            },
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 3000,
                api_keys: Vec::new(),
                cors_origins: Vec::new(),
            },
            ai: AiConfig {
                backend: AiBackendKind::Ollama,
                ollama_host: String::new(),
                ollama_model: "llama3.2".into(),
                openai_host: String::new(),
                openai_model: "gpt-4o-mini".into(),
                openai_api_key: String::new(),
                max_tokens: 1500,
                temperature: 0.7,
                timeout_secs: 60,
                retry_attempts: 3,
                retry_delay_ms: 1000,
            },
            display: DisplayConfig {
                currency: "USD".into(),
            },
        })
    }
}

impl Config {
    /// Load defaults, the override file and environment variables
    ///
    /// An explicit `path` must exist; the default override location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let override_content = match path {
            Some(path) => Some(fs::read_to_string(path).map_err(|e| {
                Error::InvalidData(format!("Failed to read config {}: {}", path.display(), e))
            })?),
            None => match default_config_path() {
                Some(p) if p.exists() => Some(fs::read_to_string(&p)?),
                _ => None,
            },
        };

        let mut config = Self::from_layers(override_content.as_deref())?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Merge an optional override document over the embedded defaults
    pub fn from_layers(override_toml: Option<&str>) -> Result<Self> {
        let mut base: toml::Value = toml::from_str(DEFAULT_CONFIG)?;
        if let Some(content) = override_toml {
            let overlay: toml::Value = toml::from_str(content)?;
            merge(&mut base, overlay);
        }
        Ok(base.try_into()?)
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get("FINSIGHT_DATA_DIR") {
            self.storage.data_dir = dir;
        }
        if let Some(keys) = get("FINSIGHT_API_KEYS") {
            self.server.api_keys = keys
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
        if let Some(currency) = get("FINSIGHT_CURRENCY") {
            self.display.currency = currency.trim().to_uppercase();
        }
        if let Some(backend) = get("AI_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.ai.backend = kind,
                Err(e) => tracing::warn!("{}; keeping {:?}", e, self.ai.backend),
            }
        }
        if let Some(host) = get("OLLAMA_HOST") {
            self.ai.ollama_host = host;
        }
        if let Some(model) = get("OLLAMA_MODEL") {
            self.ai.ollama_model = model;
        }
        if let Some(host) = get("OPENAI_COMPATIBLE_HOST") {
            self.ai.openai_host = host;
        }
        if let Some(model) = get("OPENAI_COMPATIBLE_MODEL") {
            self.ai.openai_model = model;
        }
        if let Some(key) = get("OPENAI_COMPATIBLE_API_KEY") {
            self.ai.openai_api_key = key;
        }
    }

    /// Directory holding the collection files
    pub fn data_dir(&self) -> PathBuf {
        if !self.storage.data_dir.trim().is_empty() {
            return PathBuf::from(self.storage.data_dir.trim());
        }
        dirs::data_local_dir()
            .map(|d| d.join("finsight").join("data"))
            .unwrap_or_else(|| PathBuf::from("finsight-data"))
    }

    /// Render the effective config as TOML (api keys masked)
    pub fn to_display_toml(&self) -> Result<String> {
        let mut masked = self.clone();
        masked.server.api_keys = masked
            .server
            .api_keys
            .iter()
            .map(|k| mask_secret(k))
            .collect();
        if !masked.ai.openai_api_key.is_empty() {
            masked.ai.openai_api_key = mask_secret(&masked.ai.openai_api_key);
        }
        toml::to_string_pretty(&masked)
            .map_err(|e| Error::InvalidData(format!("Failed to render config: {}", e)))
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("finsight").join("config.toml"))
}

fn parse_toml(content: &str) -> Result<Config> {
    Ok(toml::from_str(content)?)
}

/// Deep-merge `overlay` into `base`; tables merge, everything else replaces
fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn mask_secret(secret: &str) -> String {
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", secret.chars().take(4).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_embedded_defaults() {
        let config = Config::from_layers(None).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.ai.backend, AiBackendKind::Ollama);
        assert_eq!(config.ai.max_tokens, 1500);
        assert_eq!(config.ai.timeout_secs, 60);
        assert_eq!(config.display.currency, "USD");
        assert_eq!(Config::default(), config);
    }

    #[test]
    fn test_partial_override_merges() {
        let config = Config::from_layers(Some("[ai]\nmax_tokens = 800\n\n[server]\nport = 8080\n"))
            .unwrap();
        assert_eq!(config.ai.max_tokens, 800);
        assert_eq!(config.ai.ollama_model, "llama3.2");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn test_invalid_override_is_error() {
        assert!(Config::from_layers(Some("[server]\nport = \"eighty\"")).is_err());
        assert!(Config::from_layers(Some("not toml [")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("FINSIGHT_DATA_DIR", "/tmp/fin"),
            ("FINSIGHT_API_KEYS", "alpha, beta,,"),
            ("FINSIGHT_CURRENCY", "eur"),
            ("AI_BACKEND", "openai"),
            ("OPENAI_COMPATIBLE_HOST", "http://localhost:8000"),
            ("OLLAMA_MODEL", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.data_dir(), PathBuf::from("/tmp/fin"));
        assert_eq!(config.server.api_keys, vec!["alpha", "beta"]);
        assert_eq!(config.display.currency, "EUR");
        assert_eq!(config.ai.backend, AiBackendKind::OpenaiCompatible);
        assert_eq!(config.ai.openai_host, "http://localhost:8000");
        // Blank values are ignored
        assert_eq!(config.ai.ollama_model, "llama3.2");
    }

    #[test]
    fn test_unknown_backend_env_is_ignored() {
        let mut config = Config::default();
        config.apply_env(|k| (k == "AI_BACKEND").then(|| "carrier-pigeon".to_string()));
        assert_eq!(config.ai.backend, AiBackendKind::Ollama);
    }

    #[test]
    fn test_display_masks_secrets() {
        let mut config = Config::default();
        config.server.api_keys = vec!["supersecret".into()];
        let rendered = config.to_display_toml().unwrap();
        assert!(rendered.contains("supe****"));
        assert!(!rendered.contains("supersecret"));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        assert!(Config::load(Some(Path::new("/definitely/not/here.toml"))).is_err());
    }
}
