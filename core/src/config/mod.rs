use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const GIZMO_DIR: &str = ".gizmo";

/// Process-wide configuration: loaded once at start, read-only afterwards.
/// Credentials resolve environment variables first, then the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Option<String>,
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: String,
    pub max_steps: usize,
    pub temperature: f64,
    pub max_tokens: Option<u32>,
    pub maps_api_key: String,
    pub sandbox_api_key: String,
    pub sandbox_base_url: Option<String>,
    pub image_output: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            provider: None,
            api_key: String::new(),
            base_url: None,
            model: String::new(),
            max_steps: 10,
            temperature: 0.2,
            max_tokens: None,
            maps_api_key: String::new(),
            sandbox_api_key: String::new(),
            sandbox_base_url: None,
            image_output: PathBuf::from("image.png"),
        }
    }
}

pub fn get_gizmo_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(GIZMO_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_gizmo_dir().join("config.toml")
}

pub fn ensure_gizmo_dir() -> Result<PathBuf> {
    let gizmo_dir = get_gizmo_dir();

    if !gizmo_dir.exists() {
        std::fs::create_dir_all(&gizmo_dir).with_context(|| {
            format!(
                "Failed to create gizmo directory at {}",
                gizmo_dir.display()
            )
        })?;
    }

    Ok(gizmo_dir)
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }

    /// Directions API key: `GMAPS_API_KEY` beats the config file.
    pub fn resolve_maps_key(&self) -> Result<String> {
        resolve_key(&["GMAPS_API_KEY"], &self.maps_api_key)
            .context("No mapping API key found. Set GMAPS_API_KEY or add maps_api_key to the config.")
    }

    /// Sandbox execution key: `SANDBOX_API_KEY`/`E2B_API_KEY` beat the file.
    pub fn resolve_sandbox_key(&self) -> Result<String> {
        resolve_key(&["SANDBOX_API_KEY", "E2B_API_KEY"], &self.sandbox_api_key).context(
            "No sandbox API key found. Set SANDBOX_API_KEY or add sandbox_api_key to the config.",
        )
    }

    /// Inference token for image generation and the hub.
    pub fn resolve_hf_token(&self) -> Result<String> {
        resolve_key(&["HF_TOKEN", "HUGGINGFACE_TOKEN"], &self.api_key)
            .context("No inference token found. Set HF_TOKEN or add api_key to the config.")
    }
}

fn resolve_key(env_vars: &[&str], config_key: &str) -> Result<String> {
    for var_name in env_vars {
        if let Ok(key) = std::env::var(var_name)
            && !key.is_empty()
        {
            return Ok(key);
        }
    }
    if !config_key.is_empty() {
        Ok(config_key.to_string())
    } else {
        anyhow::bail!("no key in environment or config")
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path())
}

fn load_config_from(config_path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(config_path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'gizmo onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", config_path.display(), e)
        }
    })?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    Ok(config)
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_gizmo_dir()?;
    save_config_to(config, &get_config_path())
}

fn save_config_to(config: &Config, config_path: &Path) -> Result<()> {
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(config_path, content)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.max_steps, 10);
        assert_eq!(config.image_output, PathBuf::from("image.png"));
        assert!(config.provider.is_none());
    }

    #[test]
    fn save_and_load_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");

        let config = Config {
            provider: Some("openai".into()),
            model: "gpt-4o-mini".into(),
            max_steps: 7,
            maps_api_key: "maps-key".into(),
            ..Default::default()
        };
        save_config_to(&config, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.provider.as_deref(), Some("openai"));
        assert_eq!(loaded.model, "gpt-4o-mini");
        assert_eq!(loaded.max_steps, 7);
        assert_eq!(loaded.maps_api_key, "maps-key");
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "model = \"mistral\"\n").unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.model, "mistral");
        assert_eq!(loaded.max_steps, 10);
    }

    #[test]
    fn missing_file_mentions_onboarding() {
        let tmp = TempDir::new().unwrap();
        let err = load_config_from(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("gizmo onboard"));
    }
}
