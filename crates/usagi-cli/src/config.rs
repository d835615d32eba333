//! Configuration file management for usagi.
//!
//! Provides a TOML-based config file at `~/.config/usagi/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use usagi_core::llm::OpenAiClient;

/// Model used when nothing else names one.
pub const DEFAULT_MODEL: &str = "codex";

/// Env var naming the model, consulted after the CLI flag.
pub const MODEL_ENV: &str = "USAGI_MODEL";

/// Env var naming the API base URL, consulted after the CLI flag.
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub run: RunSection,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ApiSection {
    /// API base URL, e.g. `https://api.openai.com`.
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RunSection {
    /// Model identifier passed to the generation API.
    pub model: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the usagi config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/usagi` or `~/.config/usagi`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("usagi");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("usagi")
}

/// Return the path to the usagi config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct UsagiConfig {
    pub model: String,
    pub base_url: String,
}

impl UsagiConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - Model: `cli_model` > `USAGI_MODEL` env > `config_file.run.model` > `"codex"`
    /// - Base URL: `OPENAI_BASE_URL` env > `config_file.api.base_url` > `https://api.openai.com`
    pub fn resolve(cli_model: Option<&str>) -> Self {
        let file_config = load_config().ok();

        let model = if let Some(m) = cli_model {
            m.to_string()
        } else if let Ok(m) = std::env::var(MODEL_ENV) {
            m
        } else if let Some(m) = file_config.as_ref().and_then(|c| c.run.model.clone()) {
            m
        } else {
            DEFAULT_MODEL.to_string()
        };

        let base_url = if let Ok(url) = std::env::var(BASE_URL_ENV) {
            url
        } else if let Some(url) = file_config.as_ref().and_then(|c| c.api.base_url.clone()) {
            url
        } else {
            OpenAiClient::DEFAULT_BASE_URL.to_string()
        };

        Self { model, base_url }
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // Env-mutating tests serialize on this lock.
    static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

    fn lock_env() -> std::sync::MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner())
    }

    #[test]
    fn save_and_load_config_roundtrip() {
        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let dir = tmp.path().join("usagi");
        let path = dir.join("config.toml");

        let original = ConfigFile {
            api: ApiSection {
                base_url: Some("https://proxy.example.com".to_string()),
            },
            run: RunSection {
                model: Some("gpt-test".to_string()),
            },
        };

        std::fs::create_dir_all(&dir).unwrap();
        let contents = toml::to_string_pretty(&original).unwrap();
        std::fs::write(&path, &contents).unwrap();

        let loaded_contents = std::fs::read_to_string(&path).unwrap();
        let loaded: ConfigFile = toml::from_str(&loaded_contents).unwrap();

        assert_eq!(loaded.api.base_url, original.api.base_url);
        assert_eq!(loaded.run.model, original.run.model);
    }

    #[test]
    fn partial_config_file_parses_with_defaults() {
        let loaded: ConfigFile = toml::from_str("[run]\nmodel = \"m\"\n").unwrap();
        assert_eq!(loaded.run.model.as_deref(), Some("m"));
        assert!(loaded.api.base_url.is_none());

        let empty: ConfigFile = toml::from_str("").unwrap();
        assert!(empty.run.model.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn save_config_sets_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let _lock = lock_env();
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };

        let result = save_config(&ConfigFile::default());

        let path = tmp.path().join("usagi").join("config.toml");
        let mode = std::fs::metadata(&path).map(|m| m.permissions().mode() & 0o777);

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        result.unwrap();
        assert_eq!(mode.unwrap(), 0o600);
    }

    #[test]
    fn resolve_with_cli_flag_overrides_env() {
        let _lock = lock_env();

        unsafe { std::env::set_var(MODEL_ENV, "env-model") };
        let config = UsagiConfig::resolve(Some("cli-model"));
        unsafe { std::env::remove_var(MODEL_ENV) };

        assert_eq!(config.model, "cli-model");
    }

    #[test]
    fn resolve_env_var_wins_over_defaults() {
        let _lock = lock_env();

        unsafe { std::env::set_var(MODEL_ENV, "env-model") };
        unsafe { std::env::set_var(BASE_URL_ENV, "https://env.example.com") };
        let config = UsagiConfig::resolve(None);
        unsafe { std::env::remove_var(MODEL_ENV) };
        unsafe { std::env::remove_var(BASE_URL_ENV) };

        assert_eq!(config.model, "env-model");
        assert_eq!(config.base_url, "https://env.example.com");
    }

    #[test]
    fn resolve_defaults_when_nothing_set() {
        let _lock = lock_env();

        // Point XDG_CONFIG_HOME at an empty temp dir so no real config
        // file is picked up.
        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        unsafe { std::env::remove_var(MODEL_ENV) };
        unsafe { std::env::remove_var(BASE_URL_ENV) };

        let config = UsagiConfig::resolve(None);

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, OpenAiClient::DEFAULT_BASE_URL);
    }

    #[test]
    fn resolve_reads_the_config_file() {
        let _lock = lock_env();

        let tmp = tempfile::TempDir::new().unwrap();
        let orig_xdg = std::env::var("XDG_CONFIG_HOME").ok();
        unsafe { std::env::set_var("XDG_CONFIG_HOME", tmp.path()) };
        unsafe { std::env::remove_var(MODEL_ENV) };
        unsafe { std::env::remove_var(BASE_URL_ENV) };

        save_config(&ConfigFile {
            api: ApiSection {
                base_url: Some("https://file.example.com".to_string()),
            },
            run: RunSection {
                model: Some("file-model".to_string()),
            },
        })
        .unwrap();

        let config = UsagiConfig::resolve(None);

        match orig_xdg {
            Some(x) => unsafe { std::env::set_var("XDG_CONFIG_HOME", x) },
            None => unsafe { std::env::remove_var("XDG_CONFIG_HOME") },
        }

        assert_eq!(config.model, "file-model");
        assert_eq!(config.base_url, "https://file.example.com");
    }

    #[test]
    fn config_path_ends_with_expected_filename() {
        let path = config_path();
        assert!(
            path.ends_with("usagi/config.toml"),
            "unexpected config path: {}",
            path.display()
        );
    }
}
