pub mod browser;
pub mod resolve;
pub mod template;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::compare::Engine;

pub use self::browser::BrowserConfig;
pub use self::resolve::{BrowserSettings, CliOverrides, ResolvedRunConfig};
pub use self::template::{config_file_exists, write_gitignore, write_template};

pub(crate) use crate::artifacts::BASE_DIR as CONFIG_DIR;
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_BASE_URL: &str = "https://www.saucedemo.com";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Password shared by every persona.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiffConfig {
    /// Per-pixel sensitivity (0.0-1.0). Lower is more sensitive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<Engine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_aa: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts_dir: Option<PathBuf>,
}

pub fn validate_threshold(v: f64) -> Result<f64, String> {
    if !(0.0..=1.0).contains(&v) {
        return Err(format!("threshold must be between 0.0 and 1.0, got {v}"));
    }
    Ok(v)
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub run: RunConfig,
}

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        if let Some(threshold) = config.diff.threshold {
            validate_threshold(threshold).map_err(|e| anyhow::anyhow!("diff.{e}"))?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Validate semantic constraints that serde cannot express.
    fn validate(&self) -> Result<()> {
        let (width, height) = self.browser.viewport();
        if width == 0 || height == 0 {
            bail!(
                "Viewport has invalid dimensions ({width}x{height}). \
                 Both browser.viewport_width and browser.viewport_height must be > 0"
            );
        }
        if self.browser.parallel() == 0 {
            bail!("browser.parallel must be at least 1");
        }
        if self.run.scenario_timeout_secs == Some(0) {
            bail!("run.scenario_timeout_secs must be at least 1");
        }
        if let Some(url) = &self.site.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                bail!("site.base_url must be an http(s) URL, got '{url}'");
            }
        }
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    Path::new(CONFIG_DIR).join(CONFIG_FILE)
}

/// Read `.storecheck/config.toml`; a missing file means all defaults.
pub fn load() -> Result<Config> {
    let path = config_path();
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Config::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::parse("").unwrap();
        assert!(config.site.base_url.is_none());
        assert!(config.diff.threshold.is_none());
        assert_eq!(config.browser.parallel(), 4);
    }

    #[test]
    fn sections_parse() {
        let config = Config::parse(
            r#"
            [site]
            base_url = "http://localhost:3000"
            password = "pw"

            [browser]
            parallel = 2
            viewport_width = 1280

            [diff]
            threshold = 0.2
            engine = "dify"
            include_aa = true

            [run]
            scenario_timeout_secs = 30
            artifacts_dir = "out"
            "#,
        )
        .unwrap();
        assert_eq!(config.site.base_url.as_deref(), Some("http://localhost:3000"));
        assert_eq!(config.browser.viewport(), (1280, 768));
        assert_eq!(config.diff.engine, Some(Engine::Dify));
        assert_eq!(config.diff.include_aa, Some(true));
        assert_eq!(config.run.artifacts_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn threshold_out_of_range_is_rejected() {
        let err = Config::parse("[diff]\nthreshold = 1.5").unwrap_err();
        assert!(err.to_string().contains("diff.threshold must be between"));
    }

    #[test]
    fn zero_viewport_is_rejected() {
        let err = Config::parse("[browser]\nviewport_height = 0").unwrap_err();
        assert!(err.to_string().contains("invalid dimensions (1366x0)"));
    }

    #[test]
    fn unknown_engine_is_rejected() {
        assert!(Config::parse("[diff]\nengine = \"ssim\"").is_err());
    }

    #[test]
    fn base_url_must_be_http() {
        assert!(Config::parse("[site]\nbase_url = \"saucedemo.com\"").is_err());
    }
}
