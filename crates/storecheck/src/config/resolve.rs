use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use super::{BrowserConfig, Config, DEFAULT_BASE_URL, DiffConfig, load, validate_threshold};
use crate::artifacts;
use crate::cdp::LaunchOptions;
use crate::compare::{CompareOptions, DEFAULT_THRESHOLD, Engine};
use crate::model::DEFAULT_PASSWORD;
use crate::pages::Site;

pub const ENV_BASE_URL: &str = "STORECHECK_BASE_URL";
pub const ENV_DIFF_THRESHOLD: &str = "STORECHECK_DIFF_THRESHOLD";
pub const ENV_CHROME_URL: &str = "STORECHECK_CHROME_URL";

const DEFAULT_SCENARIO_TIMEOUT_SECS: u64 = 60;

/// Values extracted from the CLI that participate in the merge.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub url: Option<String>,
    pub threshold: Option<f64>,
    pub engine: Option<Engine>,
    pub include_aa: bool,
    pub browser: BrowserConfig,
}

/// Browser settings with every default applied.
#[derive(Clone, Debug)]
pub struct BrowserSettings {
    pub parallel: usize,
    pub chrome_url: Option<String>,
    pub launch: LaunchOptions,
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub action_timeout: Duration,
}

/// Fully resolved config after CLI > env > file > defaults merge.
#[derive(Debug)]
pub struct ResolvedRunConfig {
    pub site: Site,
    pub browser: BrowserSettings,
    pub compare: CompareOptions,
    pub scenario_timeout: Duration,
    pub artifacts_dir: PathBuf,
}

impl ResolvedRunConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file_config = load()?;
        Self::resolve(cli, file_config, |key| std::env::var(key).ok())
    }

    /// Merge the layers; `env` looks up environment variables.
    pub fn resolve(
        cli: CliOverrides,
        file_config: Config,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        // 1. Site: CLI > env > file > default
        let base_url = cli
            .url
            .or_else(|| env(ENV_BASE_URL))
            .or(file_config.site.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            bail!("Base URL must be an http(s) URL, got '{base_url}'");
        }
        let password = file_config
            .site
            .password
            .unwrap_or_else(|| DEFAULT_PASSWORD.to_owned());
        let site = Site::new(&base_url, &password);

        // 2. Comparison
        let compare = compare_options(
            &file_config.diff,
            env(ENV_DIFF_THRESHOLD),
            cli.threshold,
            cli.engine,
            cli.include_aa,
        )?;

        // 3. Browser: file base, env, then CLI overlay
        let mut browser = file_config.browser;
        if let Some(url) = env(ENV_CHROME_URL) {
            browser.chrome_url = Some(url);
        }
        browser.merge(&cli.browser);
        let (viewport_width, viewport_height) = browser.viewport();
        if viewport_width == 0 || viewport_height == 0 {
            bail!(
                "Viewport has invalid dimensions ({viewport_width}x{viewport_height}). \
                 Both width and height must be > 0"
            );
        }
        if browser.parallel() == 0 {
            bail!("--parallel must be at least 1");
        }
        let browser = BrowserSettings {
            parallel: browser.parallel(),
            action_timeout: Duration::from_millis(browser.action_timeout_ms()),
            launch: LaunchOptions {
                executable: browser.chrome_path,
                headful: browser.headful.unwrap_or(false),
            },
            chrome_url: browser.chrome_url,
            viewport_width,
            viewport_height,
        };

        // 4. Run
        let scenario_timeout = Duration::from_secs(
            file_config
                .run
                .scenario_timeout_secs
                .unwrap_or(DEFAULT_SCENARIO_TIMEOUT_SECS),
        );
        let artifacts_dir = file_config
            .run
            .artifacts_dir
            .unwrap_or_else(artifacts::default_root);

        Ok(Self {
            site,
            browser,
            compare,
            scenario_timeout,
            artifacts_dir,
        })
    }
}

/// Comparison options from CLI > env threshold > `[diff]` > defaults.
pub fn compare_options(
    file: &DiffConfig,
    env_threshold: Option<String>,
    threshold: Option<f64>,
    engine: Option<Engine>,
    include_aa: bool,
) -> Result<CompareOptions> {
    let env_threshold: Option<f64> = env_threshold
        .map(|v| v.trim().parse::<f64>())
        .transpose()
        .with_context(|| format!("{ENV_DIFF_THRESHOLD} must be a valid float"))?;
    let threshold = threshold
        .or(env_threshold)
        .or(file.threshold)
        .unwrap_or(DEFAULT_THRESHOLD);
    validate_threshold(threshold).map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(CompareOptions {
        threshold,
        include_aa: include_aa || file.include_aa.unwrap_or(false),
        engine: engine.or(file.engine).unwrap_or_default(),
    })
}
