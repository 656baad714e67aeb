use anyhow::{Result, bail};

use crate::config;

/// `storecheck init`: create .storecheck/config.toml.
pub fn init(url: &str, force: bool) -> Result<()> {
    if !force && config::config_file_exists() {
        bail!(".storecheck/config.toml already exists (use --force to overwrite)");
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("--url must be an http(s) URL, got '{url}'");
    }

    config::write_template(url)?;
    config::write_gitignore(force)?;

    let verb = if force { "Regenerated" } else { "Created" };
    println!("{verb} .storecheck/config.toml");
    println!("  site.base_url = {url}");
    Ok(())
}
