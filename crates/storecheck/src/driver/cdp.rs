use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{Browser, BrowserDriver};
use super::scripts::{self, js_string, render, with_helpers};
use crate::artifacts;
use crate::cdp::{CdpConnection, Chrome, ClipRect};
use crate::config::BrowserSettings;

/// Owns a Chrome instance and hands out one `CdpDriver` per tab.
pub struct CdpBrowser {
    chrome: Chrome,
    viewport_width: u32,
    viewport_height: u32,
    action_timeout: Duration,
}

impl CdpBrowser {
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let chrome = match &settings.chrome_url {
            Some(url) => Chrome::connect(url)
                .await
                .with_context(|| format!("Failed to connect to remote Chrome at {url}"))?,
            None => Chrome::launch(&settings.launch)
                .await
                .context("Failed to launch Chrome")?,
        };
        Ok(Self {
            chrome,
            viewport_width: settings.viewport_width,
            viewport_height: settings.viewport_height,
            action_timeout: settings.action_timeout,
        })
    }

    /// Open a fresh tab with the configured viewport.
    pub async fn new_driver(&self) -> Result<CdpDriver> {
        let (target_id, ws_url) = self.chrome.create_tab().await?;
        debug!(target_id = %target_id, ws_url = %ws_url, "connecting to tab");
        let mut conn = CdpConnection::connect(&ws_url).await?;
        conn.enable_domains().await?;
        conn.set_viewport(self.viewport_width, self.viewport_height)
            .await?;
        debug!(target_id = %target_id, "tab ready");
        Ok(CdpDriver {
            conn,
            target_id,
            action_timeout: self.action_timeout,
        })
    }
}

#[async_trait]
impl Browser for CdpBrowser {
    async fn open_tab(&self) -> Result<(String, Box<dyn BrowserDriver>)> {
        let driver = self.new_driver().await?;
        Ok((driver.target_id.clone(), Box::new(driver)))
    }

    async fn close_tab(&self, tab_id: &str) -> Result<()> {
        self.chrome.close_tab(tab_id).await
    }
}

/// `BrowserDriver` over one tab's CDP connection.
pub struct CdpDriver {
    conn: CdpConnection,
    target_id: String,
    action_timeout: Duration,
}

impl CdpDriver {
    /// Wait for the target, then run `template` against it.
    async fn act(&mut self, selector: &str, template: &str, extra: &[(&str, String)]) -> Result<Value> {
        self.wait_visible(selector, self.action_timeout).await?;
        self.conn
            .eval(&render(template, selector, extra))
            .await
            .with_context(|| format!("Action on {selector} failed"))
    }

    async fn query(&mut self, selector: &str, template: &str, extra: &[(&str, String)]) -> Result<Value> {
        self.conn.eval(&render(template, selector, extra)).await
    }
}

#[derive(Deserialize)]
struct ElementBounds {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

fn parse_bounds(value: Value) -> Result<ClipRect> {
    let bounds: ElementBounds =
        serde_json::from_value(value).context("Failed to parse element bounds")?;
    Ok(ClipRect {
        x: bounds.x,
        y: bounds.y,
        w: bounds.width.max(1.0),
        h: bounds.height.max(1.0),
    })
}

fn as_string(value: Value, what: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s),
        other => bail!("Expected a string for {what}, got {other}"),
    }
}

fn as_bool(value: &Value, what: &str) -> Result<bool> {
    value
        .as_bool()
        .with_context(|| format!("Expected a boolean for {what}, got {value}"))
}

fn as_string_list(value: Value, what: &str) -> Result<Vec<Option<String>>> {
    let Value::Array(items) = value else {
        bail!("Expected a list for {what}, got {value}");
    };
    Ok(items
        .into_iter()
        .map(|v| match v {
            Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}

fn millis(timeout: Duration) -> String {
    timeout.as_millis().to_string()
}

#[async_trait]
impl BrowserDriver for CdpDriver {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.conn.navigate(url).await
    }

    async fn current_url(&mut self) -> Result<String> {
        let value = self.conn.eval(scripts::LOCATION_JS).await?;
        as_string(value, "location.href")
    }

    async fn wait_for_url(&mut self, url: &str, timeout: Duration) -> Result<()> {
        let js = scripts::WAIT_URL_JS
            .replace("__URL__", &js_string(url))
            .replace("__TIMEOUT__", &millis(timeout));
        self.conn.eval_async(&js).await?;
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        debug!(selector, "click");
        self.act(selector, scripts::CLICK_JS, &[]).await?;
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        debug!(selector, "fill");
        self.act(selector, scripts::FILL_JS, &[("__VALUE__", js_string(value))])
            .await?;
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        debug!(selector, value, "select_option");
        self.act(
            selector,
            scripts::SELECT_OPTION_JS,
            &[("__VALUE__", js_string(value))],
        )
        .await?;
        Ok(())
    }

    async fn value(&mut self, selector: &str) -> Result<String> {
        let value = self.act(selector, scripts::VALUE_JS, &[]).await?;
        as_string(value, selector)
    }

    async fn text(&mut self, selector: &str) -> Result<String> {
        let value = self.act(selector, scripts::INNER_TEXT_JS, &[]).await?;
        as_string(value, selector)
    }

    async fn texts(&mut self, selector: &str) -> Result<Vec<String>> {
        let value = self.query(selector, scripts::ALL_INNER_TEXT_JS, &[]).await?;
        Ok(as_string_list(value, selector)?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    }

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>> {
        let value = self
            .query(selector, scripts::ATTRIBUTE_JS, &[("__NAME__", js_string(name))])
            .await?;
        Ok(match value {
            Value::String(s) => Some(s),
            _ => None,
        })
    }

    async fn attributes(&mut self, selector: &str, name: &str) -> Result<Vec<Option<String>>> {
        let value = self
            .query(
                selector,
                scripts::ALL_ATTRIBUTES_JS,
                &[("__NAME__", js_string(name))],
            )
            .await?;
        as_string_list(value, selector)
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool> {
        let value = self
            .query(selector, &with_helpers(scripts::IS_VISIBLE_JS), &[])
            .await?;
        as_bool(&value, selector)
    }

    async fn is_editable(&mut self, selector: &str) -> Result<bool> {
        let value = self.act(selector, scripts::IS_EDITABLE_JS, &[]).await?;
        as_bool(&value, selector)
    }

    async fn is_enabled(&mut self, selector: &str) -> Result<bool> {
        let value = self.act(selector, scripts::IS_ENABLED_JS, &[]).await?;
        as_bool(&value, selector)
    }

    async fn wait_visible(&mut self, selector: &str, timeout: Duration) -> Result<()> {
        let js = render(
            &with_helpers(scripts::WAIT_VISIBLE_JS),
            selector,
            &[("__TIMEOUT__", millis(timeout))],
        );
        self.conn.eval_async(&js).await?;
        Ok(())
    }

    async fn screenshot(&mut self, selector: &str, path: &Path) -> Result<()> {
        self.wait_visible(selector, self.action_timeout).await?;
        let bounds = self
            .conn
            .eval_async(&render(scripts::ELEMENT_BOUNDS_JS, selector, &[]))
            .await?;
        let clip = parse_bounds(bounds)?;
        debug!(selector, x = clip.x, y = clip.y, w = clip.w, h = clip.h, "element screenshot");
        let png = self.conn.capture_screenshot(&clip).await?;
        artifacts::write_file(path, &png)
    }

    fn take_dialogs(&mut self) -> Vec<String> {
        self.conn.take_dialogs()
    }
}
