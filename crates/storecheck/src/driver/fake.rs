//! Scripted in-memory `BrowserDriver` for page-object tests.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use image::RgbaImage;

use super::BrowserDriver;

#[derive(Clone, Debug)]
pub(crate) struct FakeElement {
    pub text: String,
    pub value: String,
    pub visible: bool,
    pub enabled: bool,
    pub editable: bool,
    pub attrs: HashMap<String, String>,
}

impl FakeElement {
    pub fn text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            value: String::new(),
            visible: true,
            enabled: true,
            editable: false,
            attrs: HashMap::new(),
        }
    }

    pub fn input() -> Self {
        Self {
            editable: true,
            ..Self::text("")
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self.editable = false;
        self
    }

    pub fn value(mut self, value: &str) -> Self {
        self.value = value.to_string();
        self
    }
}

/// State change applied when a scripted action fires.
#[derive(Clone, Debug)]
pub(crate) enum Effect {
    Navigate(String),
    Show(String, FakeElement),
    Remove(String),
    SetList(String, Vec<String>),
    SetText(String, String),
    Dialog(String),
}

#[derive(Default)]
pub(crate) struct FakeDriver {
    url: String,
    elements: HashMap<String, FakeElement>,
    lists: HashMap<String, Vec<String>>,
    attr_lists: HashMap<(String, String), Vec<Option<String>>>,
    on_goto: HashMap<String, Vec<Effect>>,
    on_click: HashMap<String, Vec<Effect>>,
    on_select: HashMap<(String, String), Vec<Effect>>,
    images: HashMap<String, RgbaImage>,
    dialogs: Vec<String>,
    log: Vec<String>,
}

impl FakeDriver {
    pub fn at(url: &str) -> Self {
        Self {
            url: url.to_string(),
            ..Self::default()
        }
    }

    pub fn with(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements.insert(selector.to_string(), element);
        self
    }

    pub fn with_text(self, selector: &str, text: &str) -> Self {
        self.with(selector, FakeElement::text(text))
    }

    pub fn with_list<S: AsRef<str>>(mut self, selector: &str, texts: &[S]) -> Self {
        self.lists.insert(
            selector.to_string(),
            texts.iter().map(|t| t.as_ref().to_string()).collect(),
        );
        self
    }

    pub fn with_attrs(mut self, selector: &str, name: &str, values: &[Option<&str>]) -> Self {
        self.attr_lists.insert(
            (selector.to_string(), name.to_string()),
            values.iter().map(|v| v.map(str::to_string)).collect(),
        );
        self
    }

    pub fn with_image(mut self, selector: &str, image: RgbaImage) -> Self {
        self.images.insert(selector.to_string(), image);
        self
    }

    pub fn on_goto(mut self, url: &str, effects: Vec<Effect>) -> Self {
        self.on_goto.insert(url.to_string(), effects);
        self
    }

    pub fn on_click(mut self, selector: &str, effects: Vec<Effect>) -> Self {
        self.on_click.insert(selector.to_string(), effects);
        self
    }

    pub fn on_select(mut self, selector: &str, value: &str, effects: Vec<Effect>) -> Self {
        self.on_select
            .insert((selector.to_string(), value.to_string()), effects);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn element(&self, selector: &str) -> Option<&FakeElement> {
        self.elements.get(selector)
    }

    /// Every action performed, as `"<verb> <selector>[=<value>]"`.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    fn apply(&mut self, effects: Option<Vec<Effect>>) {
        for effect in effects.unwrap_or_default() {
            match effect {
                Effect::Navigate(url) => self.url = url,
                Effect::Show(selector, element) => {
                    self.elements.insert(selector, element);
                }
                Effect::Remove(selector) => {
                    self.elements.remove(&selector);
                    self.lists.remove(&selector);
                }
                Effect::SetList(selector, texts) => {
                    self.lists.insert(selector, texts);
                }
                Effect::SetText(selector, text) => {
                    if let Some(el) = self.elements.get_mut(&selector) {
                        el.text = text;
                    }
                }
                Effect::Dialog(message) => self.dialogs.push(message),
            }
        }
    }

    fn visible(&self, selector: &str) -> Result<&FakeElement> {
        match self.elements.get(selector) {
            Some(el) if el.visible => Ok(el),
            _ => bail!("Timed out waiting for {selector} to be visible"),
        }
    }

    fn visible_mut(&mut self, selector: &str) -> Result<&mut FakeElement> {
        match self.elements.get_mut(selector) {
            Some(el) if el.visible => Ok(el),
            _ => bail!("Timed out waiting for {selector} to be visible"),
        }
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn goto(&mut self, url: &str) -> Result<()> {
        self.log.push(format!("goto {url}"));
        self.url = url.to_string();
        let effects = self.on_goto.get(url).cloned();
        self.apply(effects);
        Ok(())
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.url.clone())
    }

    async fn wait_for_url(&mut self, url: &str, _timeout: Duration) -> Result<()> {
        if self.url != url {
            bail!("Timed out waiting for URL {url} (at {})", self.url);
        }
        Ok(())
    }

    async fn click(&mut self, selector: &str) -> Result<()> {
        self.visible(selector)?;
        self.log.push(format!("click {selector}"));
        let effects = self.on_click.get(selector).cloned();
        self.apply(effects);
        Ok(())
    }

    async fn fill(&mut self, selector: &str, value: &str) -> Result<()> {
        let el = self.visible_mut(selector)?;
        if !el.editable {
            bail!("{selector} is not editable");
        }
        el.value = value.to_string();
        self.log.push(format!("fill {selector}={value}"));
        Ok(())
    }

    async fn select_option(&mut self, selector: &str, value: &str) -> Result<()> {
        self.visible(selector)?;
        self.log.push(format!("select {selector}={value}"));
        let effects = self
            .on_select
            .get(&(selector.to_string(), value.to_string()))
            .cloned();
        self.apply(effects);
        Ok(())
    }

    async fn value(&mut self, selector: &str) -> Result<String> {
        Ok(self.visible(selector)?.value.clone())
    }

    async fn text(&mut self, selector: &str) -> Result<String> {
        Ok(self.visible(selector)?.text.clone())
    }

    async fn texts(&mut self, selector: &str) -> Result<Vec<String>> {
        if let Some(list) = self.lists.get(selector) {
            return Ok(list.clone());
        }
        Ok(self
            .elements
            .get(selector)
            .map(|el| vec![el.text.clone()])
            .unwrap_or_default())
    }

    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>> {
        if let Some(el) = self.elements.get(selector) {
            return Ok(el.attrs.get(name).cloned());
        }
        Ok(self
            .attr_lists
            .get(&(selector.to_string(), name.to_string()))
            .and_then(|values| values.first().cloned().flatten()))
    }

    async fn attributes(&mut self, selector: &str, name: &str) -> Result<Vec<Option<String>>> {
        Ok(self
            .attr_lists
            .get(&(selector.to_string(), name.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn is_visible(&mut self, selector: &str) -> Result<bool> {
        Ok(self.elements.get(selector).is_some_and(|el| el.visible))
    }

    async fn is_editable(&mut self, selector: &str) -> Result<bool> {
        Ok(self.visible(selector)?.editable)
    }

    async fn is_enabled(&mut self, selector: &str) -> Result<bool> {
        Ok(self.visible(selector)?.enabled)
    }

    async fn wait_visible(&mut self, selector: &str, _timeout: Duration) -> Result<()> {
        self.visible(selector)?;
        Ok(())
    }

    async fn screenshot(&mut self, selector: &str, path: &Path) -> Result<()> {
        self.visible(selector)?;
        let image = self
            .images
            .get(selector)
            .with_context(|| format!("No image scripted for {selector}"))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        image.save(path)?;
        self.log.push(format!("screenshot {selector}"));
        Ok(())
    }

    fn take_dialogs(&mut self) -> Vec<String> {
        std::mem::take(&mut self.dialogs)
    }
}
