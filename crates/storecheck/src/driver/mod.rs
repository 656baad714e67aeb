pub mod cdp;
#[cfg(test)]
pub(crate) mod fake;
mod scripts;

use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

pub use self::cdp::CdpBrowser;

/// What page objects need from a browser tab.
///
/// Actions (`click`, `fill`, `select_option`, `text`, ...) first wait up to
/// the driver's action timeout for their target to become visible. Queries
/// over many elements (`texts`, `attributes`) and the `is_*` probes never
/// wait: they report what is on the page right now.
///
/// JavaScript dialogs are accepted as they open; `take_dialogs` returns the
/// messages seen since the previous call.
#[async_trait]
pub trait BrowserDriver: Send {
    /// Navigate and wait for the load event.
    async fn goto(&mut self, url: &str) -> Result<()>;

    async fn current_url(&mut self) -> Result<String>;

    /// Wait until the location is exactly `url`.
    async fn wait_for_url(&mut self, url: &str, timeout: Duration) -> Result<()>;

    async fn click(&mut self, selector: &str) -> Result<()>;

    /// Replace an input's value.
    async fn fill(&mut self, selector: &str, value: &str) -> Result<()>;

    /// Choose a `<select>` option by its `value`.
    async fn select_option(&mut self, selector: &str, value: &str) -> Result<()>;

    /// Current `value` of a form control.
    async fn value(&mut self, selector: &str) -> Result<String>;

    /// Rendered text of the first match.
    async fn text(&mut self, selector: &str) -> Result<String>;

    /// Rendered text of every match, in document order. Empty when nothing
    /// matches.
    async fn texts(&mut self, selector: &str) -> Result<Vec<String>>;

    /// Attribute of the first match; `None` when there is no match or no
    /// such attribute.
    async fn attribute(&mut self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Attribute of every match, in document order.
    async fn attributes(&mut self, selector: &str, name: &str) -> Result<Vec<Option<String>>>;

    async fn is_visible(&mut self, selector: &str) -> Result<bool>;

    async fn is_editable(&mut self, selector: &str) -> Result<bool>;

    async fn is_enabled(&mut self, selector: &str) -> Result<bool>;

    /// Wait until the selector matches a visible element.
    async fn wait_visible(&mut self, selector: &str, timeout: Duration) -> Result<()>;

    /// Write a PNG of the first match's bounding box to `path`, creating
    /// parent directories.
    async fn screenshot(&mut self, selector: &str, path: &Path) -> Result<()>;

    fn take_dialogs(&mut self) -> Vec<String>;
}

/// Source of fresh tabs for the scenario runner.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Open a tab; returns its id and a driver bound to it.
    async fn open_tab(&self) -> Result<(String, Box<dyn BrowserDriver>)>;

    /// Close a tab whose driver has already been dropped.
    async fn close_tab(&self, tab_id: &str) -> Result<()>;
}
