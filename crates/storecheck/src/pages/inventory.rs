use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use tracing::debug;

use super::items::{self, INVENTORY_ITEM, read_items};
use super::{CART_LINK, CART_PATH, INVENTORY_PATH, NAVIGATION_TIMEOUT, Site, cart_badge_count, data_test};
use crate::driver::BrowserDriver;
use crate::model::{InventoryItem, SortOrder, parse_price, slug};

pub const SORT_SELECT: &str = r#"[data-test="product-sort-container"]"#;

/// Delay between checks while waiting for a re-sort.
const SORT_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) fn add_button(item: &InventoryItem) -> String {
    data_test(&format!("add-to-cart-{}", slug(&item.name)))
}

pub(crate) fn remove_button(item: &InventoryItem) -> String {
    data_test(&format!("remove-{}", slug(&item.name)))
}

pub struct InventoryPage<'a> {
    driver: &'a mut dyn BrowserDriver,
    site: &'a Site,
}

impl<'a> InventoryPage<'a> {
    pub fn new(driver: &'a mut dyn BrowserDriver, site: &'a Site) -> Self {
        Self { driver, site }
    }

    pub async fn navigate(&mut self) -> Result<()> {
        self.driver.goto(&self.site.url(INVENTORY_PATH)).await
    }

    pub async fn items(&mut self) -> Result<Vec<InventoryItem>> {
        read_items(self.driver, INVENTORY_ITEM, true).await
    }

    pub async fn add_to_cart(&mut self, item: &InventoryItem) -> Result<()> {
        self.driver.click(&add_button(item)).await
    }

    pub async fn remove_from_cart(&mut self, item: &InventoryItem) -> Result<()> {
        self.driver.click(&remove_button(item)).await
    }

    pub async fn cart_badge_count(&mut self) -> Result<u32> {
        cart_badge_count(self.driver).await
    }

    pub async fn go_to_cart(&mut self) -> Result<()> {
        self.driver.click(CART_LINK).await?;
        self.driver
            .wait_for_url(&self.site.url(CART_PATH), NAVIGATION_TIMEOUT)
            .await
    }

    /// Pick a sort option. Does not wait for the list to change.
    pub async fn sort(&mut self, order: SortOrder) -> Result<()> {
        self.driver.select_option(SORT_SELECT, order.value()).await
    }

    /// Value of the currently selected sort option.
    pub async fn selected_sort(&mut self) -> Result<String> {
        self.driver.value(SORT_SELECT).await
    }

    pub async fn item_names(&mut self) -> Result<Vec<String>> {
        self.driver
            .texts(&items::name_selector(INVENTORY_ITEM))
            .await
    }

    pub async fn item_prices(&mut self) -> Result<Vec<f64>> {
        self.driver
            .texts(&items::price_selector(INVENTORY_ITEM))
            .await?
            .iter()
            .map(|p| parse_price(p))
            .collect()
    }

    /// Whether the listing currently follows `order`.
    pub async fn is_sorted(&mut self, order: SortOrder) -> Result<bool> {
        if order.by_price() {
            Ok(order.prices_sorted(&self.item_prices().await?))
        } else {
            Ok(order.names_sorted(&self.item_names().await?))
        }
    }

    /// Poll until the listing follows `order`; returns how long it took.
    pub async fn wait_sorted(&mut self, order: SortOrder, timeout: Duration) -> Result<Duration> {
        let start = Instant::now();
        loop {
            if self.is_sorted(order).await? {
                let elapsed = start.elapsed();
                debug!(order = %order, elapsed_ms = elapsed.as_millis() as u64, "listing sorted");
                return Ok(elapsed);
            }
            if start.elapsed() >= timeout {
                bail!(
                    "Listing not sorted by '{order}' after {}ms",
                    timeout.as_millis()
                );
            }
            tokio::time::sleep(SORT_POLL_INTERVAL).await;
        }
    }
}
