use anyhow::{Context, Result};

use super::inventory::remove_button;
use super::items::{self, CART_ITEM, read_items};
use super::cart_badge_count;
use crate::driver::BrowserDriver;
use crate::model::{InventoryItem, parse_price};

pub struct CartPage<'a> {
    driver: &'a mut dyn BrowserDriver,
}

impl<'a> CartPage<'a> {
    pub fn new(driver: &'a mut dyn BrowserDriver) -> Self {
        Self { driver }
    }

    pub async fn items(&mut self) -> Result<Vec<InventoryItem>> {
        read_items(self.driver, CART_ITEM, false).await
    }

    pub async fn contains(&mut self, item: &InventoryItem) -> Result<bool> {
        Ok(self.position(item).await?.is_some())
    }

    pub async fn item_name(&mut self, item: &InventoryItem) -> Result<String> {
        self.field(item, &items::name_selector(CART_ITEM)).await
    }

    pub async fn item_description(&mut self, item: &InventoryItem) -> Result<String> {
        self.field(item, &items::description_selector(CART_ITEM)).await
    }

    pub async fn item_price(&mut self, item: &InventoryItem) -> Result<f64> {
        let text = self.field(item, &items::price_selector(CART_ITEM)).await?;
        parse_price(&text)
    }

    pub async fn remove(&mut self, item: &InventoryItem) -> Result<()> {
        self.driver.click(&remove_button(item)).await
    }

    pub async fn badge_count(&mut self) -> Result<u32> {
        cart_badge_count(self.driver).await
    }

    /// Row index of `item` in the cart, matched by name.
    async fn position(&mut self, item: &InventoryItem) -> Result<Option<usize>> {
        let names = self.driver.texts(&items::name_selector(CART_ITEM)).await?;
        Ok(names.iter().position(|n| n.trim() == item.name))
    }

    async fn field(&mut self, item: &InventoryItem, selector: &str) -> Result<String> {
        let idx = self
            .position(item)
            .await?
            .with_context(|| format!("'{}' is not in the cart", item.name))?;
        let values = self.driver.texts(selector).await?;
        values
            .into_iter()
            .nth(idx)
            .with_context(|| format!("Cart row of '{}' has no {selector}", item.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{Effect, FakeDriver};
    use crate::pages::items::tests::{ROWS, listing};

    fn item(name: &str) -> InventoryItem {
        InventoryItem {
            id: String::new(),
            name: name.into(),
            description: String::new(),
            price: 0.0,
            image_src: None,
        }
    }

    #[tokio::test]
    async fn details_are_read_from_matching_row() {
        let mut driver = listing(FakeDriver::at("x"), CART_ITEM, &ROWS, false);
        let mut cart = CartPage::new(&mut driver);
        let light = item("Sauce Labs Bike Light");

        assert!(cart.contains(&light).await.unwrap());
        assert_eq!(cart.item_name(&light).await.unwrap(), "Sauce Labs Bike Light");
        assert_eq!(
            cart.item_description(&light).await.unwrap(),
            "About Sauce Labs Bike Light"
        );
        assert_eq!(cart.item_price(&light).await.unwrap(), 9.99);
    }

    #[tokio::test]
    async fn absent_item_is_reported() {
        let mut driver = listing(FakeDriver::at("x"), CART_ITEM, &ROWS[..1], false);
        let mut cart = CartPage::new(&mut driver);
        let onesie = item("Sauce Labs Onesie");
        assert!(!cart.contains(&onesie).await.unwrap());
        let err = cart.item_price(&onesie).await.unwrap_err();
        assert!(err.to_string().contains("not in the cart"));
    }

    #[tokio::test]
    async fn remove_clicks_row_button() {
        let backpack = item("Sauce Labs Backpack");
        let remove = remove_button(&backpack);
        let names = items::name_selector(CART_ITEM);
        let mut driver = listing(FakeDriver::at("x"), CART_ITEM, &ROWS[..1], false)
            .with_text(&remove, "Remove")
            .on_click(&remove, vec![Effect::Remove(names)]);

        let mut cart = CartPage::new(&mut driver);
        cart.remove(&backpack).await.unwrap();
        assert!(!cart.contains(&backpack).await.unwrap());
        assert_eq!(cart.badge_count().await.unwrap(), 0);
    }
}
