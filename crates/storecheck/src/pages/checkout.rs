use anyhow::{Context, Result};

use super::items::{CART_ITEM, read_items};
use super::{CART_LINK, NAVIGATION_TIMEOUT, data_test};
use crate::driver::BrowserDriver;
use crate::model::{CheckoutForm, InventoryItem, parse_price};

pub const FIRST_NAME: &str = r#"[data-test="firstName"]"#;
pub const LAST_NAME: &str = r#"[data-test="lastName"]"#;
pub const POSTAL_CODE: &str = r#"[data-test="postalCode"]"#;
pub const CONTINUE: &str = r#"[data-test="continue"]"#;
pub const CANCEL: &str = r#"[data-test="cancel"]"#;
pub const FINISH: &str = r#"[data-test="finish"]"#;
pub const CHECKOUT: &str = r#"[data-test="checkout"]"#;
pub const COMPLETE_HEADER: &str = r#"[data-test="complete-header"]"#;
pub const BACK_TO_PRODUCTS: &str = r#"[data-test="back-to-products"]"#;

pub const DETAIL_NAME: &str = r#"[data-test="inventory-item-name"]"#;
pub const DETAIL_DESCRIPTION: &str = r#"[data-test="inventory-item-desc"]"#;
pub const DETAIL_PRICE: &str = r#"[data-test="inventory-item-price"]"#;
pub const DETAIL_ADD: &str = r#"[data-test="add-to-cart"]"#;

const FORM_FIELDS: [&str; 3] = [FIRST_NAME, LAST_NAME, POSTAL_CODE];

pub(crate) fn title_link(id: &str) -> String {
    data_test(&format!("item-{id}-title-link"))
}

/// Product detail → cart → checkout form → overview → confirmation.
pub struct CheckoutFlow<'a> {
    driver: &'a mut dyn BrowserDriver,
}

impl<'a> CheckoutFlow<'a> {
    pub fn new(driver: &'a mut dyn BrowserDriver) -> Self {
        Self { driver }
    }

    /// Open a product's detail page from the listing.
    pub async fn open_item(&mut self, id: &str) -> Result<()> {
        self.driver.click(&title_link(id)).await?;
        self.driver
            .wait_visible(BACK_TO_PRODUCTS, NAVIGATION_TIMEOUT)
            .await
    }

    pub async fn product_name(&mut self) -> Result<String> {
        self.driver.text(DETAIL_NAME).await
    }

    pub async fn product_description(&mut self) -> Result<String> {
        self.driver.text(DETAIL_DESCRIPTION).await
    }

    pub async fn product_price(&mut self) -> Result<f64> {
        parse_price(&self.driver.text(DETAIL_PRICE).await?)
    }

    /// Add the product shown on the detail page.
    pub async fn add_to_cart(&mut self) -> Result<()> {
        self.driver.click(DETAIL_ADD).await
    }

    pub async fn go_to_cart(&mut self) -> Result<()> {
        self.driver.click(CART_LINK).await
    }

    pub async fn start_checkout(&mut self) -> Result<()> {
        self.driver.click(CHECKOUT).await
    }

    /// Fill all three fields; empty values leave the field blank.
    pub async fn fill_form(&mut self, form: &CheckoutForm) -> Result<()> {
        self.driver.fill(FIRST_NAME, &form.first_name).await?;
        self.driver.fill(LAST_NAME, &form.last_name).await?;
        self.driver.fill(POSTAL_CODE, &form.postal_code).await
    }

    pub async fn form_fields_visible(&mut self) -> Result<bool> {
        for field in FORM_FIELDS {
            if !self.driver.is_visible(field).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn form_fields_editable(&mut self) -> Result<bool> {
        for field in FORM_FIELDS {
            if !self.driver.is_editable(field).await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub async fn continue_to_overview(&mut self) -> Result<()> {
        self.driver.click(CONTINUE).await
    }

    pub async fn is_continue_visible(&mut self) -> Result<bool> {
        self.driver.is_visible(CONTINUE).await
    }

    pub async fn is_continue_enabled(&mut self) -> Result<bool> {
        self.driver.is_enabled(CONTINUE).await
    }

    pub async fn cancel(&mut self) -> Result<()> {
        self.driver.click(CANCEL).await
    }

    pub async fn finish(&mut self) -> Result<()> {
        self.driver.click(FINISH).await
    }

    pub async fn confirmation_message(&mut self) -> Result<String> {
        self.driver
            .text(COMPLETE_HEADER)
            .await
            .context("Order confirmation message not found")
    }

    pub async fn back_home(&mut self) -> Result<()> {
        self.driver.click(BACK_TO_PRODUCTS).await
    }

    pub async fn error_message(&mut self) -> Result<String> {
        self.driver.text(&data_test("error")).await
    }

    pub async fn current_url(&mut self) -> Result<String> {
        self.driver.current_url().await
    }

    /// Items listed on the checkout overview.
    pub async fn overview_items(&mut self) -> Result<Vec<InventoryItem>> {
        read_items(self.driver, CART_ITEM, false).await
    }
}
