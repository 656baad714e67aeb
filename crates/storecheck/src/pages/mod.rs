//! Page objects: storefront selectors and the user actions built on them.
//!
//! Each page object borrows the scenario's driver for as long as it is used;
//! create them on demand (`ctx.login()`, `ctx.inventory()`, ...).

pub mod cart;
pub mod checkout;
pub mod images;
pub mod inventory;
pub mod items;
pub mod login;

use std::time::Duration;

use anyhow::{Context, Result};

use crate::driver::BrowserDriver;
use crate::model::{Credentials, Persona};

pub use self::cart::CartPage;
pub use self::checkout::CheckoutFlow;
pub use self::images::ImageFlow;
pub use self::inventory::InventoryPage;
pub use self::login::LoginPage;

/// Upper bound for route changes (the glitch persona takes ~5s to log in).
pub const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) const CART_BADGE: &str = ".shopping_cart_badge";
pub(crate) const CART_LINK: &str = r#"[data-test="shopping-cart-link"]"#;

pub const INVENTORY_PATH: &str = "/inventory.html";
pub const CART_PATH: &str = "/cart.html";
pub const CHECKOUT_OVERVIEW_PATH: &str = "/checkout-step-two.html";

/// The storefront under test.
#[derive(Clone, Debug)]
pub struct Site {
    base_url: String,
    password: String,
}

impl Site {
    pub fn new(base_url: &str, password: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            password: password.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Landing (login) page, with the trailing slash browsers report.
    pub fn home(&self) -> String {
        self.url("/")
    }

    /// Absolute URL for a path on the site.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    pub fn credentials(&self, persona: Persona) -> Credentials {
        persona.credentials(&self.password)
    }
}

/// `[data-test="<id>"]`.
pub(crate) fn data_test(id: &str) -> String {
    format!(r#"[data-test="{id}"]"#)
}

/// Number on the header cart badge; 0 when the badge is absent.
pub(crate) async fn cart_badge_count(driver: &mut dyn BrowserDriver) -> Result<u32> {
    let texts = driver.texts(CART_BADGE).await?;
    match texts.first().map(|t| t.trim()) {
        None | Some("") => Ok(0),
        Some(text) => text
            .parse()
            .with_context(|| format!("Cart badge shows '{text}', not a number")),
    }
}
