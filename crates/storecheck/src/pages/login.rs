use anyhow::Result;

use super::{INVENTORY_PATH, NAVIGATION_TIMEOUT, Site, data_test};
use crate::driver::BrowserDriver;
use crate::model::Credentials;

pub const USERNAME: &str = "#user-name";
pub const PASSWORD: &str = "#password";
pub const LOGIN_BUTTON: &str = "#login-button";
pub const INVENTORY_LIST: &str = ".inventory_list";
pub const MENU_BUTTON: &str = "#react-burger-menu-btn";
pub const LOGOUT_LINK: &str = "#logout_sidebar_link";

pub fn error_selector() -> String {
    data_test("error")
}

pub struct LoginPage<'a> {
    driver: &'a mut dyn BrowserDriver,
    site: &'a Site,
}

impl<'a> LoginPage<'a> {
    pub fn new(driver: &'a mut dyn BrowserDriver, site: &'a Site) -> Self {
        Self { driver, site }
    }

    pub async fn navigate(&mut self) -> Result<()> {
        self.driver.goto(&self.site.home()).await
    }

    /// Fill both fields (empty strings included) and submit.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.driver.fill(USERNAME, &credentials.username).await?;
        self.driver.fill(PASSWORD, &credentials.password).await?;
        self.driver.click(LOGIN_BUTTON).await
    }

    /// Wait for the post-login redirect and the product list.
    pub async fn wait_for_inventory(&mut self) -> Result<()> {
        self.driver
            .wait_for_url(&self.site.url(INVENTORY_PATH), NAVIGATION_TIMEOUT)
            .await?;
        self.driver
            .wait_visible(INVENTORY_LIST, NAVIGATION_TIMEOUT)
            .await
    }

    pub async fn error_message(&mut self) -> Result<String> {
        self.driver.text(&error_selector()).await
    }

    pub async fn is_inventory_visible(&mut self) -> Result<bool> {
        self.driver.is_visible(INVENTORY_LIST).await
    }

    pub async fn is_form_visible(&mut self) -> Result<bool> {
        Ok(self.driver.is_visible(USERNAME).await? && self.driver.is_visible(PASSWORD).await?)
    }

    /// Open the side menu and log out.
    pub async fn logout(&mut self) -> Result<()> {
        self.driver.click(MENU_BUTTON).await?;
        self.driver.click(LOGOUT_LINK).await
    }
}
