//! Named storefront checks, grouped into suites and scoped to a persona.

mod assert;
pub mod cart;
pub mod checkout;
pub mod images;
pub mod inventory;
pub mod login;
pub mod purchase;
pub mod sorting;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::BoxFuture;
use tracing::debug;

use crate::compare::CompareOptions;
use crate::driver::BrowserDriver;
use crate::model::{Credentials, InventoryItem, Persona};
use crate::pages::{CartPage, CheckoutFlow, ImageFlow, InventoryPage, LoginPage, Site};

pub use self::assert::{GLITCH_DELAY_MAX, expect_eq, expect_glitch_delay};

/// Normalize a string for filter comparison: lowercase + treat `_` and ` ` as equivalent.
/// This lets users filter by either the scenario id (underscores in persona
/// names) or the title words shown in the terminal.
pub(crate) fn normalize_for_filter(s: &str) -> String {
    s.to_lowercase().replace('_', " ")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Suite {
    Login,
    Inventory,
    Sorting,
    Cart,
    Checkout,
    Purchase,
    Images,
}

impl Suite {
    pub fn name(self) -> &'static str {
        match self {
            Suite::Login => "login",
            Suite::Inventory => "inventory",
            Suite::Sorting => "sorting",
            Suite::Cart => "cart",
            Suite::Checkout => "checkout",
            Suite::Purchase => "purchase",
            Suite::Images => "images",
        }
    }
}

impl fmt::Display for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What happens in a fresh tab before the scenario body runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Setup {
    /// Open the login page.
    LoginPage,
    /// Open the login page and sign in as the scenario's persona.
    LoggedIn,
}

/// A scenario body without captured parameters.
pub(crate) type Body = for<'a> fn(&'a mut ScenarioContext) -> BoxFuture<'a, Result<()>>;

type ScenarioFn = Arc<dyn for<'a> Fn(&'a mut ScenarioContext) -> BoxFuture<'a, Result<()>> + Send + Sync>;

#[derive(Clone)]
pub struct Scenario {
    pub suite: Suite,
    pub persona: Persona,
    pub slug: String,
    pub title: String,
    pub setup: Setup,
    body: ScenarioFn,
}

impl fmt::Debug for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scenario")
            .field("id", &self.id())
            .field("setup", &self.setup)
            .finish()
    }
}

impl Scenario {
    pub fn new<F>(
        suite: Suite,
        persona: Persona,
        slug: impl Into<String>,
        title: impl Into<String>,
        setup: Setup,
        run: F,
    ) -> Self
    where
        F: for<'a> Fn(&'a mut ScenarioContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
    {
        Self {
            suite,
            persona,
            slug: slug.into(),
            title: title.into(),
            setup,
            body: Arc::new(run),
        }
    }

    /// Stable id, also the artifact path: `<suite>/<persona>/<slug>`.
    pub fn id(&self) -> String {
        format!("{}/{}/{}", self.suite, self.persona, self.slug)
    }

    /// Case-insensitive substring match against the id or the title.
    pub fn matches_filter(&self, pattern: &str) -> bool {
        let p = normalize_for_filter(pattern.trim_matches('/'));
        normalize_for_filter(&self.id()).contains(&p)
            || normalize_for_filter(&self.title).contains(&p)
    }

    /// Bring a fresh tab to the scenario's starting point.
    pub async fn setup(&self, ctx: &mut ScenarioContext) -> Result<()> {
        debug!(setup = ?self.setup, "setup");
        let setup = match self.setup {
            Setup::LoginPage => ctx.login().navigate().await,
            Setup::LoggedIn => ctx.sign_in().await,
        };
        setup.context("Scenario setup failed")
    }

    /// Run the body. Expects `setup` to have succeeded on `ctx`.
    pub async fn run(&self, ctx: &mut ScenarioContext) -> Result<()> {
        (self.body)(ctx).await
    }
}

/// Everything a scenario body can reach: its tab, the site, and where to
/// put screenshots.
pub struct ScenarioContext {
    driver: Box<dyn BrowserDriver>,
    site: Site,
    persona: Persona,
    compare: CompareOptions,
    artifacts_dir: PathBuf,
}

impl ScenarioContext {
    pub fn new(
        driver: Box<dyn BrowserDriver>,
        site: Site,
        persona: Persona,
        compare: CompareOptions,
        artifacts_dir: PathBuf,
    ) -> Self {
        Self {
            driver,
            site,
            persona,
            compare,
            artifacts_dir,
        }
    }

    pub fn driver(&mut self) -> &mut dyn BrowserDriver {
        self.driver.as_mut()
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn persona(&self) -> Persona {
        self.persona
    }

    pub fn credentials(&self) -> Credentials {
        self.site.credentials(self.persona)
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn login(&mut self) -> LoginPage<'_> {
        LoginPage::new(self.driver.as_mut(), &self.site)
    }

    pub fn inventory(&mut self) -> InventoryPage<'_> {
        InventoryPage::new(self.driver.as_mut(), &self.site)
    }

    pub fn cart(&mut self) -> CartPage<'_> {
        CartPage::new(self.driver.as_mut())
    }

    pub fn checkout(&mut self) -> CheckoutFlow<'_> {
        CheckoutFlow::new(self.driver.as_mut())
    }

    pub fn images(&mut self) -> ImageFlow<'_> {
        ImageFlow::new(self.driver.as_mut(), &self.artifacts_dir, &self.compare)
    }

    /// Log in as this scenario's persona and wait for the product list.
    pub async fn sign_in(&mut self) -> Result<()> {
        let credentials = self.credentials();
        let mut login = self.login();
        login.navigate().await?;
        login.login(&credentials).await?;
        login
            .wait_for_inventory()
            .await
            .with_context(|| format!("{} did not reach the inventory", credentials.username))
    }
}

/// Product named `name` in a listing.
pub(crate) fn find_item<'i>(items: &'i [InventoryItem], name: &str) -> Result<&'i InventoryItem> {
    items
        .iter()
        .find(|item| item.name == name)
        .with_context(|| format!("'{name}' is not listed"))
}

/// Add every listed product to the cart from the inventory page.
pub(crate) async fn add_all_to_cart(ctx: &mut ScenarioContext) -> Result<Vec<InventoryItem>> {
    let mut inventory = ctx.inventory();
    let items = inventory.items().await?;
    for item in &items {
        inventory.add_to_cart(item).await?;
    }
    Ok(items)
}

/// Every scenario, in suite order.
pub fn registry() -> Vec<Scenario> {
    let mut all = Vec::new();
    all.extend(login::scenarios());
    all.extend(inventory::scenarios());
    all.extend(sorting::scenarios());
    all.extend(cart::scenarios());
    all.extend(checkout::scenarios());
    all.extend(purchase::scenarios());
    all.extend(images::scenarios());
    all
}


#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use futures::FutureExt;

    use super::testing::{BASE, context};
    use super::*;
    use crate::driver::fake::{Effect, FakeDriver, FakeElement};
    use crate::pages::login::{INVENTORY_LIST, LOGIN_BUTTON, PASSWORD, USERNAME};

    async fn nothing(_ctx: &mut ScenarioContext) -> Result<()> {
        Ok(())
    }

    fn noop(suite: Suite, persona: Persona, slug: &'static str, setup: Setup) -> Scenario {
        Scenario::new(suite, persona, slug, "Does nothing", setup, |ctx| {
            nothing(ctx).boxed()
        })
    }

    #[test]
    fn ids_are_unique() {
        let scenarios = registry();
        let ids: HashSet<_> = scenarios.iter().map(Scenario::id).collect();
        assert_eq!(ids.len(), scenarios.len());
    }

    #[test]
    fn every_suite_is_registered() {
        let suites: HashSet<_> = registry().iter().map(|s| s.suite).collect();
        for suite in [
            Suite::Login,
            Suite::Inventory,
            Suite::Sorting,
            Suite::Cart,
            Suite::Checkout,
            Suite::Purchase,
            Suite::Images,
        ] {
            assert!(suites.contains(&suite), "{suite} has no scenarios");
        }
    }

    #[test]
    fn id_layout() {
        let s = noop(Suite::Cart, Persona::Problem, "cannot-add-every-item", Setup::LoggedIn);
        assert_eq!(s.id(), "cart/problem_user/cannot-add-every-item");
    }

    #[test]
    fn filter_is_case_and_underscore_insensitive() {
        let s = noop(Suite::Sorting, Persona::PerformanceGlitch, "za-timing", Setup::LoggedIn);
        assert!(s.matches_filter("sorting"));
        assert!(s.matches_filter("Performance Glitch"));
        assert!(s.matches_filter("sorting/performance_glitch_user/"));
        assert!(s.matches_filter("does nothing"));
        assert!(!s.matches_filter("checkout"));
    }

    #[tokio::test]
    async fn logged_in_setup_signs_in_as_persona() {
        let driver = FakeDriver::at("about:blank")
            .with(USERNAME, FakeElement::input())
            .with(PASSWORD, FakeElement::input())
            .with_text(LOGIN_BUTTON, "Login")
            .on_click(
                LOGIN_BUTTON,
                vec![
                    Effect::Navigate(format!("{BASE}/inventory.html")),
                    Effect::Show(INVENTORY_LIST.into(), FakeElement::text("")),
                ],
            );
        let mut ctx = context(driver, Persona::Error, Path::new("unused"));
        let s = noop(Suite::Sorting, Persona::Error, "x", Setup::LoggedIn);
        s.setup(&mut ctx).await.unwrap();
        assert_eq!(
            ctx.driver().current_url().await.unwrap(),
            "https://www.saucedemo.com/inventory.html"
        );
    }

    #[tokio::test]
    async fn failed_sign_in_is_a_setup_error() {
        let driver = FakeDriver::at("about:blank")
            .with(USERNAME, FakeElement::input())
            .with(PASSWORD, FakeElement::input())
            .with_text(LOGIN_BUTTON, "Login");
        let mut ctx = context(driver, Persona::LockedOut, Path::new("unused"));
        let s = noop(Suite::Cart, Persona::LockedOut, "x", Setup::LoggedIn);
        let err = s.setup(&mut ctx).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("setup failed"));
        assert!(msg.contains("locked_out_user did not reach the inventory"));
    }
}
