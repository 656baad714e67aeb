use anyhow::{Context, Result, ensure};
use futures::FutureExt;

use super::checkout::buyer;
use super::{Body, Scenario, ScenarioContext, Setup, Suite, expect_eq};
use crate::model::{InventoryItem, Persona};
use crate::pages::{CART_PATH, CHECKOUT_OVERVIEW_PATH, INVENTORY_PATH, NAVIGATION_TIMEOUT};

pub const ORDER_CONFIRMATION: &str = "Thank you for your order";

fn s(slug: &'static str, title: &'static str, run: Body) -> Scenario {
    Scenario::new(Suite::Purchase, Persona::Standard, slug, title, Setup::LoggedIn, run)
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        s("buy-one-item", "One item bought end to end", |ctx| buy_one_item(ctx).boxed()),
        s("detail-matches-listing", "Product page matches its listing", |ctx| {
            detail_matches_listing(ctx).boxed()
        }),
        s("cancel", "Cancelling on the overview returns to the products", |ctx| {
            cancel(ctx).boxed()
        }),
    ]
}

async fn first_item(ctx: &mut ScenarioContext) -> Result<InventoryItem> {
    let items = ctx.inventory().items().await?;
    items.into_iter().next().context("Inventory lists no products")
}

/// Add the first product from its detail page and fill the checkout form,
/// stopping on the overview.
async fn to_overview(ctx: &mut ScenarioContext) -> Result<InventoryItem> {
    let item = first_item(ctx).await?;
    let cart_url = ctx.site().url(CART_PATH);
    let overview_url = ctx.site().url(CHECKOUT_OVERVIEW_PATH);

    let mut checkout = ctx.checkout();
    checkout.open_item(&item.id).await?;
    checkout.add_to_cart().await?;
    checkout.go_to_cart().await?;
    ctx.driver().wait_for_url(&cart_url, NAVIGATION_TIMEOUT).await?;

    let mut cart = ctx.cart();
    ensure!(cart.contains(&item).await?, "'{}' should be in the cart", item.name);
    expect_eq("cart badge", cart.badge_count().await?, 1)?;

    let mut checkout = ctx.checkout();
    checkout.start_checkout().await?;
    checkout.fill_form(&buyer()).await?;
    checkout.continue_to_overview().await?;
    ctx.driver()
        .wait_for_url(&overview_url, NAVIGATION_TIMEOUT)
        .await?;
    Ok(item)
}

async fn buy_one_item(ctx: &mut ScenarioContext) -> Result<()> {
    to_overview(ctx).await?;
    let inventory_url = ctx.site().url(INVENTORY_PATH);
    let mut checkout = ctx.checkout();
    checkout.finish().await?;
    let message = checkout.confirmation_message().await?;
    ensure!(
        message.contains(ORDER_CONFIRMATION),
        "confirmation should mention \"{ORDER_CONFIRMATION}\", got {message:?}"
    );
    checkout.back_home().await?;
    ctx.driver()
        .wait_for_url(&inventory_url, NAVIGATION_TIMEOUT)
        .await
}

async fn detail_matches_listing(ctx: &mut ScenarioContext) -> Result<()> {
    let item = first_item(ctx).await?;
    let mut checkout = ctx.checkout();
    checkout.open_item(&item.id).await?;
    expect_eq("product name", checkout.product_name().await?, item.name)?;
    expect_eq("product price", checkout.product_price().await?, item.price)?;
    expect_eq(
        "product description",
        checkout.product_description().await?,
        item.description,
    )
}

async fn cancel(ctx: &mut ScenarioContext) -> Result<()> {
    to_overview(ctx).await?;
    let inventory_url = ctx.site().url(INVENTORY_PATH);
    ctx.checkout().cancel().await?;
    ctx.driver()
        .wait_for_url(&inventory_url, NAVIGATION_TIMEOUT)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::{Effect, FakeDriver, FakeElement};
    use crate::pages::checkout::{
        BACK_TO_PRODUCTS, CANCEL, CHECKOUT, COMPLETE_HEADER, CONTINUE, DETAIL_ADD,
        DETAIL_DESCRIPTION, DETAIL_NAME, DETAIL_PRICE, FINISH, FIRST_NAME, LAST_NAME, POSTAL_CODE,
        title_link,
    };
    use crate::pages::items::tests::{ROWS, listing};
    use crate::pages::items::{CART_ITEM, INVENTORY_ITEM};
    use crate::pages::login::{INVENTORY_LIST, LOGIN_BUTTON, PASSWORD, USERNAME};
    use crate::pages::{CART_BADGE, CART_LINK};
    use crate::scenarios::testing::{BASE, run_scenario};

    /// Storefront that walks the backpack from detail page to checkout
    /// overview, with `detail` shown on its product page.
    fn store(detail: (&str, &str, &str)) -> FakeDriver {
        let driver = FakeDriver::at("about:blank")
            .with(USERNAME, FakeElement::input())
            .with(PASSWORD, FakeElement::input())
            .with_text(LOGIN_BUTTON, "Login")
            .on_click(
                LOGIN_BUTTON,
                vec![
                    Effect::Navigate(format!("{BASE}{INVENTORY_PATH}")),
                    Effect::Show(INVENTORY_LIST.into(), FakeElement::text("")),
                ],
            )
            .with_text(&title_link("4"), ROWS[0].1)
            .on_click(
                &title_link("4"),
                vec![
                    Effect::Show(BACK_TO_PRODUCTS.into(), FakeElement::text("Back to products")),
                    Effect::Show(DETAIL_NAME.into(), FakeElement::text(detail.0)),
                    Effect::Show(DETAIL_DESCRIPTION.into(), FakeElement::text(detail.1)),
                    Effect::Show(DETAIL_PRICE.into(), FakeElement::text(detail.2)),
                    Effect::Show(DETAIL_ADD.into(), FakeElement::text("Add to cart")),
                ],
            )
            .on_click(DETAIL_ADD, vec![Effect::Show(CART_BADGE.into(), FakeElement::text("1"))])
            .with_text(CART_LINK, "")
            .on_click(CART_LINK, vec![Effect::Navigate(format!("{BASE}{CART_PATH}"))])
            .with_text(CHECKOUT, "Checkout")
            .on_click(
                CHECKOUT,
                vec![
                    Effect::Show(FIRST_NAME.into(), FakeElement::input()),
                    Effect::Show(LAST_NAME.into(), FakeElement::input()),
                    Effect::Show(POSTAL_CODE.into(), FakeElement::input()),
                    Effect::Show(CONTINUE.into(), FakeElement::text("Continue")),
                ],
            )
            .on_click(
                CONTINUE,
                vec![
                    Effect::Navigate(format!("{BASE}{CHECKOUT_OVERVIEW_PATH}")),
                    Effect::Show(FINISH.into(), FakeElement::text("Finish")),
                    Effect::Show(CANCEL.into(), FakeElement::text("Cancel")),
                ],
            )
            .on_click(CANCEL, vec![Effect::Navigate(format!("{BASE}{INVENTORY_PATH}"))]);
        let driver = listing(driver, INVENTORY_ITEM, &ROWS, true);
        listing(driver, CART_ITEM, &ROWS[..1], false)
    }

    fn faithful() -> FakeDriver {
        store(("Sauce Labs Backpack", "About Sauce Labs Backpack", "$29.99"))
    }

    #[tokio::test]
    async fn buy_one_item_ends_on_inventory() {
        let driver = faithful()
            .on_click(
                FINISH,
                vec![Effect::Show(
                    COMPLETE_HEADER.into(),
                    FakeElement::text("Thank you for your order!"),
                )],
            )
            .on_click(
                BACK_TO_PRODUCTS,
                vec![Effect::Navigate(format!("{BASE}{INVENTORY_PATH}"))],
            );
        run_scenario(scenarios(), "buy-one-item", driver).await.unwrap();
    }

    #[tokio::test]
    async fn missing_confirmation_fails() {
        let err = run_scenario(scenarios(), "buy-one-item", faithful())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Order confirmation message not found");
    }

    #[tokio::test]
    async fn cancel_returns_to_inventory() {
        run_scenario(scenarios(), "cancel", faithful()).await.unwrap();
    }

    #[tokio::test]
    async fn detail_price_mismatch_fails() {
        let driver = store(("Sauce Labs Backpack", "About Sauce Labs Backpack", "$19.99"));
        let err = run_scenario(scenarios(), "detail-matches-listing", driver)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "product price: expected 29.99, got 19.99");
    }
}
