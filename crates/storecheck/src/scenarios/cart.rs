use anyhow::{Result, ensure};
use futures::FutureExt;

use super::checkout::buyer;
use super::{Body, Scenario, ScenarioContext, Setup, Suite, add_all_to_cart, expect_eq};
use crate::model::Persona;
use crate::pages::{CHECKOUT_OVERVIEW_PATH, NAVIGATION_TIMEOUT};

fn s(persona: Persona, slug: &'static str, title: &'static str, run: Body) -> Scenario {
    Scenario::new(Suite::Cart, persona, slug, title, Setup::LoggedIn, run)
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        s(Persona::Standard, "remove-all", "Removing every item empties the cart", |ctx| {
            remove_all(ctx).boxed()
        }),
        s(Persona::Standard, "remove-one", "Removing one item keeps the others", |ctx| {
            remove_one(ctx).boxed()
        }),
        s(Persona::Standard, "details-match", "Cart rows match the inventory", |ctx| {
            details_match(ctx).boxed()
        }),
        s(
            Persona::Standard,
            "overview-matches-cart",
            "Checkout overview lists the cart",
            |ctx| overview_matches_cart(ctx).boxed(),
        ),
        s(
            Persona::Problem,
            "cannot-add-every-item",
            "Some add buttons do nothing",
            |ctx| cannot_add_every_item(ctx).boxed(),
        ),
    ]
}

async fn remove_all(ctx: &mut ScenarioContext) -> Result<()> {
    let items = add_all_to_cart(ctx).await?;
    ctx.inventory().go_to_cart().await?;
    let mut cart = ctx.cart();
    for item in &items {
        cart.remove(item).await?;
    }
    let left = cart.items().await?;
    ensure!(left.is_empty(), "cart should be empty, still lists {} item(s)", left.len());
    expect_eq("cart badge", cart.badge_count().await?, 0)
}

async fn remove_one(ctx: &mut ScenarioContext) -> Result<()> {
    let mut inventory = ctx.inventory();
    let items = inventory.items().await?;
    ensure!(items.len() >= 2, "need two products, found {}", items.len());
    let (gone, kept) = (&items[0], &items[1]);
    inventory.add_to_cart(gone).await?;
    inventory.add_to_cart(kept).await?;
    inventory.go_to_cart().await?;

    let mut cart = ctx.cart();
    cart.remove(gone).await?;
    ensure!(!cart.contains(gone).await?, "'{}' should be removed", gone.name);
    ensure!(cart.contains(kept).await?, "'{}' should still be in the cart", kept.name);
    Ok(())
}

async fn details_match(ctx: &mut ScenarioContext) -> Result<()> {
    let items = add_all_to_cart(ctx).await?;
    ctx.inventory().go_to_cart().await?;
    let mut cart = ctx.cart();
    for item in &items {
        expect_eq("cart name", cart.item_name(item).await?, item.name.clone())?;
        expect_eq(
            &format!("description of '{}'", item.name),
            cart.item_description(item).await?,
            item.description.clone(),
        )?;
        expect_eq(
            &format!("price of '{}'", item.name),
            cart.item_price(item).await?,
            item.price,
        )?;
    }
    Ok(())
}

async fn overview_matches_cart(ctx: &mut ScenarioContext) -> Result<()> {
    add_all_to_cart(ctx).await?;
    ctx.inventory().go_to_cart().await?;
    let in_cart = ctx.cart().items().await?;

    let overview_url = ctx.site().url(CHECKOUT_OVERVIEW_PATH);
    let mut checkout = ctx.checkout();
    checkout.start_checkout().await?;
    checkout.fill_form(&buyer()).await?;
    checkout.continue_to_overview().await?;
    ctx.driver()
        .wait_for_url(&overview_url, NAVIGATION_TIMEOUT)
        .await?;
    expect_eq("overview items", ctx.checkout().overview_items().await?, in_cart)
}

async fn cannot_add_every_item(ctx: &mut ScenarioContext) -> Result<()> {
    let items = add_all_to_cart(ctx).await?;
    let badge = ctx.inventory().cart_badge_count().await?;
    ensure!(
        (badge as usize) < items.len(),
        "badge shows {badge} for {} add clicks, expected fewer",
        items.len()
    );
    ctx.inventory().go_to_cart().await?;
    let mut cart = ctx.cart();
    let mut all_there = true;
    for item in &items {
        all_there &= cart.contains(item).await?;
    }
    ensure!(!all_there, "every item made it into the cart");
    Ok(())
}
