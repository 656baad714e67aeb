use anyhow::{Result, ensure};
use futures::FutureExt;

use super::{Body, Scenario, ScenarioContext, Setup, Suite, expect_eq, find_item};
use crate::model::{InventoryItem, Persona};

pub const BACKPACK: &str = "Sauce Labs Backpack";

fn s(slug: &'static str, title: &'static str, run: Body) -> Scenario {
    Scenario::new(Suite::Inventory, Persona::Standard, slug, title, Setup::LoggedIn, run)
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        s("add-to-cart", "Added backpack shows in badge and cart", |ctx| {
            add_to_cart(ctx).boxed()
        }),
        s("remove-from-cart", "Backpack removed from the cart is gone", |ctx| {
            remove_from_cart(ctx).boxed()
        }),
        s("remove-if-present", "Removing from the cart is idempotent", |ctx| {
            remove_if_present(ctx).boxed()
        }),
    ]
}

async fn backpack(ctx: &mut ScenarioContext) -> Result<InventoryItem> {
    let items = ctx.inventory().items().await?;
    Ok(find_item(&items, BACKPACK)?.clone())
}

async fn add_to_cart(ctx: &mut ScenarioContext) -> Result<()> {
    let item = backpack(ctx).await?;
    let mut inventory = ctx.inventory();
    inventory.add_to_cart(&item).await?;
    expect_eq("cart badge", inventory.cart_badge_count().await?, 1)?;
    inventory.go_to_cart().await?;
    ensure!(ctx.cart().contains(&item).await?, "'{BACKPACK}' should be in the cart");
    Ok(())
}

async fn remove_from_cart(ctx: &mut ScenarioContext) -> Result<()> {
    let item = backpack(ctx).await?;
    let mut inventory = ctx.inventory();
    inventory.add_to_cart(&item).await?;
    inventory.go_to_cart().await?;
    let mut cart = ctx.cart();
    cart.remove(&item).await?;
    ensure!(!cart.contains(&item).await?, "'{BACKPACK}' should no longer be in the cart");
    Ok(())
}

async fn remove_if_present(ctx: &mut ScenarioContext) -> Result<()> {
    let item = backpack(ctx).await?;
    ctx.inventory().go_to_cart().await?;
    let mut cart = ctx.cart();
    if cart.contains(&item).await? {
        cart.remove(&item).await?;
    }
    ensure!(!cart.contains(&item).await?, "'{BACKPACK}' should not be in the cart");
    Ok(())
}
