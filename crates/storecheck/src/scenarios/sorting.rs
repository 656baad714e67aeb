use std::time::{Duration, Instant};

use anyhow::{Result, ensure};
use futures::FutureExt;
use futures::future::BoxFuture;

use super::{
    GLITCH_DELAY_MAX, Scenario, ScenarioContext, Setup, Suite, expect_eq, expect_glitch_delay,
};
use crate::model::{Persona, SortOrder};

pub const SORT_ALERT: &str = "Sorting is broken! This error has been reported to Backtrace.";

/// How long the listing gets to re-render before "unchanged" is checked.
const RENDER_SETTLE: Duration = Duration::from_millis(500);

/// Upper bound for a correct sort to show up.
const SORT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn scenarios() -> Vec<Scenario> {
    let mut all = Vec::new();
    for order in SortOrder::ALL {
        all.push(scenario(
            Persona::Standard,
            order,
            format!("Sorts by {}", order.label()),
            move |ctx| sorts_correctly(ctx, order).boxed(),
        ));
    }
    for order in SortOrder::ALL {
        all.push(scenario(
            Persona::Problem,
            order,
            format!("{} leaves list and selection unchanged", order.label()),
            move |ctx| sort_is_ignored(ctx, order, None).boxed(),
        ));
    }
    for order in SortOrder::ALL {
        all.push(scenario(
            Persona::PerformanceGlitch,
            order,
            format!("{} sorts in 4s to 10s", order.label()),
            move |ctx| sorts_slowly(ctx, order).boxed(),
        ));
    }
    for order in SortOrder::ALL {
        all.push(scenario(
            Persona::Error,
            order,
            format!("{} raises the broken-sort alert", order.label()),
            move |ctx| sort_is_ignored(ctx, order, Some(SORT_ALERT)).boxed(),
        ));
    }
    all
}

fn scenario<F>(persona: Persona, order: SortOrder, title: String, run: F) -> Scenario
where
    F: for<'a> Fn(&'a mut ScenarioContext) -> BoxFuture<'a, Result<()>> + Send + Sync + 'static,
{
    Scenario::new(Suite::Sorting, persona, order.value(), title, Setup::LoggedIn, run)
}

/// What a sort order is judged on.
#[derive(Debug, PartialEq)]
enum Listing {
    Names(Vec<String>),
    Prices(Vec<f64>),
}

async fn listing(ctx: &mut ScenarioContext, order: SortOrder) -> Result<Listing> {
    let mut inventory = ctx.inventory();
    Ok(if order.by_price() {
        Listing::Prices(inventory.item_prices().await?)
    } else {
        Listing::Names(inventory.item_names().await?)
    })
}

async fn sorts_correctly(ctx: &mut ScenarioContext, order: SortOrder) -> Result<()> {
    let mut inventory = ctx.inventory();
    inventory.sort(order).await?;
    inventory.wait_sorted(order, SORT_TIMEOUT).await?;
    expect_eq("selected sort", inventory.selected_sort().await?.as_str(), order.value())
}

async fn sorts_slowly(ctx: &mut ScenarioContext, order: SortOrder) -> Result<()> {
    let mut inventory = ctx.inventory();
    let start = Instant::now();
    inventory.sort(order).await?;
    inventory.wait_sorted(order, GLITCH_DELAY_MAX).await?;
    expect_glitch_delay("sort", start.elapsed())
}

/// Pick `order` and check neither the listing nor the selection moved.
/// With `alert`, that exact dialog must have been shown.
async fn sort_is_ignored(
    ctx: &mut ScenarioContext,
    order: SortOrder,
    alert: Option<&str>,
) -> Result<()> {
    let before = listing(ctx, order).await?;
    let selected_before = ctx.inventory().selected_sort().await?;
    ctx.driver().take_dialogs();

    ctx.inventory().sort(order).await?;
    tokio::time::sleep(RENDER_SETTLE).await;

    let dialogs = ctx.driver().take_dialogs();
    if let Some(expected) = alert {
        ensure!(!dialogs.is_empty(), "expected an alert \"{expected}\", none was shown");
        expect_eq("alert", dialogs[0].as_str(), expected)?;
    }
    expect_eq("listing after sort", listing(ctx, order).await?, before)?;
    expect_eq(
        "selected sort",
        ctx.inventory().selected_sort().await?,
        selected_before,
    )
}
