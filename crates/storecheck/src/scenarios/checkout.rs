use anyhow::{Context, Result, ensure};
use futures::FutureExt;

use super::{Scenario, ScenarioContext, Setup, Suite, expect_eq};
use crate::model::{CheckoutForm, Persona};
use crate::pages::checkout::FIRST_NAME;
use crate::pages::{CHECKOUT_OVERVIEW_PATH, NAVIGATION_TIMEOUT};

pub const FIRST_NAME_REQUIRED: &str = "Error: First Name is required";
pub const LAST_NAME_REQUIRED: &str = "Error: Last Name is required";
pub const POSTAL_CODE_REQUIRED: &str = "Error: Postal Code is required";

/// Customer used whenever a scenario needs a valid checkout form.
pub(crate) fn buyer() -> CheckoutForm {
    CheckoutForm::new("Daniel", "Viana", "06406150")
}

/// Partial forms and the message for the first field they leave blank.
const PARTIAL_FORMS: [(&str, bool, bool, bool, &str); 7] = [
    ("empty-form", false, false, false, FIRST_NAME_REQUIRED),
    ("first-name-only", true, false, false, LAST_NAME_REQUIRED),
    ("last-name-only", false, true, false, FIRST_NAME_REQUIRED),
    ("postal-code-only", false, false, true, FIRST_NAME_REQUIRED),
    ("missing-postal-code", true, true, false, POSTAL_CODE_REQUIRED),
    ("missing-last-name", true, false, true, LAST_NAME_REQUIRED),
    ("missing-first-name", false, true, true, FIRST_NAME_REQUIRED),
];

pub fn scenarios() -> Vec<Scenario> {
    let mut all = vec![
        Scenario::new(
            Suite::Checkout,
            Persona::Standard,
            "continue-button",
            "Continue button is visible and enabled",
            Setup::LoggedIn,
            |ctx| continue_button(ctx).boxed(),
        ),
        Scenario::new(
            Suite::Checkout,
            Persona::Standard,
            "complete-form",
            "Complete form reaches the overview",
            Setup::LoggedIn,
            |ctx| complete_form(ctx).boxed(),
        ),
    ];
    for (slug, first, last, postal, message) in PARTIAL_FORMS {
        let full = buyer();
        let form = CheckoutForm::new(
            if first { full.first_name.as_str() } else { "" },
            if last { full.last_name.as_str() } else { "" },
            if postal { full.postal_code.as_str() } else { "" },
        );
        all.push(Scenario::new(
            Suite::Checkout,
            Persona::Standard,
            slug,
            format!("{} shows '{message}'", slug.replace('-', " ")),
            Setup::LoggedIn,
            move |ctx| incomplete_form(ctx, form.clone(), message).boxed(),
        ));
    }
    all
}

/// Put the first listed product in the cart and open the checkout form.
pub(crate) async fn begin_checkout(ctx: &mut ScenarioContext) -> Result<()> {
    let mut inventory = ctx.inventory();
    let items = inventory.items().await?;
    let first = items.first().context("Inventory lists no products")?;
    inventory.add_to_cart(first).await?;
    inventory.go_to_cart().await?;
    ctx.checkout().start_checkout().await?;
    ctx.driver().wait_visible(FIRST_NAME, NAVIGATION_TIMEOUT).await
}

async fn continue_button(ctx: &mut ScenarioContext) -> Result<()> {
    begin_checkout(ctx).await?;
    let mut checkout = ctx.checkout();
    ensure!(
        checkout.form_fields_visible().await?,
        "checkout form fields should be visible"
    );
    ensure!(
        checkout.form_fields_editable().await?,
        "checkout form fields should be editable"
    );
    ensure!(checkout.is_continue_visible().await?, "continue button should be visible");
    ensure!(checkout.is_continue_enabled().await?, "continue button should be enabled");
    Ok(())
}

async fn complete_form(ctx: &mut ScenarioContext) -> Result<()> {
    begin_checkout(ctx).await?;
    let overview_url = ctx.site().url(CHECKOUT_OVERVIEW_PATH);
    let mut checkout = ctx.checkout();
    checkout.fill_form(&buyer()).await?;
    checkout.continue_to_overview().await?;
    ctx.driver()
        .wait_for_url(&overview_url, NAVIGATION_TIMEOUT)
        .await
}

async fn incomplete_form(
    ctx: &mut ScenarioContext,
    form: CheckoutForm,
    message: &str,
) -> Result<()> {
    begin_checkout(ctx).await?;
    let mut checkout = ctx.checkout();
    checkout.fill_form(&form).await?;
    checkout.continue_to_overview().await?;
    expect_eq("checkout error", checkout.error_message().await?.as_str(), message)
}
