use std::time::Instant;

use anyhow::{Result, ensure};
use futures::FutureExt;

use super::{Body, Scenario, ScenarioContext, Setup, Suite, expect_eq, expect_glitch_delay};
use crate::model::{Credentials, Persona};
use crate::pages::{INVENTORY_PATH, NAVIGATION_TIMEOUT};

pub const INVALID_CREDENTIALS: &str =
    "Epic sadface: Username and password do not match any user in this service";
pub const USERNAME_REQUIRED: &str = "Epic sadface: Username is required";
pub const PASSWORD_REQUIRED: &str = "Epic sadface: Password is required";
pub const LOCKED_OUT: &str = "Epic sadface: Sorry, this user has been locked out.";

fn s(persona: Persona, slug: &'static str, title: &'static str, run: Body) -> Scenario {
    Scenario::new(Suite::Login, persona, slug, title, Setup::LoginPage, run)
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        s(Persona::Standard, "valid-credentials", "Valid credentials open the inventory", |ctx| {
            valid_credentials(ctx).boxed()
        }),
        s(Persona::Standard, "invalid-credentials", "Unknown user is rejected", |ctx| {
            rejected(ctx, Credentials::new("invalid_user", "invalid_password"), INVALID_CREDENTIALS)
                .boxed()
        }),
        s(Persona::Standard, "empty-form", "Empty form asks for a username", |ctx| {
            rejected(ctx, Credentials::new("", ""), USERNAME_REQUIRED).boxed()
        }),
        s(Persona::Standard, "username-only", "Username alone asks for a password", |ctx| {
            let username = ctx.credentials().username;
            rejected(ctx, Credentials::new(username, ""), PASSWORD_REQUIRED).boxed()
        }),
        s(Persona::Standard, "password-only", "Password alone asks for a username", |ctx| {
            let password = ctx.credentials().password;
            rejected(ctx, Credentials::new("", password), USERNAME_REQUIRED).boxed()
        }),
        s(Persona::Standard, "logout", "Logout returns to the login form", |ctx| {
            logout(ctx).boxed()
        }),
        s(Persona::LockedOut, "locked-out", "Locked-out user is rejected", |ctx| {
            let credentials = ctx.credentials();
            rejected(ctx, credentials, LOCKED_OUT).boxed()
        }),
        s(Persona::PerformanceGlitch, "slow-login", "Login takes between 4s and 10s", |ctx| {
            slow_login(ctx).boxed()
        }),
    ]
}

async fn valid_credentials(ctx: &mut ScenarioContext) -> Result<()> {
    let credentials = ctx.credentials();
    let inventory_url = ctx.site().url(INVENTORY_PATH);
    ctx.login().login(&credentials).await?;
    ctx.driver()
        .wait_for_url(&inventory_url, NAVIGATION_TIMEOUT)
        .await?;
    ensure!(
        ctx.login().is_inventory_visible().await?,
        "inventory list should be visible after login"
    );
    Ok(())
}

async fn rejected(ctx: &mut ScenarioContext, credentials: Credentials, message: &str) -> Result<()> {
    let mut login = ctx.login();
    login.login(&credentials).await?;
    expect_eq("login error", login.error_message().await?.as_str(), message)
}

async fn logout(ctx: &mut ScenarioContext) -> Result<()> {
    let home = ctx.site().home();
    ctx.sign_in().await?;
    ctx.login().logout().await?;
    ctx.driver().wait_for_url(&home, NAVIGATION_TIMEOUT).await?;
    ensure!(
        ctx.login().is_form_visible().await?,
        "username and password fields should be visible after logout"
    );
    Ok(())
}

async fn slow_login(ctx: &mut ScenarioContext) -> Result<()> {
    let credentials = ctx.credentials();
    let mut login = ctx.login();
    let start = Instant::now();
    login.login(&credentials).await?;
    login.wait_for_inventory().await?;
    expect_glitch_delay("login", start.elapsed())?;
    ensure!(
        login.is_inventory_visible().await?,
        "inventory list should be visible after login"
    );
    Ok(())
}
