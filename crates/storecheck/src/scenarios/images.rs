use anyhow::{Result, ensure};
use futures::FutureExt;
use tracing::info;

use super::{Body, Scenario, ScenarioContext, Setup, Suite};
use crate::model::Persona;

fn s(persona: Persona, slug: &'static str, title: &'static str, run: Body) -> Scenario {
    Scenario::new(Suite::Images, persona, slug, title, Setup::LoggedIn, run)
}

pub fn scenarios() -> Vec<Scenario> {
    vec![
        s(Persona::Problem, "all-identical", "Every thumbnail is the same picture", |ctx| {
            all_identical(ctx).boxed()
        }),
        s(Persona::Standard, "distinct", "Thumbnails are not all the same", |ctx| {
            distinct(ctx).boxed()
        }),
    ]
}

async fn all_identical(ctx: &mut ScenarioContext) -> Result<()> {
    ensure!(
        ctx.images().all_images_identical().await?,
        "expected every product thumbnail to be identical"
    );
    Ok(())
}

async fn distinct(ctx: &mut ScenarioContext) -> Result<()> {
    let mut images = ctx.images();
    let duplicates = images.duplicate_pairs().await?;
    if !duplicates.is_empty() {
        info!(pairs = ?duplicates, "some thumbnails repeat");
    }
    ensure!(
        !images.all_images_identical().await?,
        "every product thumbnail is identical"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::driver::fake::{Effect, FakeDriver, FakeElement};
    use crate::pages::INVENTORY_PATH;
    use crate::pages::images::image_link;
    use crate::pages::items::INVENTORY_ITEM;
    use crate::pages::items::tests::{ROWS, listing};
    use crate::pages::login::{INVENTORY_LIST, LOGIN_BUTTON, PASSWORD, USERNAME};
    use crate::scenarios::testing::{BASE, context};

    fn shop(colors: [[u8; 4]; 3]) -> FakeDriver {
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
            );
        let mut driver = listing(driver, INVENTORY_ITEM, &ROWS, true);
        for (row, rgba) in ROWS.iter().zip(colors) {
            let link = image_link(row.0);
            driver = driver
                .with_text(&link, "")
                .with_image(&link, RgbaImage::from_pixel(16, 24, Rgba(rgba)));
        }
        driver
    }

    async fn run(slug: &str, driver: FakeDriver) -> Result<()> {
        let tmp = tempfile::tempdir().unwrap();
        let scenario = scenarios().into_iter().find(|s| s.slug == slug).unwrap();
        let mut ctx = context(driver, scenario.persona, tmp.path());
        scenario.setup(&mut ctx).await?;
        scenario.run(&mut ctx).await
    }

    const DOG: [u8; 4] = [140, 90, 60, 255];

    #[tokio::test]
    async fn problem_user_same_pictures_pass() {
        run("all-identical", shop([DOG; 3])).await.unwrap();
    }

    #[tokio::test]
    async fn problem_user_real_pictures_fail() {
        let err = run("all-identical", shop([DOG, [0, 0, 0, 255], DOG]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("identical"));
    }

    #[tokio::test]
    async fn standard_user_partial_repeats_pass() {
        run("distinct", shop([DOG, DOG, [255, 255, 255, 255]])).await.unwrap();
    }

    #[tokio::test]
    async fn standard_user_all_same_fails() {
        let err = run("distinct", shop([DOG; 3])).await.unwrap_err();
        assert_eq!(err.to_string(), "every product thumbnail is identical");
    }
}
