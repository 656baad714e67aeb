use anyhow::{Context, Result, bail};

use crate::driver::BrowserDriver;
use crate::model::{InventoryItem, extract_id, parse_price};

/// Product rows on the inventory page.
pub const INVENTORY_ITEM: &str = ".inventory_item";
/// Product rows on the cart and checkout overview pages.
pub const CART_ITEM: &str = ".cart_item";

pub(crate) fn name_selector(container: &str) -> String {
    format!(r#"{container} [data-test="inventory-item-name"]"#)
}

pub(crate) fn description_selector(container: &str) -> String {
    format!(r#"{container} [data-test="inventory-item-desc"]"#)
}

pub(crate) fn price_selector(container: &str) -> String {
    format!(r#"{container} [data-test="inventory-item-price"]"#)
}

pub(crate) fn title_link_selector(container: &str) -> String {
    format!(r#"{container} [data-test^="item-"][data-test$="-title-link"]"#)
}

pub(crate) fn image_selector(container: &str) -> String {
    format!("{container} img.inventory_item_img")
}

/// Read every product row under `container`.
///
/// With `require_images`, a row without an image `src` is an error;
/// otherwise rows carry `image_src: None` unless every row has an image.
pub async fn read_items(
    driver: &mut dyn BrowserDriver,
    container: &str,
    require_images: bool,
) -> Result<Vec<InventoryItem>> {
    let names = driver.texts(&name_selector(container)).await?;
    let descriptions = driver.texts(&description_selector(container)).await?;
    let prices = driver.texts(&price_selector(container)).await?;
    let links = driver
        .attributes(&title_link_selector(container), "data-test")
        .await?;
    let images = driver.attributes(&image_selector(container), "src").await?;

    let count = names.len();
    if descriptions.len() != count || prices.len() != count || links.len() != count {
        bail!(
            "Inconsistent product rows under {container}: {count} names, {} descriptions, \
             {} prices, {} title links",
            descriptions.len(),
            prices.len(),
            links.len()
        );
    }
    if require_images && images.len() != count {
        bail!(
            "Expected {count} product images under {container}, found {}",
            images.len()
        );
    }
    let images = if images.len() == count {
        images
    } else {
        vec![None; count]
    };

    let mut items = Vec::with_capacity(count);
    for ((((name, description), price), link), image_src) in names
        .into_iter()
        .zip(descriptions)
        .zip(prices)
        .zip(links)
        .zip(images)
    {
        let data_test = link.with_context(|| format!("Title link of '{name}' has no data-test"))?;
        let id = extract_id(&data_test)?;
        let price = parse_price(&price).with_context(|| format!("Price of '{name}'"))?;
        if require_images && image_src.as_deref().is_none_or(str::is_empty) {
            bail!("Could not read the image of item '{name}'");
        }
        items.push(InventoryItem {
            id,
            name,
            description,
            price,
            image_src,
        });
    }
    Ok(items)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::driver::fake::FakeDriver;

    /// A fake page listing `rows` of `(id, name, price)` under `container`.
    pub(crate) fn listing(
        driver: FakeDriver,
        container: &str,
        rows: &[(&str, &str, &str)],
        with_images: bool,
    ) -> FakeDriver {
        let names: Vec<_> = rows.iter().map(|r| r.1).collect();
        let descs: Vec<String> = rows.iter().map(|r| format!("About {}", r.1)).collect();
        let prices: Vec<_> = rows.iter().map(|r| r.2).collect();
        let links: Vec<String> = rows.iter().map(|r| format!("item-{}-title-link", r.0)).collect();
        let link_refs: Vec<Option<&str>> = links.iter().map(|l| Some(l.as_str())).collect();
        let driver = driver
            .with_list(&name_selector(container), &names)
            .with_list(&description_selector(container), &descs)
            .with_list(&price_selector(container), &prices)
            .with_attrs(&title_link_selector(container), "data-test", &link_refs);
        if with_images {
            let srcs: Vec<String> = rows.iter().map(|r| format!("/static/media/{}.jpg", r.0)).collect();
            let src_refs: Vec<Option<&str>> = srcs.iter().map(|s| Some(s.as_str())).collect();
            driver.with_attrs(&image_selector(container), "src", &src_refs)
        } else {
            driver
        }
    }

    pub(crate) const ROWS: [(&str, &str, &str); 3] = [
        ("4", "Sauce Labs Backpack", "$29.99"),
        ("0", "Sauce Labs Bike Light", "$9.99"),
        ("1", "Sauce Labs Bolt T-Shirt", "$15.99"),
    ];

    #[tokio::test]
    async fn inventory_rows_are_extracted() {
        let mut driver = listing(FakeDriver::at("x"), INVENTORY_ITEM, &ROWS, true);
        let items = read_items(&mut driver, INVENTORY_ITEM, true).await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].id, "4");
        assert_eq!(items[0].name, "Sauce Labs Backpack");
        assert_eq!(items[0].description, "About Sauce Labs Backpack");
        assert_eq!(items[0].price, 29.99);
        assert_eq!(items[0].image_src.as_deref(), Some("/static/media/4.jpg"));
        assert_eq!(items[2].price, 15.99);
    }

    #[tokio::test]
    async fn cart_rows_have_no_image() {
        let mut driver = listing(FakeDriver::at("x"), CART_ITEM, &ROWS[..2], false);
        let items = read_items(&mut driver, CART_ITEM, false).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.image_src.is_none()));
    }

    #[tokio::test]
    async fn missing_image_is_error_when_required() {
        let mut driver = listing(FakeDriver::at("x"), INVENTORY_ITEM, &ROWS, false);
        let err = read_items(&mut driver, INVENTORY_ITEM, true).await.unwrap_err();
        assert!(err.to_string().contains("product images"));
    }

    #[tokio::test]
    async fn missing_id_names_the_attribute() {
        let mut driver = listing(FakeDriver::at("x"), INVENTORY_ITEM, &ROWS[..1], true)
            .with_attrs(&title_link_selector(INVENTORY_ITEM), "data-test", &[Some("item-title-link")]);
        let err = read_items(&mut driver, INVENTORY_ITEM, true).await.unwrap_err();
        assert!(format!("{err:#}").contains("item-title-link"));
    }

    #[tokio::test]
    async fn ragged_rows_are_rejected() {
        let mut driver = listing(FakeDriver::at("x"), INVENTORY_ITEM, &ROWS, true)
            .with_list(&price_selector(INVENTORY_ITEM), &["$1.00"]);
        assert!(read_items(&mut driver, INVENTORY_ITEM, true).await.is_err());
    }

    #[tokio::test]
    async fn empty_page_has_no_items() {
        let mut driver = FakeDriver::at("x");
        assert!(read_items(&mut driver, CART_ITEM, false).await.unwrap().is_empty());
    }
}
