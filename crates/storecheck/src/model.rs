use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, bail};

/// Password shared by every seeded storefront account.
pub const DEFAULT_PASSWORD: &str = "secret_sauce";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Seeded storefront accounts, each with its own scripted misbehaviour.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Persona {
    Standard,
    LockedOut,
    Problem,
    PerformanceGlitch,
    Error,
    Visual,
}

impl Persona {
    pub const ALL: [Persona; 6] = [
        Persona::Standard,
        Persona::LockedOut,
        Persona::Problem,
        Persona::PerformanceGlitch,
        Persona::Error,
        Persona::Visual,
    ];

    pub fn username(self) -> &'static str {
        match self {
            Persona::Standard => "standard_user",
            Persona::LockedOut => "locked_out_user",
            Persona::Problem => "problem_user",
            Persona::PerformanceGlitch => "performance_glitch_user",
            Persona::Error => "error_user",
            Persona::Visual => "visual_user",
        }
    }

    pub fn credentials(self, password: &str) -> Credentials {
        Credentials::new(self.username(), password)
    }
}

impl fmt::Display for Persona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.username())
    }
}

impl FromStr for Persona {
    type Err = anyhow::Error;

    /// Accepts the username (`problem_user`) or its short form (`problem`).
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Persona::ALL
            .into_iter()
            .find(|p| {
                let name = p.username();
                name == wanted || name.strip_suffix("_user") == Some(wanted.as_str())
            })
            .with_context(|| {
                let names: Vec<_> = Persona::ALL.iter().map(|p| p.username()).collect();
                format!("Unknown persona '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// One product as listed on the inventory, cart or checkout overview pages.
#[derive(Clone, Debug, PartialEq)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub image_src: Option<String>,
}

impl InventoryItem {
    /// The item without its image, for comparing listings that render none
    /// (cart, checkout overview) against the inventory.
    pub fn without_image(&self) -> Self {
        Self {
            image_src: None,
            ..self.clone()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub postal_code: String,
}

impl CheckoutForm {
    pub fn new(first_name: &str, last_name: &str, postal_code: &str) -> Self {
        Self {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            postal_code: postal_code.to_string(),
        }
    }
}

/// Inventory sort options, named by their `<option value>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    NameAsc,
    NameDesc,
    PriceAsc,
    PriceDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 4] = [
        SortOrder::NameAsc,
        SortOrder::NameDesc,
        SortOrder::PriceAsc,
        SortOrder::PriceDesc,
    ];

    pub fn value(self) -> &'static str {
        match self {
            SortOrder::NameAsc => "az",
            SortOrder::NameDesc => "za",
            SortOrder::PriceAsc => "lohi",
            SortOrder::PriceDesc => "hilo",
        }
    }

    /// Option label as shown in the storefront's sort menu.
    pub fn label(self) -> &'static str {
        match self {
            SortOrder::NameAsc => "Name (A to Z)",
            SortOrder::NameDesc => "Name (Z to A)",
            SortOrder::PriceAsc => "Price (low to high)",
            SortOrder::PriceDesc => "Price (high to low)",
        }
    }

    pub fn by_price(self) -> bool {
        matches!(self, SortOrder::PriceAsc | SortOrder::PriceDesc)
    }

    /// Whether `names` are in this order. Only meaningful for name orders.
    pub fn names_sorted(self, names: &[String]) -> bool {
        match self {
            SortOrder::NameAsc => names.windows(2).all(|w| w[0] <= w[1]),
            SortOrder::NameDesc => names.windows(2).all(|w| w[0] >= w[1]),
            _ => false,
        }
    }

    /// Whether `prices` are in this order. Only meaningful for price orders.
    pub fn prices_sorted(self, prices: &[f64]) -> bool {
        match self {
            SortOrder::PriceAsc => prices.windows(2).all(|w| w[0] <= w[1]),
            SortOrder::PriceDesc => prices.windows(2).all(|w| w[0] >= w[1]),
            _ => false,
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        SortOrder::ALL
            .into_iter()
            .find(|o| o.value() == s)
            .with_context(|| format!("Unknown sort order '{s}' (expected az, za, lohi or hilo)"))
    }
}

/// `"$29.99"` → `29.99`.
pub fn parse_price(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix('$').unwrap_or(trimmed).trim();
    digits
        .parse::<f64>()
        .with_context(|| format!("Invalid price '{text}'"))
}

/// `"Sauce Labs Backpack"` → `"sauce-labs-backpack"`, as used in button
/// `data-test` ids.
pub fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// First run of digits in a `data-test` value such as `item-4-title-link`.
pub fn extract_id(data_test: &str) -> Result<String> {
    let digits: String = data_test
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        bail!("Could not extract an item id from data-test '{data_test}'");
    }
    Ok(digits)
}
