pub mod chrome;
pub mod connection;

pub use self::chrome::{Chrome, LaunchOptions};
pub use self::connection::CdpConnection;

/// Clip region in CSS pixels, document coordinates (used by `Page.captureScreenshot`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClipRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}
