//! VolatilityLab terminal console.
//!
//! - Sidebar navigation (Home, Trade, Performance, News, Settings)
//! - Strategy carousel with page dots and a transition window
//! - Configuration form with a disabled-submit hint
//! - Results card and braille equity chart

pub mod app;
pub mod input;
pub mod persistence;
pub mod theme;
pub mod ui;

pub use app::{AppState, Page};
pub use input::handle_key;
