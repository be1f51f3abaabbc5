//! Dashboard rendering for the graphical display sink
//!
//! Everything here draws onto any `DrawTarget<Color = Rgb565>`, so the same
//! code drives the LCD panel and the desktop simulator.

pub mod chart;
pub mod colors;
pub mod dashboard;

pub use chart::ChartView;
pub use dashboard::Dashboard;

/// Width of the reference panel in pixels
pub const DISPLAY_WIDTH_PX: u32 = 320;

/// Height of the reference panel in pixels
pub const DISPLAY_HEIGHT_PX: u32 = 240;

/// Maximum length of a formatted label on the dashboard
pub const MAX_LABEL_LENGTH: usize = 32;
