//! RGB565 palette for the dashboard
//!
//! Colors are written as 8-bit RGB shifted down to RGB565:
//! R>>3, G>>2, B>>3.

use embedded_graphics::pixelcolor::Rgb565;

use crate::history::ChartChannel;
use crate::metrics::AirQualityLevel;

// Screen surfaces

/// Screen fill behind every panel
pub const COLOR_BACKGROUND: Rgb565 = Rgb565::new(18 >> 3, 23 >> 2, 24 >> 3);

/// Reading and chart panels
pub const COLOR_FOREGROUND: Rgb565 = Rgb565::new(26 >> 3, 32 >> 2, 33 >> 3);

/// Panel outlines and chart grid
pub const COLOR_STROKE: Rgb565 = Rgb565::new(43 >> 3, 55 >> 2, 57 >> 3);

// Air quality bands, foreground for text and segments, background for pills

pub const COLOR_EXCELLENT_FOREGROUND: Rgb565 = Rgb565::new(95 >> 3, 185 >> 2, 141 >> 3);
pub const COLOR_EXCELLENT_BACKGROUND: Rgb565 = Rgb565::new(29 >> 3, 47 >> 2, 43 >> 3);

pub const COLOR_GOOD_FOREGROUND: Rgb565 = Rgb565::new(76 >> 3, 154 >> 2, 113 >> 3);
pub const COLOR_GOOD_BACKGROUND: Rgb565 = Rgb565::new(24 >> 3, 40 >> 2, 36 >> 3);

pub const COLOR_POOR_FOREGROUND: Rgb565 = Rgb565::new(200 >> 3, 145 >> 2, 85 >> 3);
pub const COLOR_POOR_BACKGROUND: Rgb565 = Rgb565::new(45 >> 3, 37 >> 2, 28 >> 3);

pub const COLOR_BAD_FOREGROUND: Rgb565 = Rgb565::new(190 >> 3, 95 >> 2, 95 >> 3);
pub const COLOR_BAD_BACKGROUND: Rgb565 = Rgb565::new(43 >> 3, 29 >> 2, 29 >> 3);

// Text

pub const WHITE: Rgb565 = Rgb565::new(31, 63, 31);

/// Secondary text
pub const LIGHT_GRAY: Rgb565 = Rgb565::new(21, 42, 21);

/// Stale values and placeholders
pub const GRAY: Rgb565 = Rgb565::new(16, 32, 16);

/// Grid lines and unlit indicator segments
pub const DARK_GRAY: Rgb565 = Rgb565::new(10, 20, 10);

// ============================================================================
// Chart Colors
// ============================================================================

pub const COLOR_TEMPERATURE: Rgb565 = Rgb565::new(230 >> 3, 140 >> 2, 90 >> 3);
pub const COLOR_HUMIDITY: Rgb565 = Rgb565::new(90 >> 3, 160 >> 2, 220 >> 3);
pub const COLOR_PRESSURE: Rgb565 = Rgb565::new(170 >> 3, 130 >> 2, 220 >> 3);

/// Line color for a chart channel
pub const fn channel_color(channel: ChartChannel) -> Rgb565 {
    match channel {
        ChartChannel::Temperature => COLOR_TEMPERATURE,
        ChartChannel::Humidity => COLOR_HUMIDITY,
        ChartChannel::Pressure => COLOR_PRESSURE,
        ChartChannel::AirQuality => COLOR_POOR_FOREGROUND,
    }
}

/// Pill background behind an air quality label
pub const fn level_background(level: AirQualityLevel) -> Rgb565 {
    match level {
        AirQualityLevel::Excellent => COLOR_EXCELLENT_BACKGROUND,
        AirQualityLevel::Good => COLOR_GOOD_BACKGROUND,
        AirQualityLevel::Poor => COLOR_POOR_BACKGROUND,
        AirQualityLevel::Bad => COLOR_BAD_BACKGROUND,
    }
}
