//! Line chart for one history channel
//!
//! Slots are spread evenly across the plot width, oldest on the left. Absent
//! slots break the line instead of dropping to zero, and the vertical scale
//! comes from the snapshot's auto-ranged [`ChartRange`].

use core::fmt::Write;

use embedded_graphics::mono_font::{MonoTextStyle, ascii::FONT_6X10};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line, PrimitiveStyle, Rectangle};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;

use super::MAX_LABEL_LENGTH;
use super::colors::{COLOR_BACKGROUND, COLOR_STROKE, DARK_GRAY, LIGHT_GRAY, channel_color};
use crate::history::ChartSnapshot;

/// Space reserved left of the plot for the range labels
const LABEL_GUTTER_PX: u32 = 44;

/// Space reserved above the plot for the title
const TITLE_HEIGHT_PX: u32 = 12;

/// Horizontal grid lines inside the plot, excluding its edges
const GRID_LINES: u32 = 3;

const LINE_WIDTH_PX: u32 = 2;

#[derive(Debug, Clone, Copy)]
pub struct ChartView {
    bounds: Rectangle,
}

impl ChartView {
    pub fn new(bounds: Rectangle) -> Self {
        Self { bounds }
    }

    pub fn bounds(&self) -> Rectangle {
        self.bounds
    }

    /// Area the data is plotted in
    pub fn plot_area(&self) -> Rectangle {
        let size = self.bounds.size;
        Rectangle::new(
            self.bounds.top_left + Point::new(LABEL_GUTTER_PX as i32, TITLE_HEIGHT_PX as i32),
            Size::new(
                size.width.saturating_sub(LABEL_GUTTER_PX + 1),
                size.height.saturating_sub(TITLE_HEIGHT_PX + 1),
            ),
        )
    }

    /// Screen position of every slot, `None` for absent slots
    pub fn points<'a>(
        &self,
        chart: &'a ChartSnapshot,
    ) -> impl Iterator<Item = Option<Point>> + 'a {
        let plot = self.plot_area();
        let last = chart.values.len().saturating_sub(1).max(1) as i32;
        let columns = plot.size.width.saturating_sub(1) as i32;
        let range = chart.range;

        chart.values.iter().enumerate().map(move |(i, slot)| {
            slot.map(|value| {
                let x = plot.top_left.x + i as i32 * columns / last;
                let y = range.to_pixel_y(value, plot.top_left.y, plot.size.height);
                Point::new(x, y)
            })
        })
    }

    pub fn draw<D: DrawTarget<Color = Rgb565>>(
        &self,
        chart: &ChartSnapshot,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let plot = self.plot_area();

        self.bounds
            .into_styled(PrimitiveStyle::with_fill(COLOR_BACKGROUND))
            .draw(display)?;

        self.draw_grid(plot, display)?;
        self.draw_labels(chart, plot, display)?;

        let line_style = PrimitiveStyle::with_stroke(channel_color(chart.channel), LINE_WIDTH_PX);
        let mut previous: Option<Point> = None;
        for point in self.points(chart) {
            match (previous, point) {
                (Some(a), Some(b)) => Line::new(a, b).into_styled(line_style).draw(display)?,
                // Isolated point, draw a dot so a lone sample is visible
                (None, Some(b)) => Rectangle::with_center(b, Size::new(2, 2))
                    .into_styled(PrimitiveStyle::with_fill(channel_color(chart.channel)))
                    .draw(display)?,
                _ => {}
            }
            previous = point;
        }

        Ok(())
    }

    fn draw_grid<D: DrawTarget<Color = Rgb565>>(
        &self,
        plot: Rectangle,
        display: &mut D,
    ) -> Result<(), D::Error> {
        plot.into_styled(PrimitiveStyle::with_stroke(COLOR_STROKE, 1)).draw(display)?;

        let spacing = plot.size.height / (GRID_LINES + 1);
        let right = plot.top_left.x + plot.size.width as i32 - 1;
        for i in 1..=GRID_LINES {
            let y = plot.top_left.y + (spacing * i) as i32;
            Line::new(Point::new(plot.top_left.x, y), Point::new(right, y))
                .into_styled(PrimitiveStyle::with_stroke(DARK_GRAY, 1))
                .draw(display)?;
        }

        Ok(())
    }

    fn draw_labels<D: DrawTarget<Color = Rgb565>>(
        &self,
        chart: &ChartSnapshot,
        plot: Rectangle,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let style = MonoTextStyle::new(&FONT_6X10, LIGHT_GRAY);
        let label_x = plot.top_left.x - 4;

        let mut title: String<MAX_LABEL_LENGTH> = String::new();
        let _ = write!(title, "{} ({})", chart.channel.label(), chart.channel.unit());
        Text::with_baseline(title.as_str(), self.bounds.top_left, style, Baseline::Top)
            .draw(display)?;

        let right_top = TextStyleBuilder::new()
            .alignment(Alignment::Right)
            .baseline(Baseline::Top)
            .build();
        let right_bottom = TextStyleBuilder::new()
            .alignment(Alignment::Right)
            .baseline(Baseline::Bottom)
            .build();

        let max = format_value(chart.range.max);
        Text::with_text_style(max.as_str(), Point::new(label_x, plot.top_left.y), style, right_top)
            .draw(display)?;

        let min = format_value(chart.range.min);
        let bottom = plot.top_left.y + plot.size.height as i32;
        Text::with_text_style(min.as_str(), Point::new(label_x, bottom), style, right_bottom)
            .draw(display)?;

        Ok(())
    }
}

/// Fixed-capacity label, one decimal for small magnitudes
fn format_value(value: f32) -> String<MAX_LABEL_LENGTH> {
    let mut s = String::new();
    if libm::fabsf(value) >= 1000.0 {
        let _ = write!(s, "{:.0}", value);
    } else {
        let _ = write!(s, "{:.1}", value);
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{ChartChannel, ChartRange};
    use alloc::vec;
    use embedded_graphics::mock_display::MockDisplay;

    fn view() -> ChartView {
        // 64x64 plot area at (44, 12)
        ChartView::new(Rectangle::new(Point::zero(), Size::new(109, 77)))
    }

    fn chart(values: alloc::vec::Vec<Option<f32>>) -> ChartSnapshot {
        ChartSnapshot {
            channel: ChartChannel::Temperature,
            values,
            range: ChartRange { min: 0.0, max: 10.0 },
        }
    }

    #[test]
    fn test_plot_area_reserves_gutters() {
        let plot = view().plot_area();
        assert_eq!(plot.top_left, Point::new(44, 12));
        assert_eq!(plot.size, Size::new(64, 64));
    }

    #[test]
    fn test_points_span_plot_and_keep_gaps() {
        let data = chart(vec![Some(10.0), None, Some(0.0)]);
        let points: alloc::vec::Vec<_> = view().points(&data).collect();
        assert_eq!(points[0], Some(Point::new(44, 12)));
        assert_eq!(points[1], None);
        assert_eq!(points[2], Some(Point::new(44 + 63, 12 + 63)));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(21.46).as_str(), "21.5");
        assert_eq!(format_value(1013.4).as_str(), "1013");
    }

    #[test]
    fn test_draw_onto_display() {
        let mut display: MockDisplay<Rgb565> = MockDisplay::new();
        display.set_allow_overdraw(true);
        display.set_allow_out_of_bounds_drawing(true);

        let view = ChartView::new(Rectangle::new(Point::zero(), Size::new(64, 64)));
        let data = chart(vec![None, Some(2.0), Some(8.0), None, Some(5.0)]);
        view.draw(&data, &mut display).unwrap();

        let plot = view.plot_area();
        assert_eq!(display.get_pixel(plot.top_left), Some(COLOR_STROKE));
    }
}
