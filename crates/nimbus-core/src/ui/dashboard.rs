//! Single-page dashboard for the graphical display
//!
//! Layout on the 320x240 reference panel:
//! - Header: clock on the left, connectivity on the right
//! - Readings: temperature, humidity, pressure with trend
//! - Air quality pill and the indicator bar mimic
//! - Chart of the selected channel across the bottom
//!
//! The dashboard is a [`StationSink`]. It caches what it is told and marks
//! itself dirty; the caller redraws when convenient.

use core::fmt::Write;

use embedded_graphics::mono_font::{
    MonoTextStyle,
    ascii::{FONT_6X10, FONT_10X20},
};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{
    CornerRadii, PrimitiveStyle, PrimitiveStyleBuilder, Rectangle, RoundedRectangle,
};
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};
use heapless::String;

use super::MAX_LABEL_LENGTH;
use super::chart::ChartView;
use super::colors::{
    COLOR_BACKGROUND, COLOR_BAD_FOREGROUND, COLOR_EXCELLENT_FOREGROUND, COLOR_STROKE, DARK_GRAY,
    GRAY, LIGHT_GRAY, WHITE, level_background,
};
use crate::clock::TimeOfDay;
use crate::history::{ChartChannel, ChartSnapshot};
use crate::indicator::{IndicatorFrame, IndicatorMode};
use crate::snapshot::StationSnapshot;
use crate::station::StationSink;

const HEADER_HEIGHT_PX: u32 = 24;
const PADDING_PX: i32 = 6;
const READING_ROW_PX: i32 = 22;
const PILL_SIZE: Size = Size::new(120, 24);
const PILL_RADIUS_PX: u32 = 8;
const SEGMENT_GAP_PX: u32 = 3;
const BAR_HEIGHT_PX: u32 = 12;

/// Top of the chart area, below the readings block
const CHART_TOP_PX: i32 = 120;

pub struct Dashboard {
    bounds: Rectangle,
    time: TimeOfDay,
    snapshot: Option<StationSnapshot>,
    charts: [Option<ChartSnapshot>; 4],
    selected: ChartChannel,
    indicator: IndicatorFrame,
    dirty: bool,
}

impl Dashboard {
    pub fn new(bounds: Rectangle, segments: u8) -> Self {
        Self {
            bounds,
            time: TimeOfDay::default(),
            snapshot: None,
            charts: [None, None, None, None],
            selected: ChartChannel::Pressure,
            indicator: IndicatorFrame::dark(segments),
            dirty: true,
        }
    }

    pub fn selected_chart(&self) -> ChartChannel {
        self.selected
    }

    pub fn select_chart(&mut self, channel: ChartChannel) {
        if self.selected != channel {
            self.selected = channel;
            self.dirty = true;
        }
    }

    /// Show the next chart channel, wrapping around
    pub fn cycle_chart(&mut self) {
        self.select_chart(self.selected.next());
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn snapshot(&self) -> Option<&StationSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn indicator(&self) -> IndicatorFrame {
        self.indicator
    }

    fn chart_view(&self) -> ChartView {
        let top = self.bounds.top_left.y + CHART_TOP_PX;
        let height = (self.bounds.size.height as i32 - CHART_TOP_PX - PADDING_PX).max(0) as u32;
        ChartView::new(Rectangle::new(
            Point::new(self.bounds.top_left.x + PADDING_PX, top),
            Size::new(
                self.bounds.size.width.saturating_sub(2 * PADDING_PX as u32),
                height,
            ),
        ))
    }

    pub fn draw<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        self.bounds
            .into_styled(PrimitiveStyle::with_fill(COLOR_BACKGROUND))
            .draw(display)?;

        self.draw_header(display)?;
        self.draw_readings(display)?;
        self.draw_air_quality(display)?;
        self.draw_indicator(display)?;

        if let Some(chart) = &self.charts[self.selected.index()] {
            self.chart_view().draw(chart, display)?;
        }

        Ok(())
    }

    fn draw_header<D: DrawTarget<Color = Rgb565>>(&self, display: &mut D) -> Result<(), D::Error> {
        let origin = self.bounds.top_left;
        let width = self.bounds.size.width;

        Rectangle::new(origin, Size::new(width, HEADER_HEIGHT_PX))
            .into_styled(
                PrimitiveStyleBuilder::new()
                    .fill_color(COLOR_BACKGROUND)
                    .stroke_color(COLOR_STROKE)
                    .stroke_width(1)
                    .build(),
            )
            .draw(display)?;

        let mut clock: String<MAX_LABEL_LENGTH> = String::new();
        let _ = write!(clock, "{}", self.time);
        let clock_color = if self.time.synchronized { WHITE } else { LIGHT_GRAY };
        Text::with_baseline(
            clock.as_str(),
            origin + Point::new(PADDING_PX, 2),
            MonoTextStyle::new(&FONT_10X20, clock_color),
            Baseline::Top,
        )
        .draw(display)?;

        let (label, color) = match self.snapshot.map(|s| s.connectivity) {
            Some(c) if c.is_online() => (c.label(), COLOR_EXCELLENT_FOREGROUND),
            Some(c) => (c.label(), GRAY),
            None => ("--", GRAY),
        };
        let right = TextStyleBuilder::new()
            .alignment(Alignment::Right)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(
            label,
            origin + Point::new(width as i32 - PADDING_PX, HEADER_HEIGHT_PX as i32 / 2),
            MonoTextStyle::new(&FONT_6X10, color),
            right,
        )
        .draw(display)?;

        Ok(())
    }

    fn draw_readings<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let top =
            self.bounds.top_left + Point::new(PADDING_PX, HEADER_HEIGHT_PX as i32 + PADDING_PX);

        let Some(snapshot) = self.snapshot.filter(|s| s.has_data()) else {
            return Text::with_baseline(
                "Waiting for sensor...",
                top,
                MonoTextStyle::new(&FONT_10X20, GRAY),
                Baseline::Top,
            )
            .draw(display)
            .map(|_| ());
        };
        let Some(m) = snapshot.metrics else {
            return Ok(());
        };

        let value_color = if snapshot.stale { GRAY } else { WHITE };
        let style = MonoTextStyle::new(&FONT_10X20, value_color);

        let mut line: String<MAX_LABEL_LENGTH> = String::new();
        let _ = write!(line, "{:.1} C  {:.0} %", m.temperature_c, m.humidity_pct);
        Text::with_baseline(line.as_str(), top, style, Baseline::Top).draw(display)?;

        line.clear();
        let _ = write!(
            line,
            "{:.1} hPa {}",
            m.pressure_hpa,
            snapshot.trend.symbol()
        );
        Text::with_baseline(
            line.as_str(),
            top + Point::new(0, READING_ROW_PX),
            style,
            Baseline::Top,
        )
        .draw(display)?;

        line.clear();
        let _ = write!(line, "Trend: {}", snapshot.trend.label());
        if snapshot.stale {
            let _ = write!(line, " (stale)");
        }
        Text::with_baseline(
            line.as_str(),
            top + Point::new(0, 2 * READING_ROW_PX),
            MonoTextStyle::new(&FONT_6X10, LIGHT_GRAY),
            Baseline::Top,
        )
        .draw(display)?;

        Ok(())
    }

    fn draw_air_quality<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let Some((m, level)) = self
            .snapshot
            .and_then(|s| s.metrics.zip(s.air_quality))
        else {
            return Ok(());
        };

        let top_left = self.bounds.top_left
            + Point::new(
                self.bounds.size.width as i32 - PADDING_PX - PILL_SIZE.width as i32,
                HEADER_HEIGHT_PX as i32 + PADDING_PX,
            );
        let pill = Rectangle::new(top_left, PILL_SIZE);

        RoundedRectangle::new(pill, CornerRadii::new(Size::new(PILL_RADIUS_PX, PILL_RADIUS_PX)))
            .into_styled(
                PrimitiveStyleBuilder::new()
                    .fill_color(level_background(level))
                    .stroke_color(level.color())
                    .stroke_width(1)
                    .build(),
            )
            .draw(display)?;

        let mut label: String<MAX_LABEL_LENGTH> = String::new();
        let _ = write!(label, "AQ {}% {}", m.air_quality_percent, level.label());
        let centered = TextStyleBuilder::new()
            .alignment(Alignment::Center)
            .baseline(Baseline::Middle)
            .build();
        Text::with_text_style(
            label.as_str(),
            pill.center(),
            MonoTextStyle::new(&FONT_6X10, level.color()),
            centered,
        )
        .draw(display)?;

        Ok(())
    }

    /// On-screen copy of the segment bar
    fn draw_indicator<D: DrawTarget<Color = Rgb565>>(
        &self,
        display: &mut D,
    ) -> Result<(), D::Error> {
        let segments = u32::from(self.indicator.segments.max(1));
        let width = PILL_SIZE.width;
        let segment_width = width.saturating_sub(SEGMENT_GAP_PX * (segments - 1)) / segments;
        let origin = self.bounds.top_left
            + Point::new(
                self.bounds.size.width as i32 - PADDING_PX - width as i32,
                HEADER_HEIGHT_PX as i32 + PADDING_PX * 2 + PILL_SIZE.height as i32,
            );

        let lit_color = match (self.indicator.mode, self.snapshot.and_then(|s| s.air_quality)) {
            (IndicatorMode::AlarmBlink, _) => COLOR_BAD_FOREGROUND,
            (IndicatorMode::Proportional, Some(level)) => level.color(),
            (IndicatorMode::Proportional, None) => DARK_GRAY,
        };

        for i in 0..self.indicator.segments {
            let x = (segment_width + SEGMENT_GAP_PX) * u32::from(i);
            let color = if self.indicator.is_lit(i) { lit_color } else { DARK_GRAY };
            Rectangle::new(
                origin + Point::new(x as i32, 0),
                Size::new(segment_width, BAR_HEIGHT_PX),
            )
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(display)?;
        }

        Ok(())
    }
}

impl StationSink for Dashboard {
    fn clock_tick(&mut self, time: TimeOfDay) {
        if self.time != time {
            self.time = time;
            self.dirty = true;
        }
    }

    fn metrics_updated(&mut self, snapshot: &StationSnapshot) {
        self.time = snapshot.time;
        self.indicator = snapshot.indicator;
        self.snapshot = Some(*snapshot);
        self.dirty = true;
    }

    fn chart_updated(&mut self, chart: &ChartSnapshot) {
        let channel = chart.channel;
        self.charts[channel.index()] = Some(chart.clone());
        if channel == self.selected {
            self.dirty = true;
        }
    }

    fn indicator_changed(&mut self, frame: IndicatorFrame) {
        self.indicator = frame;
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StationConfig;
    use crate::sensors::{GasResistance, Pressure, ReplaySensor, SensorSample};
    use crate::station::Station;
    use crate::ui::{DISPLAY_HEIGHT_PX, DISPLAY_WIDTH_PX};
    use embedded_graphics::mock_display::MockDisplay;

    fn dashboard() -> Dashboard {
        Dashboard::new(
            Rectangle::new(
                Point::zero(),
                Size::new(DISPLAY_WIDTH_PX, DISPLAY_HEIGHT_PX),
            ),
            8,
        )
    }

    fn station() -> Station<ReplaySensor> {
        let sample = SensorSample::new(
            22.0,
            38.0,
            Pressure::Pascals(101_200.0),
            GasResistance::Ohms(20_000.0),
            0,
        );
        let sensor = ReplaySensor::new().then_ok(sample);
        Station::new(StationConfig::default(), sensor).unwrap()
    }

    #[test]
    fn test_sink_caches_updates() {
        let mut dash = dashboard();
        dash.mark_clean();

        let mut station = station();
        station.poll(0, &mut dash);

        assert!(dash.is_dirty());
        let snapshot = dash.snapshot().unwrap();
        assert_eq!(snapshot.metrics.map(|m| m.pressure_hpa), Some(1012.0));
        assert!(dash.charts.iter().all(|c| c.is_some()));
    }

    #[test]
    fn test_unselected_chart_does_not_dirty() {
        let mut dash = dashboard();
        let station = station();
        dash.mark_clean();

        dash.chart_updated(&station.chart(ChartChannel::Humidity));
        assert!(!dash.is_dirty());
        dash.chart_updated(&station.chart(ChartChannel::Pressure));
        assert!(dash.is_dirty());
    }

    #[test]
    fn test_cycle_chart() {
        let mut dash = dashboard();
        assert_eq!(dash.selected_chart(), ChartChannel::Pressure);
        dash.cycle_chart();
        assert_eq!(dash.selected_chart(), ChartChannel::AirQuality);
        dash.cycle_chart();
        assert_eq!(dash.selected_chart(), ChartChannel::Temperature);
    }

    #[test]
    fn test_draw_with_and_without_data() {
        let mut display: MockDisplay<Rgb565> = MockDisplay::new();
        display.set_allow_overdraw(true);
        display.set_allow_out_of_bounds_drawing(true);

        let mut dash = dashboard();
        dash.draw(&mut display).unwrap();

        station().poll(0, &mut dash);
        dash.draw(&mut display).unwrap();
    }
}
