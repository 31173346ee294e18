//! Bar chart geometry.
//!
//! Coordinates use a top-left origin with y growing downwards, so a bar's
//! `y` is the top edge and it extends `height` down to the baseline at
//! `canvas.height`.

use crate::settings::ChartSettings;
use crate::utils::abbreviate_label;
use log::debug;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: sanitize_length(width),
            height: sanitize_length(height),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Bar {
    pub label: String,
    /// Shortened label for the x-axis.
    pub axis_label: String,
    pub amount: f64,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub is_highlighted: bool,
}

impl Bar {
    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// One y-axis tick: its value and the y-coordinate of its grid line.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AxisStep {
    pub value: f64,
    pub y: f64,
}

/// Dot drawn on the highlighted bar.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BarLayout {
    pub bars: Vec<Bar>,
    pub max_amount: f64,
    /// Ticks from zero (bottom) to `max_amount` (top).
    pub y_steps: Vec<AxisStep>,
    pub average_line_y: Option<f64>,
    pub marker: Option<Marker>,
}

impl BarLayout {
    pub fn highlighted(&self) -> Option<&Bar> {
        self.bars.iter().find(|b| b.is_highlighted)
    }
}

/// Lays out up to `settings.max_visible_bars` bars across the canvas.
///
/// `max_amount` scales the bars; when absent the largest value is used, and
/// when there are no values either, `settings.fallback_max_amount`. A zero
/// maximum yields flat bars rather than a division by zero. `average` is
/// drawn as a reference line only when it lies within `[0, max_amount]`.
pub fn layout_bars(
    values: &[(String, Decimal)],
    max_amount: Option<f64>,
    average: Option<f64>,
    canvas: CanvasSize,
    settings: &ChartSettings,
) -> BarLayout {
    let canvas = CanvasSize::new(canvas.width, canvas.height);
    let visible: Vec<(&str, f64)> = values
        .iter()
        .take(settings.max_visible_bars)
        .map(|(label, amount)| (label.as_str(), amount.to_f64().unwrap_or(0.0)))
        .collect();

    let max_amount = resolve_max_amount(&visible, max_amount, settings.fallback_max_amount);
    let bars = place_bars(&visible, max_amount, canvas, settings);
    let y_steps = axis_steps(max_amount, canvas.height, settings.y_steps);

    let average_line_y = average
        .filter(|avg| avg.is_finite() && *avg >= 0.0 && *avg <= max_amount)
        .map(|avg| canvas.height - scaled_height(avg, max_amount, canvas.height));

    let marker = bars.iter().find(|b| b.is_highlighted).map(|bar| {
        let on_average_line = average
            .filter(|avg| *avg > 0.0)
            .and(average_line_y);
        Marker {
            center_x: bar.center_x(),
            center_y: on_average_line.unwrap_or(bar.y),
            radius: bar.width * settings.marker_radius_ratio,
        }
    });

    debug!(
        "Laid out {} of {} bars on {}x{} canvas (max {})",
        bars.len(),
        values.len(),
        canvas.width,
        canvas.height,
        max_amount
    );

    BarLayout {
        bars,
        max_amount,
        y_steps,
        average_line_y,
        marker,
    }
}

/// Evenly spaced ticks `(max / steps) * i` for `i` in `0..=steps`.
pub fn axis_steps(max_amount: f64, canvas_height: f64, steps: usize) -> Vec<AxisStep> {
    if steps == 0 {
        return Vec::new();
    }
    let value_step = max_amount / steps as f64;
    let pixel_step = canvas_height / steps as f64;
    (0..=steps)
        .map(|i| AxisStep {
            value: value_step * i as f64,
            y: canvas_height - pixel_step * i as f64,
        })
        .collect()
}

fn resolve_max_amount(visible: &[(&str, f64)], requested: Option<f64>, fallback: f64) -> f64 {
    if let Some(max) = requested.filter(|m| m.is_finite() && *m >= 0.0) {
        return max;
    }
    visible
        .iter()
        .map(|(_, amount)| *amount)
        .fold(None, |acc: Option<f64>, amount| match acc {
            Some(current) if current >= amount => Some(current),
            _ => Some(amount),
        })
        .map(|max| max.max(0.0))
        .unwrap_or(fallback)
}

fn place_bars(
    visible: &[(&str, f64)],
    max_amount: f64,
    canvas: CanvasSize,
    settings: &ChartSettings,
) -> Vec<Bar> {
    if visible.is_empty() {
        return Vec::new();
    }

    let count = visible.len() as f64;
    let slot = canvas.width / (count * settings.bar_slot_factor);
    let bar_width = slot * settings.bar_width_ratio;
    let start_x = (canvas.width - count * slot) / 2.0;

    let highlighted = highlighted_index(visible);

    visible
        .iter()
        .enumerate()
        .map(|(idx, (label, amount))| {
            let height = scaled_height(*amount, max_amount, canvas.height);
            Bar {
                label: label.to_string(),
                axis_label: abbreviate_label(label, settings.label_abbreviation),
                amount: *amount,
                x: start_x + idx as f64 * slot + slot / 2.0 - bar_width / 2.0,
                y: canvas.height - height,
                width: bar_width,
                height,
                is_highlighted: Some(idx) == highlighted,
            }
        })
        .collect()
}

// First occurrence wins on ties
fn highlighted_index(visible: &[(&str, f64)]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, (_, amount)) in visible.iter().enumerate() {
        match best {
            Some((_, current)) if *amount <= current => {}
            _ => best = Some((idx, *amount)),
        }
    }
    best.map(|(idx, _)| idx)
}

fn scaled_height(amount: f64, max_amount: f64, canvas_height: f64) -> f64 {
    if max_amount <= 0.0 || !amount.is_finite() {
        return 0.0;
    }
    ((amount / max_amount) * canvas_height).clamp(0.0, canvas_height)
}

fn sanitize_length(value: f64) -> f64 {
    if value.is_finite() {
        value.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const EPS: f64 = 1e-9;

    fn series(values: &[(&str, Decimal)]) -> Vec<(String, Decimal)> {
        values.iter().map(|(l, a)| (l.to_string(), *a)).collect()
    }

    #[test]
    fn test_bar_positions_and_sizes() {
        let values = series(&[("Rent", dec!(1000)), ("Food", dec!(500))]);
        let layout = layout_bars(
            &values,
            None,
            None,
            CanvasSize::new(300.0, 200.0),
            &ChartSettings::default(),
        );

        // slot = 300 / (2 * 1.5) = 100, width = 80, row of 200 centred from x = 50
        assert_eq!(layout.bars.len(), 2);
        let rent = &layout.bars[0];
        assert!((rent.width - 80.0).abs() < EPS);
        assert!((rent.x - 60.0).abs() < EPS);
        assert!((rent.height - 200.0).abs() < EPS);
        assert!(rent.y.abs() < EPS);
        assert!(rent.is_highlighted);
        assert_eq!(rent.axis_label, "Ren");

        let food = &layout.bars[1];
        assert!((food.x - 160.0).abs() < EPS);
        assert!((food.height - 100.0).abs() < EPS);
        assert!((food.y - 100.0).abs() < EPS);
        assert!(!food.is_highlighted);
    }

    #[test]
    fn test_only_six_bars_are_visible() {
        let values: Vec<(String, Decimal)> = (0..9)
            .map(|i| (format!("C{}", i), Decimal::from(100 - i)))
            .collect();
        let layout = layout_bars(
            &values,
            None,
            None,
            CanvasSize::new(600.0, 100.0),
            &ChartSettings::default(),
        );
        assert_eq!(layout.bars.len(), 6);
        assert_eq!(layout.bars[5].label, "C5");
    }

    #[test]
    fn test_empty_values_use_fallback_max() {
        let layout = layout_bars(
            &[],
            None,
            Some(50.0),
            CanvasSize::new(300.0, 200.0),
            &ChartSettings::default(),
        );
        assert!(layout.bars.is_empty());
        assert_eq!(layout.max_amount, 100.0);
        assert_eq!(layout.y_steps.len(), 6);
        assert!((layout.y_steps[5].value - 100.0).abs() < EPS);
        assert!((layout.average_line_y.unwrap() - 100.0).abs() < EPS);
        assert!(layout.marker.is_none());
    }

    #[test]
    fn test_heights_clamped_to_canvas() {
        let values = series(&[("Big", dec!(500)), ("Negative", dec!(-20))]);
        let layout = layout_bars(
            &values,
            Some(250.0),
            None,
            CanvasSize::new(100.0, 80.0),
            &ChartSettings::default(),
        );
        assert!((layout.bars[0].height - 80.0).abs() < EPS);
        assert_eq!(layout.bars[1].height, 0.0);
        assert!((layout.bars[1].y - 80.0).abs() < EPS);
    }

    #[test]
    fn test_zero_max_gives_flat_bars() {
        let values = series(&[("A", dec!(0)), ("B", dec!(0))]);
        let layout = layout_bars(
            &values,
            None,
            Some(0.0),
            CanvasSize::new(100.0, 80.0),
            &ChartSettings::default(),
        );
        assert_eq!(layout.max_amount, 0.0);
        assert!(layout.bars.iter().all(|b| b.height == 0.0));
        assert!(layout.y_steps.iter().all(|s| s.value == 0.0));
        assert!(layout.bars[0].is_highlighted);
        assert_eq!(layout.average_line_y, Some(80.0));
    }

    #[test]
    fn test_highlight_prefers_first_maximum() {
        let values = series(&[("A", dec!(10)), ("B", dec!(40)), ("C", dec!(40))]);
        let layout = layout_bars(
            &values,
            None,
            None,
            CanvasSize::new(100.0, 100.0),
            &ChartSettings::default(),
        );
        let highlighted: Vec<&str> = layout
            .bars
            .iter()
            .filter(|b| b.is_highlighted)
            .map(|b| b.label.as_str())
            .collect();
        assert_eq!(highlighted, vec!["B"]);
        assert_eq!(layout.highlighted().map(|b| b.label.as_str()), Some("B"));
    }

    #[test]
    fn test_heights_monotonic_in_amount() {
        let values = series(&[
            ("A", dec!(5)),
            ("B", dec!(120)),
            ("C", dec!(37.5)),
            ("D", dec!(120)),
            ("E", dec!(0.01)),
        ]);
        let layout = layout_bars(
            &values,
            Some(100.0),
            None,
            CanvasSize::new(500.0, 300.0),
            &ChartSettings::default(),
        );
        for a in &layout.bars {
            for b in &layout.bars {
                if a.amount > b.amount {
                    assert!(a.height >= b.height, "{} vs {}", a.label, b.label);
                }
            }
        }
    }

    #[test]
    fn test_axis_steps() {
        let steps = axis_steps(250.0, 100.0, 5);
        let values: Vec<f64> = steps.iter().map(|s| s.value).collect();
        assert_eq!(values, vec![0.0, 50.0, 100.0, 150.0, 200.0, 250.0]);
        assert!((steps[0].y - 100.0).abs() < EPS);
        assert!(steps[5].y.abs() < EPS);
    }

    #[test]
    fn test_average_line_and_marker() {
        let values = series(&[("Rent", dec!(1000)), ("Food", dec!(500))]);
        let canvas = CanvasSize::new(300.0, 200.0);
        let layout = layout_bars(&values, None, Some(250.0), canvas, &ChartSettings::default());

        let avg_y = layout.average_line_y.unwrap();
        assert!((avg_y - 150.0).abs() < EPS);

        let marker = layout.marker.unwrap();
        assert!((marker.center_x - 100.0).abs() < EPS);
        assert!((marker.center_y - 150.0).abs() < EPS);
        assert!((marker.radius - 16.0).abs() < EPS);
    }

    #[test]
    fn test_average_out_of_range_has_no_line() {
        let values = series(&[("Rent", dec!(1000))]);
        let canvas = CanvasSize::new(300.0, 200.0);
        let layout = layout_bars(&values, None, Some(1500.0), canvas, &ChartSettings::default());
        assert!(layout.average_line_y.is_none());
        // without a usable line the marker sits on top of the bar
        let marker = layout.marker.unwrap();
        assert!((marker.center_y - layout.bars[0].y).abs() < EPS);

        let layout = layout_bars(&values, None, Some(-1.0), canvas, &ChartSettings::default());
        assert!(layout.average_line_y.is_none());
    }

    #[test]
    fn test_layout_is_deterministic() {
        let values = series(&[("A", dec!(3)), ("B", dec!(9)), ("C", dec!(1))]);
        let canvas = CanvasSize::new(320.0, 240.0);
        let first = layout_bars(&values, None, Some(4.0), canvas, &ChartSettings::default());
        let second = layout_bars(&values, None, Some(4.0), canvas, &ChartSettings::default());
        assert_eq!(first, second);
    }

    #[test]
    fn test_canvas_size_sanitized() {
        let canvas = CanvasSize::new(-10.0, f64::NAN);
        assert_eq!(canvas.width, 0.0);
        assert_eq!(canvas.height, 0.0);
    }
}
