//! Donut chart geometry.
//!
//! Angles are in degrees, measured clockwise with 0° at three o'clock, so the
//! default start of −90° is twelve o'clock.

use crate::aggregator::{checked_total, share_of};
use crate::settings::ChartSettings;
use log::{debug, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const OTHERS_LABEL: &str = "Others";

pub const FULL_CIRCLE_DEGREES: f64 = 360.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "index", rename_all = "camelCase")]
pub enum SliceColor {
    /// Position in the slice palette, already wrapped.
    Palette(usize),
    /// The reserved last palette entry.
    Others,
    /// Ring shown when there is nothing to split.
    Neutral,
}

impl SliceColor {
    /// Index into a palette of `palette_size` colours, `None` for the neutral ring.
    pub fn palette_index(&self, palette_size: usize) -> Option<usize> {
        match self {
            SliceColor::Palette(idx) => Some(*idx),
            SliceColor::Others => palette_size.checked_sub(1),
            SliceColor::Neutral => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ArcSegment {
    pub label: String,
    pub start_angle: f64,
    pub sweep_angle: f64,
    pub color: SliceColor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegendEntry {
    pub label: String,
    pub amount: Decimal,
    /// Fraction of the chart total, in `[0, 1]`.
    pub share: f64,
    pub color: SliceColor,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DonutLayout {
    pub arcs: Vec<ArcSegment>,
    pub legend: Vec<LegendEntry>,
    pub total: Decimal,
}

impl DonutLayout {
    pub fn is_empty_state(&self) -> bool {
        matches!(self.arcs.as_slice(), [only] if only.color == SliceColor::Neutral)
    }

    pub fn total_sweep(&self) -> f64 {
        self.arcs.iter().map(|a| a.sweep_angle).sum()
    }
}

/// Splits `values` (expected in descending order) into donut arcs.
///
/// The first `settings.max_slices` entries get their own arc, the remainder is
/// merged into a trailing "others" arc when it is non-zero. Each arc loses
/// `settings.slice_gap_degrees` of sweep (never going below zero) while the
/// next arc still starts after the full, un-gapped share. Negative amounts
/// count as zero. A zero total, or one too large to represent, draws a single
/// neutral full circle.
///
/// Slice colours cycle through `palette_size - 1` entries; the last palette
/// colour stays reserved for "others", so no slice can share its colour.
pub fn layout_arcs(values: &[(String, Decimal)], settings: &ChartSettings) -> DonutLayout {
    let amounts: Vec<(&str, Decimal)> = values
        .iter()
        .map(|(label, amount)| (label.as_str(), (*amount).max(Decimal::ZERO)))
        .collect();
    let total = checked_total(amounts.iter().map(|(_, amount)| *amount)).unwrap_or_else(|| {
        warn!("Donut total overflows, drawing neutral ring");
        Decimal::ZERO
    });

    let split = settings.max_slices.min(amounts.len());
    let (slices, rest) = amounts.split_at(split);
    let palette = settings.slice_palette_size();

    let legend: Vec<LegendEntry> = slices
        .iter()
        .enumerate()
        .map(|(idx, (label, amount))| LegendEntry {
            label: label.to_string(),
            amount: *amount,
            share: share_of(*amount, total),
            color: SliceColor::Palette(idx % palette),
        })
        .collect();

    if total.is_zero() {
        debug!("Donut has no data, drawing neutral ring");
        return DonutLayout {
            arcs: vec![ArcSegment {
                label: String::new(),
                start_angle: settings.start_angle_degrees,
                sweep_angle: FULL_CIRCLE_DEGREES,
                color: SliceColor::Neutral,
            }],
            legend,
            total,
        };
    }

    let mut arcs = Vec::with_capacity(split + 1);
    let mut angle = settings.start_angle_degrees;

    for entry in &legend {
        let full_sweep = entry.share * FULL_CIRCLE_DEGREES;
        arcs.push(ArcSegment {
            label: entry.label.clone(),
            start_angle: angle,
            sweep_angle: gapped_sweep(full_sweep, settings.slice_gap_degrees),
            color: entry.color,
        });
        angle += full_sweep;
    }

    let remaining =
        checked_total(rest.iter().map(|(_, amount)| *amount)).unwrap_or(Decimal::ZERO);
    if remaining > Decimal::ZERO {
        let full_sweep = share_of(remaining, total) * FULL_CIRCLE_DEGREES;
        arcs.push(ArcSegment {
            label: OTHERS_LABEL.to_string(),
            start_angle: angle,
            sweep_angle: gapped_sweep(full_sweep, settings.slice_gap_degrees),
            color: SliceColor::Others,
        });
    }

    debug!(
        "Laid out {} arcs for {} entries ({} merged into others)",
        arcs.len(),
        values.len(),
        rest.len()
    );

    DonutLayout {
        arcs,
        legend,
        total,
    }
}

fn gapped_sweep(full_sweep: f64, gap: f64) -> f64 {
    (full_sweep - gap).max(0.0)
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
    fn test_two_equal_slices() {
        let layout = layout_arcs(
            &series(&[("A", dec!(50)), ("B", dec!(50))]),
            &ChartSettings::default(),
        );

        assert_eq!(layout.arcs.len(), 2);
        assert!((layout.arcs[0].start_angle + 90.0).abs() < EPS);
        assert!((layout.arcs[0].sweep_angle - 172.0).abs() < EPS);
        assert!((layout.arcs[1].start_angle - 90.0).abs() < EPS);
        assert!((layout.arcs[1].sweep_angle - 172.0).abs() < EPS);
        assert_eq!(layout.arcs[0].color, SliceColor::Palette(0));
        assert_eq!(layout.arcs[1].color, SliceColor::Palette(1));
    }

    #[test]
    fn test_empty_data_draws_neutral_ring() {
        for values in [vec![], series(&[("A", dec!(0)), ("B", dec!(0))])] {
            let layout = layout_arcs(&values, &ChartSettings::default());
            assert!(layout.is_empty_state());
            assert_eq!(layout.arcs[0].sweep_angle, 360.0);
            assert_eq!(layout.arcs[0].start_angle, -90.0);
        }
    }

    #[test]
    fn test_remainder_merged_into_others() {
        let values = series(&[
            ("A", dec!(40)),
            ("B", dec!(20)),
            ("C", dec!(15)),
            ("D", dec!(10)),
            ("E", dec!(10)),
            ("F", dec!(5)),
        ]);
        let layout = layout_arcs(&values, &ChartSettings::default());

        assert_eq!(layout.arcs.len(), 5);
        assert_eq!(layout.legend.len(), 4);
        let others = &layout.arcs[4];
        assert_eq!(others.label, OTHERS_LABEL);
        assert_eq!(others.color, SliceColor::Others);
        // 15% of the circle, minus the gap
        assert!((others.sweep_angle - (54.0 - 8.0)).abs() < 1e-6);
        // starts after the 85% taken by the individual slices
        assert!((others.start_angle - (-90.0 + 306.0)).abs() < 1e-6);
        assert!((layout.total_sweep() - (360.0 - 5.0 * 8.0)).abs() < 1e-6);
    }

    #[test]
    fn test_zero_remainder_has_no_others_arc() {
        let values = series(&[
            ("A", dec!(1)),
            ("B", dec!(1)),
            ("C", dec!(1)),
            ("D", dec!(1)),
            ("E", dec!(0)),
        ]);
        let layout = layout_arcs(&values, &ChartSettings::default());
        assert_eq!(layout.arcs.len(), 4);
        assert!(layout.arcs.iter().all(|a| a.color != SliceColor::Others));
    }

    #[test]
    fn test_tiny_slices_never_go_negative() {
        let values = series(&[("Huge", dec!(1000)), ("Tiny", dec!(1))]);
        let layout = layout_arcs(&values, &ChartSettings::default());
        assert_eq!(layout.arcs[1].sweep_angle, 0.0);
        assert!(layout.arcs.iter().all(|a| a.sweep_angle >= 0.0));
    }

    #[test]
    fn test_palette_wraps() {
        let settings = ChartSettings {
            max_slices: 7,
            palette_size: 4,
            ..ChartSettings::default()
        };
        let values: Vec<(String, Decimal)> =
            (0..7).map(|i| (format!("C{}", i), dec!(10))).collect();
        let layout = layout_arcs(&values, &settings);

        let colors: Vec<SliceColor> = layout.arcs.iter().map(|a| a.color).collect();
        assert_eq!(
            colors,
            vec![
                SliceColor::Palette(0),
                SliceColor::Palette(1),
                SliceColor::Palette(2),
                SliceColor::Palette(0),
                SliceColor::Palette(1),
                SliceColor::Palette(2),
                SliceColor::Palette(0),
            ]
        );
        assert_eq!(SliceColor::Others.palette_index(4), Some(3));
        assert_eq!(SliceColor::Neutral.palette_index(4), None);
    }

    #[test]
    fn test_overflowing_total_draws_neutral_ring() {
        let values = series(&[("A", Decimal::MAX), ("B", Decimal::MAX)]);
        let layout = layout_arcs(&values, &ChartSettings::default());

        assert!(layout.is_empty_state());
        assert_eq!(layout.total, Decimal::ZERO);
        assert_eq!(layout.legend.len(), 2);
        assert!(layout.legend.iter().all(|entry| entry.share == 0.0));
    }

    #[test]
    fn test_legend_shares() {
        let values = series(&[("Rent", dec!(1000)), ("Food", dec!(600))]);
        let layout = layout_arcs(&values, &ChartSettings::default());
        assert_eq!(layout.total, dec!(1600));
        assert!((layout.legend[0].share - 0.625).abs() < EPS);
        assert!((layout.legend[1].share - 0.375).abs() < EPS);
    }

    #[test]
    fn test_negative_amounts_count_as_zero() {
        let values = series(&[("A", dec!(30)), ("Refund", dec!(-30))]);
        let layout = layout_arcs(&values, &ChartSettings::default());
        assert_eq!(layout.total, dec!(30));
        assert!((layout.arcs[0].sweep_angle - 352.0).abs() < EPS);
        assert_eq!(layout.arcs[1].sweep_angle, 0.0);
    }
}
