use crate::error::{AnalyticsError, Result};
use crate::schema::{AggregationWindow, CurrencySelection, TimePeriod, TransactionTypeFilter};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on bars a single chart may show.
pub const MAX_VISIBLE_BARS: usize = 6;

/// Visual constants shared by the bar and donut layouts.
///
/// Every field has a default, so a JSON override only needs the keys it changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(default)]
pub struct ChartSettings {
    #[schemars(description = "Maximum number of bars drawn; extra values are ignored")]
    pub max_visible_bars: usize,

    #[schemars(description = "Number of y-axis intervals between zero and the maximum amount")]
    pub y_steps: usize,

    #[schemars(
        description = "Each bar's horizontal slot is canvas_width / (bar_count * bar_slot_factor)"
    )]
    pub bar_slot_factor: f64,

    #[schemars(description = "Bar width as a fraction of its slot, in (0, 1]")]
    pub bar_width_ratio: f64,

    #[schemars(description = "Radius of the highlight marker as a fraction of the bar width")]
    pub marker_radius_ratio: f64,

    #[schemars(description = "Scale used for bars when there are no values to take a maximum from")]
    pub fallback_max_amount: f64,

    #[schemars(description = "Characters kept from each x-axis label")]
    pub label_abbreviation: usize,

    #[schemars(description = "Entries that get their own donut slice; the rest are merged into 'others'")]
    pub max_slices: usize,

    #[schemars(description = "Degrees removed from every slice to leave a visual gap")]
    pub slice_gap_degrees: f64,

    #[schemars(description = "Angle of the first slice; -90 is twelve o'clock")]
    pub start_angle_degrees: f64,

    #[schemars(
        description = "Number of palette colours. Slices cycle through all but the last, which is reserved for 'others'."
    )]
    pub palette_size: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            max_visible_bars: 6,
            y_steps: 5,
            bar_slot_factor: 1.5,
            bar_width_ratio: 0.8,
            marker_radius_ratio: 0.2,
            fallback_max_amount: 100.0,
            label_abbreviation: 3,
            max_slices: 4,
            slice_gap_degrees: 8.0,
            start_angle_degrees: -90.0,
            palette_size: 5,
        }
    }
}

impl ChartSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: ChartSettings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn json_schema() -> Result<String> {
        let schema = schemars::schema_for!(ChartSettings);
        Ok(serde_json::to_string_pretty(&schema)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_VISIBLE_BARS).contains(&self.max_visible_bars) {
            return Err(AnalyticsError::InvalidChartSettings(format!(
                "max_visible_bars must be between 1 and {} (got {})",
                MAX_VISIBLE_BARS, self.max_visible_bars
            )));
        }

        if self.y_steps == 0 {
            return Err(AnalyticsError::InvalidChartSettings(
                "y_steps must be at least 1".to_string(),
            ));
        }

        if !self.bar_slot_factor.is_finite() || self.bar_slot_factor <= 0.0 {
            return Err(AnalyticsError::InvalidChartSettings(format!(
                "bar_slot_factor must be positive (got {})",
                self.bar_slot_factor
            )));
        }

        for (name, ratio) in [
            ("bar_width_ratio", self.bar_width_ratio),
            ("marker_radius_ratio", self.marker_radius_ratio),
        ] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(AnalyticsError::InvalidChartSettings(format!(
                    "{} must be in (0, 1] (got {})",
                    name, ratio
                )));
            }
        }

        if !self.fallback_max_amount.is_finite() || self.fallback_max_amount <= 0.0 {
            return Err(AnalyticsError::InvalidChartSettings(format!(
                "fallback_max_amount must be positive (got {})",
                self.fallback_max_amount
            )));
        }

        for (name, count) in [
            ("label_abbreviation", self.label_abbreviation),
            ("max_slices", self.max_slices),
        ] {
            if count == 0 {
                return Err(AnalyticsError::InvalidChartSettings(format!(
                    "{} must be at least 1",
                    name
                )));
            }
        }

        if !self.slice_gap_degrees.is_finite() || self.slice_gap_degrees < 0.0 {
            return Err(AnalyticsError::InvalidChartSettings(format!(
                "slice_gap_degrees must be non-negative (got {})",
                self.slice_gap_degrees
            )));
        }

        if !self.start_angle_degrees.is_finite() {
            return Err(AnalyticsError::InvalidChartSettings(
                "start_angle_degrees must be finite".to_string(),
            ));
        }

        if self.palette_size < 2 {
            return Err(AnalyticsError::InvalidChartSettings(format!(
                "palette_size must leave at least one slice colour besides 'others' (got {})",
                self.palette_size
            )));
        }

        Ok(())
    }

    /// Colours available to individual slices.
    pub fn slice_palette_size(&self) -> usize {
        self.palette_size.saturating_sub(1).max(1)
    }
}

/// Everything a host needs to send to build one analytics report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct AnalyticsRequest {
    pub period: TimePeriod,

    pub currency: CurrencySelection,

    #[serde(default)]
    pub type_filter: TransactionTypeFilter,

    #[serde(default)]
    pub chart: ChartSettings,
}

impl AnalyticsRequest {
    pub fn new(period: TimePeriod, currency: CurrencySelection) -> Self {
        Self {
            period,
            currency,
            type_filter: TransactionTypeFilter::default(),
            chart: ChartSettings::default(),
        }
    }

    pub fn with_type_filter(mut self, type_filter: TransactionTypeFilter) -> Self {
        self.type_filter = type_filter;
        self
    }

    pub fn with_chart_settings(mut self, chart: ChartSettings) -> Self {
        self.chart = chart;
        self
    }

    /// Resolves the relative period against `today`.
    pub fn window(&self, today: NaiveDate) -> AggregationWindow {
        AggregationWindow::new(
            self.period.date_range(today),
            self.currency.clone(),
            self.type_filter,
        )
    }
}
