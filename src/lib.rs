//! # Spending Insights
//!
//! Turns transaction records into the numbers and shapes behind a spending
//! analytics screen.
//!
//! ## Core Concepts
//!
//! - **Aggregation Window**: date range, currency (or unified mode) and transaction-type filter
//! - **Snapshot**: totals, average, top category and ordered category / merchant breakdowns for one window
//! - **Bar Layout**: rectangles, y-axis ticks, an average reference line and a highlight marker
//! - **Donut Layout**: arcs for the largest entries plus one "others" arc, or a neutral ring when empty
//!
//! Amounts are exact decimals; geometry is `f64`. Everything is a pure function
//! of its inputs, so identical inputs always produce identical layouts.
//!
//! ## Example
//!
//! ```rust,ignore
//! use spending_insights::*;
//! use chrono::NaiveDate;
//!
//! let request = AnalyticsRequest::new(
//!     TimePeriod::ThisMonth,
//!     CurrencySelection::Code("USD".to_string()),
//! );
//! let today = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
//!
//! let report = build_report(&records, &request, today, CanvasSize::new(320.0, 240.0)).unwrap();
//! println!("{:?} takes {:.0}%", report.snapshot.top_category, report.snapshot.top_category_percentage * 100.0);
//! ```

pub mod aggregator;
pub mod bar_chart;
pub mod donut_chart;
pub mod error;
pub mod ingestion;
pub mod schema;
pub mod settings;
pub mod utils;

pub use aggregator::{
    aggregate, aggregate_per_currency, available_currencies, checked_total, share_of,
    should_offer_currency_choice, split_visible, top_merchants, VISIBLE_MERCHANT_ROWS,
};
pub use bar_chart::{axis_steps, layout_bars, AxisStep, Bar, BarLayout, CanvasSize, Marker};
pub use donut_chart::{
    layout_arcs, ArcSegment, DonutLayout, LegendEntry, SliceColor, OTHERS_LABEL,
};
pub use error::{AnalyticsError, Result};
pub use ingestion::*;
pub use schema::*;
pub use settings::{AnalyticsRequest, ChartSettings, MAX_VISIBLE_BARS};
pub use utils::*;

use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Everything the analytics screen draws for one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub window: AggregationWindow,
    pub snapshot: AnalyticsSnapshot,
    pub category_bars: BarLayout,
    pub category_donut: DonutLayout,
}

pub struct AnalyticsProcessor;

impl AnalyticsProcessor {
    pub fn process(
        records: &[TransactionRecord],
        request: &AnalyticsRequest,
        today: NaiveDate,
        canvas: CanvasSize,
    ) -> Result<AnalyticsReport> {
        request.chart.validate()?;

        let window = request.window(today);
        info!(
            "Building analytics for {} records, {}..={} in {}",
            records.len(),
            window.period.start,
            window.period.end,
            window.currency.display_code()
        );

        let snapshot = aggregate(records, &window)?;
        let series = snapshot.category_series();
        let average = snapshot.average_amount.to_f64();

        let category_bars = layout_bars(&series, None, average, canvas, &request.chart);
        let category_donut = layout_arcs(&series, &request.chart);

        debug!(
            "Report has {} bars and {} arcs",
            category_bars.bars.len(),
            category_donut.arcs.len()
        );

        Ok(AnalyticsReport {
            window,
            snapshot,
            category_bars,
            category_donut,
        })
    }

    /// Parses the request from JSON before processing.
    pub fn process_json(
        records: &[TransactionRecord],
        request_json: &str,
        today: NaiveDate,
        canvas: CanvasSize,
    ) -> Result<AnalyticsReport> {
        let request: AnalyticsRequest = serde_json::from_str(request_json)?;
        Self::process(records, &request, today, canvas)
    }
}

pub fn build_report(
    records: &[TransactionRecord],
    request: &AnalyticsRequest,
    today: NaiveDate,
    canvas: CanvasSize,
) -> Result<AnalyticsReport> {
    AnalyticsProcessor::process(records, request, today, canvas)
}
