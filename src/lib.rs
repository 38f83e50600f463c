//! Embeddable TradingView lightweight-charts fragments built from polars frames.

pub mod chart;
pub mod df_utils;
pub mod error;
pub mod render;

pub mod prelude {
    pub use crate::chart::{Chart, Markers, Series, SeriesKind};
    pub use crate::df_utils::{df_to_records, encode_columns};
    pub use crate::error::ChartError;
    pub use crate::render::{
        fresh_output_div, render_chart_html, ChartSpec, SeriesSpec, DEFAULT_BASE_URL,
    };
}
