use polars::error::PolarsError;
use thiserror::Error;

/// Everything that can go wrong between a frame and a rendered fragment.
#[derive(Debug, Error)]
pub enum ChartError {
    /// A column named in a field mapping does not exist in the source frame.
    #[error("column not found in source frame: {0}")]
    MissingColumn(String),

    /// A series or marker handle outlived the chart it belongs to.
    #[error("owning chart has been dropped")]
    ChartReleased,

    #[error(transparent)]
    Frame(#[from] PolarsError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
