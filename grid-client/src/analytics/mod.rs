//! Pure filter, aggregate and forecast functions over a loaded
//! [`ReadingTable`](crate::domain::ReadingTable).

pub mod aggregate;
pub mod filter;
pub mod forecast;

pub use aggregate::{
    correlation, daily_average, describe, summarize, Column, ColumnStats, CorrelationMatrix,
    Describe, Summary,
};
pub use filter::{filter, FilterCriteria, FilteredView};
pub use forecast::{forecast, DAILY_GROWTH};
