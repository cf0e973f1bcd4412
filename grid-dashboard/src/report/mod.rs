pub mod pdf;

pub use pdf::{forecast_table_text, render_forecast_report, write_forecast_report, ReportError, REPORT_TITLE};
