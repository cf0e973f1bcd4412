/// Errors raised while loading telemetry or computing analytics over it.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("load error: {0}")]
    Load(String),
    #[error("parse error: invalid timestamp '{value}' on line {line}")]
    Parse { line: u64, value: String },
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("empty view: {0}")]
    EmptyView(&'static str),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
