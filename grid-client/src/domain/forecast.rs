use time::Date;

/// Mean power consumption for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DailyAverage {
    pub date: Date,
    pub avg_kw: f64,
}

/// One projected day of consumption.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ForecastPoint {
    pub date: Date,
    pub value: f64,
}
