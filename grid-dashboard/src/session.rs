use std::{collections::BTreeSet, ops::RangeInclusive, sync::Arc};

use grid_client::{
    analytics::{self, CorrelationMatrix, Describe, FilterCriteria, FilteredView, Summary},
    domain::{DailyAverage, EnergySource, ForecastPoint, ReadingTable},
    AnalyticsError, AnalyticsResult,
};
use time::Date;

pub const HOUSEHOLD_USAGE_KWH: RangeInclusive<u32> = 0..=500;
pub const DEFAULT_HOUSEHOLD_USAGE_KWH: u32 = 50;
pub const HORIZON_DAYS: RangeInclusive<u32> = 1..=30;
pub const DEFAULT_HORIZON_DAYS: u32 = 7;

/// User-adjustable parameters. `None` means "use the default".
#[derive(Debug, Clone, Default)]
pub struct SessionParams {
    pub start: Option<Date>,
    pub end: Option<Date>,
    pub sources: Option<BTreeSet<EnergySource>>,
    pub household_usage_kwh: Option<u32>,
    pub horizon_days: Option<u32>,
}

/// One user's view onto the shared, read-only table.
///
/// Built per interaction and never shared: every computation is a pure
/// function of the table and these parameters.
#[derive(Debug, Clone)]
pub struct DashboardSession {
    table: Arc<ReadingTable>,
    criteria: FilterCriteria,
    household_usage_kwh: u32,
    horizon_days: u32,
}

impl DashboardSession {
    /// Defaults: the table's full date span, `Grid` only, 50 kWh household
    /// usage and a 7-day horizon.
    pub fn new(table: Arc<ReadingTable>, params: SessionParams) -> AnalyticsResult<Self> {
        let bounds = table.date_bounds();
        let start = params
            .start
            .or(bounds.map(|(lo, _)| lo))
            .ok_or(AnalyticsError::EmptyView("dataset has no readings"))?;
        let end = params
            .end
            .or(bounds.map(|(_, hi)| hi))
            .ok_or(AnalyticsError::EmptyView("dataset has no readings"))?;
        let sources = params
            .sources
            .unwrap_or_else(|| BTreeSet::from([EnergySource::Grid]));

        let household_usage_kwh = params.household_usage_kwh.unwrap_or(DEFAULT_HOUSEHOLD_USAGE_KWH);
        if !HOUSEHOLD_USAGE_KWH.contains(&household_usage_kwh) {
            return Err(AnalyticsError::InvalidRange(format!(
                "household usage must be within {}..={} kWh",
                HOUSEHOLD_USAGE_KWH.start(),
                HOUSEHOLD_USAGE_KWH.end()
            )));
        }

        let horizon_days = params.horizon_days.unwrap_or(DEFAULT_HORIZON_DAYS);
        if !HORIZON_DAYS.contains(&horizon_days) {
            return Err(AnalyticsError::InvalidRange(format!(
                "forecast horizon must be within {}..={} days",
                HORIZON_DAYS.start(),
                HORIZON_DAYS.end()
            )));
        }

        Ok(Self {
            criteria: FilterCriteria::new(start, end, sources)?,
            table,
            household_usage_kwh,
            horizon_days,
        })
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn household_usage_kwh(&self) -> u32 {
        self.household_usage_kwh
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    pub fn view(&self) -> FilteredView<'_> {
        analytics::filter(&self.table, &self.criteria)
    }

    pub fn summary(&self) -> AnalyticsResult<Summary> {
        analytics::summarize(&self.view())
    }

    pub fn daily_average(&self) -> Vec<DailyAverage> {
        analytics::daily_average(&self.view())
    }

    pub fn forecast(&self) -> AnalyticsResult<Vec<ForecastPoint>> {
        analytics::forecast(&self.daily_average(), self.horizon_days)
    }

    pub fn describe(&self) -> AnalyticsResult<Describe> {
        analytics::describe(&self.view())
    }

    pub fn correlation(&self) -> CorrelationMatrix {
        analytics::correlation(&self.view())
    }

    pub fn recommendation_prompt(&self) -> AnalyticsResult<String> {
        let summary = self.describe()?.to_text();
        Ok(format!(
            "You are an expert energy assistant. Analyze this summary of energy consumption data:\n\n\
             {summary}\n\n\
             Provide 3 personalized energy-saving recommendations for a user who consumes {} kWh.",
            self.household_usage_kwh
        ))
    }

    pub fn chat_prompt(&self, question: &str) -> AnalyticsResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AnalyticsError::InvalidRange("question must not be empty".to_string()));
        }

        let summary = self.describe()?.to_text();
        Ok(format!(
            "You are a helpful assistant that analyzes energy consumption data.\n\n\
             Data Summary:\n{summary}\n\n\
             User Question: {question}"
        ))
    }
}
