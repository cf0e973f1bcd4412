use std::collections::BTreeSet;

use time::Date;

use crate::{
    domain::{EnergySource, Reading, ReadingTable},
    error::{AnalyticsError, AnalyticsResult},
};

/// Date interval (inclusive on both ends) and the sources a row must be
/// producing from to be kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterCriteria {
    start: Date,
    end: Date,
    sources: BTreeSet<EnergySource>,
}

impl FilterCriteria {
    /// Fails if `start > end`; the bounds are never swapped.
    pub fn new(
        start: Date,
        end: Date,
        sources: impl IntoIterator<Item = EnergySource>,
    ) -> AnalyticsResult<Self> {
        if start > end {
            return Err(AnalyticsError::InvalidRange(format!(
                "start date {start} is after end date {end}"
            )));
        }

        Ok(Self {
            start,
            end,
            sources: sources.into_iter().collect(),
        })
    }

    pub fn start(&self) -> Date {
        self.start
    }

    pub fn end(&self) -> Date {
        self.end
    }

    pub fn sources(&self) -> &BTreeSet<EnergySource> {
        &self.sources
    }

    /// Row date inside the interval and at least one enabled source with
    /// strictly positive output.
    pub fn matches(&self, r: &Reading) -> bool {
        let date = r.date();
        date >= self.start
            && date <= self.end
            && self.sources.iter().any(|src| src.output(r) > 0.0)
    }
}

/// Rows of a [`ReadingTable`] that passed a filter, in table order.
#[derive(Debug, Clone, Default)]
pub struct FilteredView<'a> {
    rows: Vec<&'a Reading>,
}

impl<'a> FilteredView<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Reading> + '_ {
        self.rows.iter().copied()
    }
}

impl<'a> FromIterator<&'a Reading> for FilteredView<'a> {
    fn from_iter<I: IntoIterator<Item = &'a Reading>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

pub fn filter<'a>(table: &'a ReadingTable, criteria: &FilterCriteria) -> FilteredView<'a> {
    table.iter().filter(|r| criteria.matches(r)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::date, Duration, PrimitiveDateTime, Time};

    fn row(date: Date, hour: u8, solar: f64, wind: f64, grid: f64) -> Reading {
        Reading {
            timestamp: PrimitiveDateTime::new(date, Time::from_hms(hour, 0, 0).unwrap()),
            power_consumption_kw: 5.0,
            solar_power_kw: solar,
            wind_power_kw: wind,
            grid_supply_kw: grid,
            electricity_price_usdkwh: 0.2,
        }
    }

    /// Two weeks of rows cycling through every on/off combination of sources.
    fn fixture() -> ReadingTable {
        let mut rows = Vec::new();
        let base = date!(2023-01-01);
        for day in 0..14_i64 {
            let d = base + Duration::days(day);
            for combo in 0..8_u8 {
                let on = |bit: u8| if combo & bit != 0 { 1.5 } else { 0.0 };
                rows.push(row(d, combo, on(1), on(2), on(4)));
            }
        }
        ReadingTable::new(rows)
    }

    #[test]
    fn rows_fall_inside_inclusive_date_range() {
        let table = fixture();
        let ranges = [
            (date!(2023-01-01), date!(2023-01-14)),
            (date!(2023-01-03), date!(2023-01-03)),
            (date!(2023-01-05), date!(2023-01-09)),
            (date!(2022-12-01), date!(2023-01-02)),
        ];

        for (start, end) in ranges {
            let criteria = FilterCriteria::new(start, end, EnergySource::ALL).unwrap();
            let view = filter(&table, &criteria);
            assert!(!view.is_empty());
            assert!(view.iter().all(|r| start <= r.date() && r.date() <= end));
        }

        // Single day, all sources: seven of eight combos have some output.
        let one_day =
            FilterCriteria::new(date!(2023-01-03), date!(2023-01-03), EnergySource::ALL).unwrap();
        assert_eq!(filter(&table, &one_day).len(), 7);
    }

    #[test]
    fn grid_only_keeps_rows_with_positive_grid_supply() {
        let table = fixture();
        let criteria =
            FilterCriteria::new(date!(2023-01-01), date!(2023-01-14), [EnergySource::Grid]).unwrap();
        let view = filter(&table, &criteria);

        assert_eq!(view.len(), 14 * 4);
        assert!(view.iter().all(|r| r.grid_supply_kw > 0.0));
    }

    #[test]
    fn multiple_sources_are_or_combined() {
        let table = fixture();
        let criteria = FilterCriteria::new(
            date!(2023-01-01),
            date!(2023-01-01),
            [EnergySource::Solar, EnergySource::Wind],
        )
        .unwrap();
        let view = filter(&table, &criteria);

        assert_eq!(view.len(), 6);
        assert!(view
            .iter()
            .all(|r| r.solar_power_kw > 0.0 || r.wind_power_kw > 0.0));
    }

    #[test]
    fn empty_source_set_yields_empty_view() {
        let table = fixture();
        let criteria =
            FilterCriteria::new(date!(2023-01-01), date!(2023-01-14), [] as [EnergySource; 0]).unwrap();
        assert!(filter(&table, &criteria).is_empty());
    }

    #[test]
    fn inverted_range_is_rejected_not_swapped() {
        let res = FilterCriteria::new(date!(2023-01-05), date!(2023-01-01), [EnergySource::Grid]);
        assert!(matches!(res, Err(AnalyticsError::InvalidRange(_))));
    }

    #[test]
    fn view_preserves_table_order_and_duplicates() {
        let d = date!(2023-02-01);
        let table = ReadingTable::new(vec![
            row(d, 9, 0.0, 0.0, 1.0),
            row(d, 3, 0.0, 0.0, 1.0),
            row(d, 9, 0.0, 0.0, 1.0),
        ]);
        let criteria = FilterCriteria::new(d, d, [EnergySource::Grid]).unwrap();
        let view = filter(&table, &criteria);

        let hours: Vec<u8> = view.iter().map(|r| r.timestamp.hour()).collect();
        assert_eq!(hours, vec![9, 3, 9]);
    }
}
