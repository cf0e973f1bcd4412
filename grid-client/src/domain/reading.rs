use time::{Date, PrimitiveDateTime};

/// One timestamped row of grid telemetry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Reading {
    pub timestamp: PrimitiveDateTime,
    pub power_consumption_kw: f64,
    pub solar_power_kw: f64,
    pub wind_power_kw: f64,
    pub grid_supply_kw: f64,
    pub electricity_price_usdkwh: f64,
}

impl Reading {
    pub fn date(&self) -> Date {
        self.timestamp.date()
    }
}

/// Immutable table of readings in file order.
///
/// Duplicate and out-of-order timestamps are kept exactly as loaded.
#[derive(Debug, Clone, Default)]
pub struct ReadingTable {
    rows: Vec<Reading>,
}

impl ReadingTable {
    pub fn new(rows: Vec<Reading>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Reading> {
        self.rows.iter()
    }

    pub fn rows(&self) -> &[Reading] {
        &self.rows
    }

    /// Earliest and latest calendar dates present in the table.
    pub fn date_bounds(&self) -> Option<(Date, Date)> {
        let mut dates = self.rows.iter().map(Reading::date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    fn reading(ts: PrimitiveDateTime) -> Reading {
        Reading {
            timestamp: ts,
            power_consumption_kw: 1.0,
            solar_power_kw: 0.0,
            wind_power_kw: 0.0,
            grid_supply_kw: 1.0,
            electricity_price_usdkwh: 0.1,
        }
    }

    #[test]
    fn date_bounds_ignore_row_order() {
        let table = ReadingTable::new(vec![
            reading(datetime!(2023-01-05 10:00:00)),
            reading(datetime!(2023-01-02 23:59:59)),
            reading(datetime!(2023-01-09 00:00:00)),
            reading(datetime!(2023-01-02 01:00:00)),
        ]);

        assert_eq!(table.date_bounds(), Some((date!(2023-01-02), date!(2023-01-09))));
        assert_eq!(table.len(), 4);
        // File order is preserved.
        assert_eq!(table.rows()[0].timestamp, datetime!(2023-01-05 10:00:00));
    }

    #[test]
    fn empty_table_has_no_bounds() {
        assert_eq!(ReadingTable::default().date_bounds(), None);
    }
}
