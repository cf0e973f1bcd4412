use std::collections::BTreeMap;

use time::Date;

use crate::{
    analytics::FilteredView,
    domain::{DailyAverage, Reading},
    error::{AnalyticsError, AnalyticsResult},
};

/// Headline metrics for a filtered view.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Summary {
    pub mean_load: f64,
    pub mean_price: f64,
    pub rows: usize,
}

/// Mean load and mean price over the view.
///
/// An empty view is an error rather than a NaN mean.
pub fn summarize(view: &FilteredView<'_>) -> AnalyticsResult<Summary> {
    if view.is_empty() {
        return Err(AnalyticsError::EmptyView("cannot summarize a view with no readings"));
    }

    let (load, price) = view.iter().fold((0.0, 0.0), |(load, price), r| {
        (load + r.power_consumption_kw, price + r.electricity_price_usdkwh)
    });
    let n = view.len() as f64;

    Ok(Summary {
        mean_load: load / n,
        mean_price: price / n,
        rows: view.len(),
    })
}

/// Per-calendar-day mean of `power_consumption_kw`, ascending by date.
pub fn daily_average(view: &FilteredView<'_>) -> Vec<DailyAverage> {
    let mut days: BTreeMap<Date, (f64, usize)> = BTreeMap::new();
    for r in view.iter() {
        let entry = days.entry(r.date()).or_insert((0.0, 0));
        entry.0 += r.power_consumption_kw;
        entry.1 += 1;
    }

    days.into_iter()
        .map(|(date, (sum, count))| DailyAverage {
            date,
            avg_kw: sum / count as f64,
        })
        .collect()
}

/// Numeric telemetry columns, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Column {
    PowerConsumptionKw,
    SolarPowerKw,
    WindPowerKw,
    GridSupplyKw,
    ElectricityPriceUsdkwh,
}

impl Column {
    pub const ALL: [Column; 5] = [
        Self::PowerConsumptionKw,
        Self::SolarPowerKw,
        Self::WindPowerKw,
        Self::GridSupplyKw,
        Self::ElectricityPriceUsdkwh,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::PowerConsumptionKw => "power_consumption_kw",
            Self::SolarPowerKw => "solar_power_kw",
            Self::WindPowerKw => "wind_power_kw",
            Self::GridSupplyKw => "grid_supply_kw",
            Self::ElectricityPriceUsdkwh => "electricity_price_usdkwh",
        }
    }

    pub fn value(&self, r: &Reading) -> f64 {
        match self {
            Self::PowerConsumptionKw => r.power_consumption_kw,
            Self::SolarPowerKw => r.solar_power_kw,
            Self::WindPowerKw => r.wind_power_kw,
            Self::GridSupplyKw => r.grid_supply_kw,
            Self::ElectricityPriceUsdkwh => r.electricity_price_usdkwh,
        }
    }
}

/// Descriptive statistics for one column.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ColumnStats {
    pub column: Column,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two rows.
    pub std: Option<f64>,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Describe {
    pub columns: Vec<ColumnStats>,
}

/// Linear-interpolated quantile over sorted values.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

fn column_stats(view: &FilteredView<'_>, column: Column) -> ColumnStats {
    let mut values: Vec<f64> = view.iter().map(|r| column.value(r)).collect();
    values.sort_by(f64::total_cmp);

    let n = values.len();
    let mean = values.iter().sum::<f64>() / n as f64;
    let std = (n > 1).then(|| {
        let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
        (ss / (n - 1) as f64).sqrt()
    });

    ColumnStats {
        column,
        count: n,
        mean,
        std,
        min: values[0],
        p25: quantile(&values, 0.25),
        p50: quantile(&values, 0.50),
        p75: quantile(&values, 0.75),
        max: values[n - 1],
    }
}

pub fn describe(view: &FilteredView<'_>) -> AnalyticsResult<Describe> {
    if view.is_empty() {
        return Err(AnalyticsError::EmptyView("cannot describe a view with no readings"));
    }

    Ok(Describe {
        columns: Column::ALL.iter().map(|c| column_stats(view, *c)).collect(),
    })
}

impl Describe {
    /// Fixed-width text table, one row per statistic and one column per
    /// telemetry field, values rounded to two decimals.
    pub fn to_text(&self) -> String {
        let labels = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];
        let cell = |v: Option<f64>| v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "NaN".to_string());

        let grid: Vec<Vec<String>> = self
            .columns
            .iter()
            .map(|s| {
                vec![
                    format!("{:.2}", s.count as f64),
                    cell(Some(s.mean)),
                    cell(s.std),
                    cell(Some(s.min)),
                    cell(Some(s.p25)),
                    cell(Some(s.p50)),
                    cell(Some(s.p75)),
                    cell(Some(s.max)),
                ]
            })
            .collect();

        let widths: Vec<usize> = self
            .columns
            .iter()
            .zip(&grid)
            .map(|(s, cells)| {
                cells
                    .iter()
                    .map(String::len)
                    .chain(std::iter::once(s.column.name().len()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        out.push_str(&" ".repeat(5));
        for (s, w) in self.columns.iter().zip(&widths) {
            out.push_str(&format!("  {:>w$}", s.column.name(), w = w));
        }

        for (i, label) in labels.iter().enumerate() {
            out.push('\n');
            out.push_str(&format!("{label:<5}"));
            for (cells, w) in grid.iter().zip(&widths) {
                out.push_str(&format!("  {:>w$}", cells[i], w = w));
            }
        }

        out
    }
}

/// Pairwise Pearson correlation between the telemetry columns.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CorrelationMatrix {
    pub columns: Vec<Column>,
    /// Row-major; `None` where a column has no variance.
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: Column, b: Column) -> Option<f64> {
        let i = self.columns.iter().position(|c| *c == a)?;
        let j = self.columns.iter().position(|c| *c == b)?;
        self.values[i][j]
    }
}

fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    let n = xs.len();
    if n < 2 {
        return None;
    }

    let mx = xs.iter().sum::<f64>() / n as f64;
    let my = ys.iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mx, y - my);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

pub fn correlation(view: &FilteredView<'_>) -> CorrelationMatrix {
    let series: Vec<Vec<f64>> = Column::ALL
        .iter()
        .map(|c| view.iter().map(|r| c.value(r)).collect())
        .collect();

    let values = series
        .iter()
        .map(|xs| series.iter().map(|ys| pearson(xs, ys)).collect())
        .collect();

    CorrelationMatrix {
        columns: Column::ALL.to_vec(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        analytics::{filter, FilterCriteria},
        domain::{EnergySource, ReadingTable},
    };
    use time::{macros::datetime, PrimitiveDateTime};

    fn reading(ts: PrimitiveDateTime, load: f64, solar: f64, price: f64) -> Reading {
        Reading {
            timestamp: ts,
            power_consumption_kw: load,
            solar_power_kw: solar,
            wind_power_kw: 0.0,
            grid_supply_kw: 1.0,
            electricity_price_usdkwh: price,
        }
    }

    fn three_day_table() -> ReadingTable {
        ReadingTable::new(vec![
            reading(datetime!(2023-01-01 00:00:00), 10.0, 0.0, 0.10),
            reading(datetime!(2023-01-02 00:00:00), 20.0, 0.0, 0.20),
            reading(datetime!(2023-01-03 00:00:00), 30.0, 0.0, 0.30),
        ])
    }

    fn full_view(table: &ReadingTable) -> FilteredView<'_> {
        let (start, end) = table.date_bounds().unwrap();
        filter(table, &FilterCriteria::new(start, end, [EnergySource::Grid]).unwrap())
    }

    #[test]
    fn summarize_means_load_and_price() {
        let table = three_day_table();
        let s = summarize(&full_view(&table)).unwrap();

        assert_eq!(s.mean_load, 20.0);
        assert!((s.mean_price - 0.2).abs() < 1e-12);
        assert_eq!(s.rows, 3);
    }

    #[test]
    fn summarize_empty_view_is_an_error() {
        let view = FilteredView::default();
        assert!(matches!(summarize(&view), Err(AnalyticsError::EmptyView(_))));
    }

    #[test]
    fn daily_average_groups_by_calendar_date_ascending() {
        let table = ReadingTable::new(vec![
            reading(datetime!(2023-01-02 23:00:00), 40.0, 0.0, 0.1),
            reading(datetime!(2023-01-01 08:00:00), 10.0, 0.0, 0.1),
            reading(datetime!(2023-01-02 01:00:00), 20.0, 0.0, 0.1),
            reading(datetime!(2023-01-01 20:00:00), 30.0, 0.0, 0.1),
            reading(datetime!(2023-01-04 12:00:00), 7.0, 0.0, 0.1),
        ]);
        let daily = daily_average(&full_view(&table));

        let dates: Vec<_> = daily.iter().map(|d| d.date).collect();
        assert!(dates.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(dates.len(), 3);
        assert_eq!(daily[0].avg_kw, 20.0);
        assert_eq!(daily[1].avg_kw, 30.0);
        assert_eq!(daily[2].avg_kw, 7.0);
    }

    #[test]
    fn daily_average_of_empty_view_is_empty() {
        assert!(daily_average(&FilteredView::default()).is_empty());
    }

    #[test]
    fn describe_reports_pandas_style_statistics() {
        let table = three_day_table();
        let d = describe(&full_view(&table)).unwrap();
        let load = d.columns[0];

        assert_eq!(load.column, Column::PowerConsumptionKw);
        assert_eq!(load.count, 3);
        assert_eq!(load.mean, 20.0);
        assert_eq!(load.std, Some(10.0));
        assert_eq!(load.min, 10.0);
        assert_eq!(load.p25, 15.0);
        assert_eq!(load.p50, 20.0);
        assert_eq!(load.p75, 25.0);
        assert_eq!(load.max, 30.0);

        let text = d.to_text();
        assert!(text.contains("power_consumption_kw"));
        assert!(text.lines().nth(1).unwrap().starts_with("count"));
        assert!(text.contains("20.00"));
        assert_eq!(text.lines().count(), 9);
    }

    #[test]
    fn describe_single_row_has_no_std() {
        let table = ReadingTable::new(vec![reading(datetime!(2023-01-01 00:00:00), 5.0, 0.0, 0.1)]);
        let d = describe(&full_view(&table)).unwrap();

        assert_eq!(d.columns[0].std, None);
        assert_eq!(d.columns[0].p75, 5.0);
        assert!(d.to_text().contains("NaN"));
    }

    #[test]
    fn describe_empty_view_is_an_error() {
        assert!(matches!(
            describe(&FilteredView::default()),
            Err(AnalyticsError::EmptyView(_))
        ));
    }

    #[test]
    fn correlation_is_one_on_diagonal_and_none_without_variance() {
        let table = ReadingTable::new(vec![
            reading(datetime!(2023-01-01 00:00:00), 10.0, 3.0, 0.10),
            reading(datetime!(2023-01-01 01:00:00), 20.0, 2.0, 0.20),
            reading(datetime!(2023-01-01 02:00:00), 30.0, 1.0, 0.30),
        ]);
        let m = correlation(&full_view(&table));

        let load = Column::PowerConsumptionKw;
        assert!((m.get(load, load).unwrap() - 1.0).abs() < 1e-12);
        assert!((m.get(load, Column::ElectricityPriceUsdkwh).unwrap() - 1.0).abs() < 1e-9);
        assert!((m.get(load, Column::SolarPowerKw).unwrap() + 1.0).abs() < 1e-12);
        // Wind and grid are constant.
        assert_eq!(m.get(load, Column::WindPowerKw), None);
        assert_eq!(m.get(Column::GridSupplyKw, Column::GridSupplyKw), None);
    }
}
