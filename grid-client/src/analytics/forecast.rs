use time::Date;

use crate::{
    domain::{DailyAverage, ForecastPoint},
    error::{AnalyticsError, AnalyticsResult},
};

/// Daily growth applied on top of the baseline for each projected day.
pub const DAILY_GROWTH: f64 = 0.01;

/// Naive linear-growth projection from the most recent daily average.
///
/// The baseline is the last entry of `daily` (its latest date, since daily
/// averages are ordered ascending). Point `i` (1-based) is dated `i` days after
/// the baseline and valued `baseline * (1 + 0.01 * i)`.
pub fn forecast(daily: &[DailyAverage], horizon_days: u32) -> AnalyticsResult<Vec<ForecastPoint>> {
    let last = daily
        .last()
        .ok_or(AnalyticsError::EmptyView("no daily averages to forecast from"))?;

    if horizon_days < 1 {
        return Err(AnalyticsError::InvalidRange(
            "forecast horizon must be at least one day".to_string(),
        ));
    }

    let days_left = (Date::MAX - last.date).whole_days();
    if i64::from(horizon_days) > days_left {
        return Err(AnalyticsError::InvalidRange(format!(
            "forecast horizon of {horizon_days} days runs past {}",
            Date::MAX
        )));
    }

    let mut points = Vec::with_capacity(horizon_days as usize);
    let mut date = last.date;
    for i in 1..=horizon_days {
        date = date.next_day().ok_or_else(|| {
            AnalyticsError::InvalidRange(format!("forecast horizon runs past {date}"))
        })?;
        points.push(ForecastPoint {
            date,
            value: last.avg_kw * (1.0 + DAILY_GROWTH * f64::from(i)),
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::date, Duration};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn projects_from_last_entry() {
        let daily = [DailyAverage {
            date: date!(2023-01-03),
            avg_kw: 30.0,
        }];
        let points = forecast(&daily, 2).unwrap();

        assert_eq!(points.len(), 2);
        assert_eq!(points[0].date, date!(2023-01-04));
        assert!(approx(points[0].value, 30.3));
        assert_eq!(points[1].date, date!(2023-01-05));
        assert!(approx(points[1].value, 30.6));
    }

    #[test]
    fn seven_day_horizon_follows_formula() {
        let daily = [
            DailyAverage {
                date: date!(2023-02-26),
                avg_kw: 99.0,
            },
            DailyAverage {
                date: date!(2023-02-27),
                avg_kw: 12.5,
            },
        ];
        let points = forecast(&daily, 7).unwrap();

        assert_eq!(points.len(), 7);
        for (idx, p) in points.iter().enumerate() {
            let i = idx as i64 + 1;
            assert_eq!(p.date, date!(2023-02-27) + Duration::days(i));
            assert!(approx(p.value, 12.5 * (1.0 + 0.01 * i as f64)));
        }
        // Crosses the month boundary without gaps.
        assert_eq!(points[2].date, date!(2023-03-02));
    }

    #[test]
    fn empty_daily_averages_is_an_error() {
        assert!(matches!(forecast(&[], 3), Err(AnalyticsError::EmptyView(_))));
    }

    #[test]
    fn zero_horizon_is_an_error() {
        let daily = [DailyAverage {
            date: date!(2023-01-03),
            avg_kw: 30.0,
        }];
        assert!(matches!(forecast(&daily, 0), Err(AnalyticsError::InvalidRange(_))));
    }

    #[test]
    fn horizon_past_calendar_end_is_an_error() {
        let daily = [DailyAverage {
            date: Date::MAX,
            avg_kw: 1.0,
        }];
        assert!(matches!(forecast(&daily, 1), Err(AnalyticsError::InvalidRange(_))));
    }

    #[test]
    fn oversized_horizon_is_rejected_before_projecting() {
        let daily = [DailyAverage {
            date: date!(2023-01-03),
            avg_kw: 30.0,
        }];
        assert!(matches!(forecast(&daily, u32::MAX), Err(AnalyticsError::InvalidRange(_))));

        let near_end = [DailyAverage {
            date: Date::MAX - Duration::days(2),
            avg_kw: 1.0,
        }];
        assert_eq!(forecast(&near_end, 2).unwrap().len(), 2);
        assert!(matches!(forecast(&near_end, 3), Err(AnalyticsError::InvalidRange(_))));
    }
}
