use time::{
    format_description::{well_known::Rfc3339, FormatItem},
    macros::format_description,
    Date, OffsetDateTime, PrimitiveDateTime, Time,
};

const SPACE_SEPARATED: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const SPACE_SEPARATED_SUBSEC: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
const T_SEPARATED: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const T_SEPARATED_SUBSEC: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
const MINUTES_ONLY: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");
const T_MINUTES_ONLY: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]");
const DATE_ONLY: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Interpret ISO-8601-like timestamp text as a wall-clock date-time.
///
/// RFC 3339 values keep their local date and time; the offset is dropped so
/// that calendar-day grouping follows what is written in the file.
pub fn parse_timestamp(s: &str) -> Option<PrimitiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(odt) = OffsetDateTime::parse(s, &Rfc3339) {
        return Some(PrimitiveDateTime::new(odt.date(), odt.time()));
    }

    [
        SPACE_SEPARATED,
        SPACE_SEPARATED_SUBSEC,
        T_SEPARATED,
        T_SEPARATED_SUBSEC,
        MINUTES_ONLY,
        T_MINUTES_ONLY,
    ]
    .iter()
    .find_map(|fmt| PrimitiveDateTime::parse(s, fmt).ok())
    .or_else(|| parse_date(s).map(|d| PrimitiveDateTime::new(d, Time::MIDNIGHT)))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> Option<Date> {
    Date::parse(s.trim(), DATE_ONLY).ok()
}

/// Render a calendar date as `YYYY-MM-DD`.
pub fn format_date(d: Date) -> String {
    d.format(DATE_ONLY).unwrap_or_else(|_| d.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn parses_space_separated_timestamps() {
        assert_eq!(
            parse_timestamp("2023-01-01 13:45:00"),
            Some(datetime!(2023-01-01 13:45:00))
        );
        assert_eq!(
            parse_timestamp("2023-01-01 13:45"),
            Some(datetime!(2023-01-01 13:45:00))
        );
    }

    #[test]
    fn parses_iso_and_rfc3339_forms() {
        assert_eq!(
            parse_timestamp("2023-01-01T00:15:30"),
            Some(datetime!(2023-01-01 00:15:30))
        );
        assert_eq!(
            parse_timestamp("2023-01-01T00:00"),
            Some(datetime!(2023-01-01 00:00:00))
        );
        assert_eq!(
            parse_timestamp("2023-01-01T23:30:00.250"),
            Some(datetime!(2023-01-01 23:30:00.25))
        );
        // Local wall-clock time is kept, not shifted to UTC.
        assert_eq!(
            parse_timestamp("2023-01-01T23:30:00+02:00"),
            Some(datetime!(2023-01-01 23:30:00))
        );
    }

    #[test]
    fn bare_dates_are_midnight() {
        assert_eq!(parse_timestamp("2023-03-05"), Some(datetime!(2023-03-05 00:00:00)));
        assert_eq!(parse_date(" 2023-03-05 "), Some(date!(2023-03-05)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2023-13-01 00:00:00"), None);
        assert_eq!(parse_date("01/02/2023"), None);
    }

    #[test]
    fn formats_dates_iso() {
        assert_eq!(format_date(date!(2023-01-04)), "2023-01-04");
    }
}
