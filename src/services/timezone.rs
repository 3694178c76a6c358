use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Unknown timezone: {0}")]
pub struct TimezoneError(pub String);

pub fn parse_timezone(name: &str) -> Result<Tz, TimezoneError> {
    name.parse::<Tz>()
        .map_err(|_| TimezoneError(name.to_string()))
}

/// Calendar date of `now` as observed in the IANA zone `tz_name`.
pub fn today_in(tz_name: &str, now: DateTime<Utc>) -> Result<NaiveDate, TimezoneError> {
    let tz = parse_timezone(tz_name)?;
    Ok(now.with_timezone(&tz).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_bangkok_rolls_over_before_utc() {
        // 17:30 UTC is 00:30 the next day in Bangkok (UTC+7)
        let now = utc(2025, 6, 1, 17, 30);
        assert_eq!(today_in("Asia/Bangkok", now).unwrap().to_string(), "2025-06-02");
        assert_eq!(today_in("UTC", now).unwrap().to_string(), "2025-06-01");
    }

    #[test]
    fn test_last_minute_of_day() {
        // 16:59 UTC is still 23:59 in Bangkok
        let now = utc(2025, 6, 1, 16, 59);
        assert_eq!(today_in("Asia/Bangkok", now).unwrap().to_string(), "2025-06-01");
    }

    #[test]
    fn test_new_york_across_dst_start() {
        // 2025-03-09 02:00 EST jumps to 03:00 EDT. 04:30 UTC is 23:30 EST on the 8th.
        assert_eq!(
            today_in("America/New_York", utc(2025, 3, 9, 4, 30)).unwrap().to_string(),
            "2025-03-08"
        );
        // 07:30 UTC is 03:30 EDT on the 9th.
        assert_eq!(
            today_in("America/New_York", utc(2025, 3, 9, 7, 30)).unwrap().to_string(),
            "2025-03-09"
        );
    }

    #[test]
    fn test_new_york_across_dst_end() {
        // After the fall-back (UTC-4 -> UTC-5) 04:30 UTC on Nov 3rd is 23:30 on Nov 2nd.
        assert_eq!(
            today_in("America/New_York", utc(2025, 11, 3, 4, 30)).unwrap().to_string(),
            "2025-11-02"
        );
        assert_eq!(
            today_in("America/New_York", utc(2025, 11, 3, 5, 0)).unwrap().to_string(),
            "2025-11-03"
        );
    }

    #[test]
    fn test_date_format_is_zero_padded() {
        let date = today_in("Europe/Paris", utc(2025, 1, 5, 12, 0)).unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2025-01-05");
        assert_eq!(serde_json::to_string(&date).unwrap(), "\"2025-01-05\"");
    }

    #[test]
    fn test_unknown_timezone() {
        assert_eq!(
            today_in("Atlantis/Capital", Utc::now()),
            Err(TimezoneError("Atlantis/Capital".into()))
        );
    }
}
