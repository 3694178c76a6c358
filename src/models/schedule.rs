use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::services::timezone::parse_timezone;

pub const DEFAULT_TIMES: [&str; 3] = ["08:00", "12:00", "18:00"];

/// Per-user notification schedule: the local times at which meal reminders fire.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub user_id: Uuid,
    pub times: Vec<String>,
    pub timezone: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body for PATCH /schedules/me and /schedules/{user_id}.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateScheduleRequest {
    pub times: Option<Vec<String>>,
    pub timezone: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("Each time must be in HH:mm format (24-hour), got {0:?}")]
pub struct InvalidTimeError(pub String);

/// Accepts `H:mm` or `HH:mm` (24-hour) and returns the zero-padded `HH:mm` form.
pub fn normalize_time(raw: &str) -> Result<String, InvalidTimeError> {
    let err = || InvalidTimeError(raw.to_string());
    let (h, m) = raw.split_once(':').ok_or_else(err)?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return Err(err());
    }
    if !h.bytes().chain(m.bytes()).all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let hour: u32 = h.parse().map_err(|_| err())?;
    let minute: u32 = m.parse().map_err(|_| err())?;
    if hour > 23 || minute > 59 {
        return Err(err());
    }
    Ok(format!("{hour:02}:{minute:02}"))
}

impl UpdateScheduleRequest {
    /// Validates and normalises the request in place.
    pub fn normalize(mut self) -> Result<Self, String> {
        if let Some(times) = self.times.take() {
            let normalized = times
                .iter()
                .map(|t| normalize_time(t))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| e.to_string())?;
            self.times = Some(normalized);
        }
        if let Some(tz) = &self.timezone {
            parse_timezone(tz).map_err(|e| e.to_string())?;
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time("08:00").unwrap(), "08:00");
        assert_eq!(normalize_time("8:05").unwrap(), "08:05");
        assert_eq!(normalize_time("23:59").unwrap(), "23:59");
        assert!(normalize_time("24:00").is_err());
        assert!(normalize_time("12:60").is_err());
        assert!(normalize_time("12:5").is_err());
        assert!(normalize_time("noon").is_err());
        assert!(normalize_time("+1:00").is_err());
    }

    #[test]
    fn test_update_request_rejects_bad_timezone() {
        let req = UpdateScheduleRequest {
            times: None,
            timezone: Some("Nowhere/City".into()),
        };
        assert!(req.normalize().is_err());
    }

    #[test]
    fn test_update_request_pads_times() {
        let req = UpdateScheduleRequest {
            times: Some(vec!["7:30".into(), "19:00".into()]),
            timezone: Some("Europe/Paris".into()),
        }
        .normalize()
        .unwrap();
        assert_eq!(req.times.unwrap(), vec!["07:30", "19:00"]);
    }
}
