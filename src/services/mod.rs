pub mod auth;
pub mod candidate_cache;
pub mod daily_suggestions;
pub mod menu;
pub mod preferences;
pub mod schedules;
pub mod suggestions;
pub mod timezone;
pub mod users;
