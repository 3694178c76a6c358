pub mod auth;
pub mod menu;
pub mod pagination;
pub mod preference;
pub mod schedule;
pub mod suggestion;
pub mod user;
