pub mod achievements;
pub mod auth;
pub mod backup_exchange;
pub mod core;
pub mod participations;
pub mod students;
