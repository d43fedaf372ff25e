//! Student records service: students, groups, subjects and a gradebook
//! report served over HTTP from a SQLite workspace.

pub mod auth;
pub mod config;
pub mod db;
pub mod forms;
pub mod gradebook;
pub mod http;
