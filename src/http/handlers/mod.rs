pub mod auth;
pub mod catalog;
pub mod core;
pub mod gradebook;
pub mod media;
pub mod students;
