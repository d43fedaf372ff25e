mod error;
mod handlers;
mod helpers;
mod router;
mod types;

pub use router::configure;
pub use types::AppState;
