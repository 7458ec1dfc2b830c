//! Cadence Web - HTTP API and audio relay server
//!
//! Serves catalog search as JSON, relays audio through this process, and
//! hosts the static front-end.

pub mod errors;
pub mod handlers;
pub mod server;

#[cfg(test)]
mod test_support;

// Re-export main types
pub use errors::ApiError;
pub use server::{AppState, router, run_server};
