//! HTTP request handlers organized by functionality

pub mod health;
pub mod search;
pub mod streaming;

// Re-export handler functions
pub use health::{HealthResponse, health};
pub use search::{SearchQuery, SimilarQuery, search, similar};
pub use streaming::{StreamInfo, relay_head, relay_stream, stream_info};
