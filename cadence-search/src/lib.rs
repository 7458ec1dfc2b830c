//! Cadence Search - music catalog search and related tracks
//!
//! Provides song search and related-track discovery over a pluggable
//! provider: yt-dlp in production, deterministic demo data in development.

pub mod errors;
pub mod providers;
pub mod service;
pub mod types;

// Re-export main types
pub use errors::SearchError;
pub use providers::CatalogSearchProvider;
pub use service::CatalogSearchService;
pub use types::{SearchFilter, TrackSummary};

/// Convenience type alias for Results with SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;
