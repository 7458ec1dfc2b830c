//! Integration tests for Cadence
//!
//! Exercise the resolver, relay pipe and search service against real
//! loopback HTTP instead of in-memory doubles.

#[path = "support/mod.rs"]
mod support;

#[path = "integration/relay_pipeline.rs"]
mod relay_pipeline;
#[path = "integration/development_mode.rs"]
mod development_mode;
