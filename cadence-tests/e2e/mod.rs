//! End-to-end tests for Cadence
//!
//! Run a real Cadence server on loopback, backed by a fake media host, and
//! talk to it over HTTP the way the browser front-end does.

#[path = "../support/mod.rs"]
mod support;

mod browse_workflow;
mod relay_workflow;
