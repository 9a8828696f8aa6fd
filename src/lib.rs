//! TelePulse - Telegram channel analytics pipeline.
//!
//! Collects public channel posts and images, loads them into a relational
//! store, classifies images by content category, and serves aggregated
//! analytics over an HTTP API. The daily pipeline runs four stages in
//! dependency order: scrape -> load -> enrich -> transform.

pub mod cli;
pub mod config;
pub mod enrichment;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod schema;
pub mod server;
