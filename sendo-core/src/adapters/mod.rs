//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - reqwest HTTP client for the ApiGateway port
//! - JSON file (fs2-locked) and in-memory maps for the KeyValueStore port
//! - Scripted gateway and confirmer for offline runs and tests

pub mod file_store;
pub mod http;
pub mod memory_store;
pub mod scripted;

#[cfg(test)]
pub mod mock_server;
