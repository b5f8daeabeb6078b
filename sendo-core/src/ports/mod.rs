//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod gateway;
mod prompt;
mod storage;

pub use gateway::{ApiGateway, ApiRequest, FormPart, Method, RequestBody};
pub use prompt::{ConfirmationPrompt, Confirmer};
pub use storage::KeyValueStore;
