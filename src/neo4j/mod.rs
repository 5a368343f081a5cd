//! Neo4j client and models for the knowledge graph

pub mod client;
pub mod error;
mod impl_graph_store;
pub mod models;
pub mod traits;

pub use client::Neo4jClient;
pub use error::{StoreError, StoreResult};
pub use models::*;
pub use traits::GraphStore;

#[cfg(test)]
pub(crate) mod mock;
