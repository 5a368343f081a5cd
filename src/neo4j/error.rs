//! Error type for graph store operations

use thiserror::Error;

/// Failures surfaced by a [`GraphStore`](super::GraphStore) implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to connect to graph store: {0}")]
    Connection(String),

    #[error("graph store is not connected")]
    NotConnected,

    #[error("query failed: {0}")]
    Query(String),

    #[error("failed to decode {what}: {message}")]
    Decode { what: String, message: String },
}

impl StoreError {
    pub fn decode(what: impl Into<String>, message: impl ToString) -> Self {
        StoreError::Decode {
            what: what.into(),
            message: message.to_string(),
        }
    }
}

impl From<neo4rs::Error> for StoreError {
    fn from(e: neo4rs::Error) -> Self {
        StoreError::Query(e.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
