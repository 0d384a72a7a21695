//! Error types for taxon resolution.

use thiserror::Error;

/// Errors raised while resolving taxa against a [`ResourceStore`](crate::ResourceStore).
#[derive(Debug, Error)]
pub enum Error {
    /// A string that should be an API resource URI is not one.
    #[error("Bad URI: {0}")]
    BadUri(String),

    /// A record lacks a field the import depends on, or it has the wrong type.
    #[error("Record is missing field `{0}`")]
    MissingField(String),

    /// The tree definition has no item for the requested rank.
    #[error("No taxontreedefitems with name {rank} in tree {tree_def_id}")]
    MissingDefItem { rank: String, tree_def_id: i64 },

    /// A taxon the import must attach to does not exist.
    #[error("Taxon {name} not found at rank {rank}")]
    MissingTaxon { name: String, rank: String },

    /// The `isAccepted` column holds something other than Yes/No.
    #[error("Invalid isAccepted value: {0:?} (expected Yes or No)")]
    InvalidAcceptance(String),

    /// The backing store failed.
    #[error("Store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wrap an implementation error from a store.
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Store(Box::new(err))
    }
}

/// Result type alias for taxport-core operations.
pub type Result<T> = std::result::Result<T, Error>;
