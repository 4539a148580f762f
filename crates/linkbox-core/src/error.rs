//! Error handling
//!
//! Two layers of typed errors:
//! - [`StoreError`]: what a Document Store reports for a single call
//! - [`LinkError`]: what the sync service and profile service hand back to
//!   their callers, with the failed operation attached

use std::fmt;

use thiserror::Error;

/// Errors reported by a Document Store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The backend's access policy rejected the call
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The referenced document does not exist
    #[error("No document '{id}' in collection '{collection}'")]
    NotFound { collection: String, id: String },

    /// A record could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend failed to persist its own state
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl StoreError {
    /// Whether the call failed before reaching the backend's data
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            StoreError::Unavailable(_) | StoreError::Persistence(_)
        )
    }
}

/// The service operation an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Add,
    Delete,
    FavoriteUpdate,
    ProfileLoad,
    ProfileSave,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Add => "add",
            Operation::Delete => "delete",
            Operation::FavoriteUpdate => "favorite update",
            Operation::ProfileLoad => "profile load",
            Operation::ProfileSave => "profile save",
        };
        f.write_str(name)
    }
}

/// Errors returned by service operations
#[derive(Error, Debug)]
pub enum LinkError {
    /// No identity is signed in
    #[error("Not signed in. Sign in before changing links.")]
    Unauthenticated,

    /// Input rejected before any store call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The store could not be reached
    #[error("{op} failed: {source}")]
    StoreUnavailable {
        op: Operation,
        #[source]
        source: StoreError,
    },

    /// The store rejected the write
    #[error("{op} failed: {source}")]
    WriteFailed {
        op: Operation,
        #[source]
        source: StoreError,
    },
}

impl LinkError {
    /// Wrap a store error for the given operation
    pub fn from_store(op: Operation, source: StoreError) -> Self {
        if source.is_unavailable() {
            LinkError::StoreUnavailable { op, source }
        } else {
            LinkError::WriteFailed { op, source }
        }
    }

    /// The operation that failed, if the error came from the store
    pub fn operation(&self) -> Option<Operation> {
        match self {
            LinkError::StoreUnavailable { op, .. } | LinkError::WriteFailed { op, .. } => {
                Some(*op)
            }
            _ => None,
        }
    }
}

/// Result type for service operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Result type for store calls
pub type StoreResult<T> = Result<T, StoreError>;
