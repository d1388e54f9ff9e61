//! Error types for the semantic, reference-set, and search engines.

use snomed_types::SctId;
use thiserror::Error;

/// Errors that can occur while answering a semantic, reference-set, or
/// search query.
#[derive(Error, Debug)]
pub enum QueryError {
    /// Underlying storage operation failed.
    #[error("storage error: {0}")]
    Store(#[from] snomed_store::StoreError),

    /// No record exists for the requested id.
    #[error("not found: {0}")]
    NotFound(SctId),

    /// A concept has no active Fully Specified Name, violating the data
    /// invariant that every concept carries one.
    #[error("concept {0} has no active FSN")]
    MissingFsn(SctId),

    /// `rootId` passed to `genericiseToRoot` is not an ancestor of the concept.
    #[error("{root} is not an ancestor of {concept}")]
    NotAnAncestor {
        /// The concept queried.
        concept: SctId,
        /// The root that was expected to be an ancestor.
        root: SctId,
    },

    /// No member of the target set was reachable from the concept.
    #[error("no member of the target set is an ancestor of {0}")]
    NoGenericisationTarget(SctId),

    /// None of the caller's language preferences matched an available
    /// language reference set.
    #[error("no available language reference set matches the requested preferences")]
    NoLanguageRefsetMatch,

    /// The operation was cancelled before it could complete.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias for results returned by this crate.
pub type QueryResult<T> = Result<T, QueryError>;
