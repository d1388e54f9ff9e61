//! # snomed-query
//!
//! Semantic query, reference-set, and search engines over a SNOMED CT
//! [`snomed_store::Store`]: IS-A graph traversal and subsumption, preferred-
//! term/FSN selection by language preference, reference-set membership and
//! cross-map resolution, filtered description search, and the composed
//! [`ExtendedConcept`] read model.
//!
//! ## Usage
//!
//! ```ignore
//! use snomed_query::{SemanticEngine, SubsumptionRelation};
//! use snomed_store::Store;
//!
//! let store = Store::open("/var/lib/snomed/release-2024")?;
//! let semantic = SemanticEngine::new(&store);
//! assert_eq!(
//!     semantic.subsumes(45170000, 83942000)?,
//!     SubsumptionRelation::Subsumes,
//! );
//! ```

#![warn(missing_docs)]

mod cancellation;
mod error;
mod extended;
pub mod lang;
mod refset_engine;
mod search;
mod semantic;

pub use cancellation::CancellationToken;
pub use error::{QueryError, QueryResult};
pub use extended::{ExtendedConcept, ExtendedConceptEngine};
pub use refset_engine::RefsetEngine;
pub use search::{SearchEngine, SearchRequest};
pub use semantic::{SemanticEngine, SubsumptionRelation};
