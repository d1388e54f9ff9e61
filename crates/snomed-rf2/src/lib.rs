//! # snomed-rf2
//!
//! Parallel importer and parser for SNOMED CT RF2 distribution files.
//!
//! This crate discovers RF2 snapshot files in a release directory,
//! classifies them by filename, validates their headers, and drives a
//! worker-pool pipeline (file walkers -> row parsers -> typed channels)
//! that a persistence layer (see `snomed-store`) drains to commit batches.
//!
//! ## Features
//!
//! - `parallel` - Enables parallel batch parsing via rayon (default)
//!
//! ## Usage
//!
//! ### Basic Parsing
//!
//! ```ignore
//! use snomed_rf2::{Rf2Parser, Rf2Config};
//! use snomed_types::Rf2Concept;
//!
//! let config = Rf2Config::default();
//! let parser = Rf2Parser::<_, Rf2Concept>::from_path("concepts.txt", config)?;
//!
//! for result in parser {
//!     match result {
//!         Ok(concept) => println!("Concept: {} (active: {})", concept.id, concept.active),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! ### Running the import pipeline
//!
//! ```ignore
//! use snomed_rf2::{discover_rf2_files, pipeline::{ImportPipeline, CancellationToken}};
//!
//! let files = discover_rf2_files("/path/to/snomed/release")?;
//! let token = CancellationToken::new();
//! let pipeline = ImportPipeline::new(Default::default());
//! let outcome = pipeline.run(&files, &token, |batch| {
//!     // hand the batch to a snomed-store writer
//!     Ok(())
//! })?;
//! ```

#![warn(missing_docs)]

mod concept;
mod description;
mod loader;
pub mod parser;
pub mod pipeline;
mod relationship;
mod types;

// Re-export main types and functions
pub use loader::{discover_rf2_files, format_bytes, rf2_file_kinds, Rf2FileKind};
pub use parser::{parse, Rf2Parser, Rf2Record};
pub use types::{
    DescriptionConfig, ParseStats, RelationshipConfig, Rf2Config, Rf2Error, Rf2Files, Rf2Result,
};

// Re-export filter traits
pub use description::DescriptionFilter;
pub use relationship::RelationshipFilter;

// Re-export snomed-types for convenience
pub use snomed_types;
