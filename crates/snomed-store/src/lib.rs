//! # snomed-store
//!
//! Embedded persistence and precomputation engine for SNOMED CT terminology.
//!
//! Concepts, descriptions, relationships, and reference set items are
//! committed by the import pipeline (see `snomed-rf2::pipeline`) into a
//! RocksDB-backed [`Store`], one column family per logical bucket. A
//! precomputation pass then derives the indexes the semantic query engine
//! relies on: transitive closure over the IS-A hierarchy and tokenized
//! search terms. Writers are serialized through [`Store::update`]; readers
//! go through [`Store::view`] and never block on a writer.
//!
//! ## Usage
//!
//! ```ignore
//! use snomed_store::Store;
//!
//! let store = Store::open("/var/lib/snomed/release-2024")?;
//! {
//!     let update = store.update();
//!     update.put_concepts(&concepts)?;
//!     update.put_relationships(&relationships)?;
//!     update.rebuild_transitive_closure(&snomed_store::precompute::NeverCancel)?;
//! }
//! let parents = store.view().parents_of(73211009)?;
//! ```

#![warn(missing_docs)]

mod descriptor;
mod error;
mod keys;
pub mod precompute;
mod store;

pub use descriptor::STORE_VERSION;
pub use error::{StoreError, StoreResult};
pub use store::{Store, Update, View};
