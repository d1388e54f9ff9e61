//! # snomed-expr
//!
//! Parser and renderer for SNOMED CT Compositional Grammar expressions:
//! post-coordinated concept references built from a focus set plus
//! attribute-value refinements, distinct from the Expression Constraint
//! Language used to query the terminology.
//!
//! ## Usage
//!
//! ```
//! use snomed_expr::{parse, render, RenderMode};
//!
//! let expr = parse("64572001 |disease|: 246454002 |occurrence| = 255407002 |neonatal|").unwrap();
//! assert_eq!(expr.clause.focus_concepts[0].concept_id, 64572001);
//!
//! let canonical = render(&expr, &RenderMode::Canonical);
//! assert_eq!(canonical, "64572001: 246454002 = 255407002");
//! ```

#![warn(missing_docs)]

pub mod ast;
mod error;
mod parser;
mod render;

pub use ast::{Clause, ConceptRef, DefinitionStatus, Expression, Refinement, Value};
pub use error::{ExprError, ExprResult};
pub use parser::parse;
pub use render::{canonicalize, render, RenderMode, TermResolver};
