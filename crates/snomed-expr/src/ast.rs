//! The Compositional Grammar expression tree.

use snomed_types::SctId;

/// Whether a clause's focus concepts are declared equivalent to, or a
/// subtype of, the post-coordinated meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionStatus {
    /// `===` (the default when no prefix is given).
    Equivalent,
    /// `<<<`.
    Subtype,
}

/// A reference to a concept, optionally carrying its term for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConceptRef {
    /// The concept's SCTID.
    pub concept_id: SctId,
    /// The concept's term, present when the source carried a `|term|` tag.
    pub term: Option<String>,
}

impl ConceptRef {
    /// Builds a concept reference with no term.
    pub fn new(concept_id: SctId) -> Self {
        Self {
            concept_id,
            term: None,
        }
    }

    /// Builds a concept reference carrying a term.
    pub fn with_term(concept_id: SctId, term: impl Into<String>) -> Self {
        Self {
            concept_id,
            term: Some(term.into()),
        }
    }
}

/// The value side of a refinement: a nested concept, a sub-expression, or a
/// literal.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A concept reference.
    Concept(ConceptRef),
    /// A parenthesised nested expression.
    Nested(Box<Clause>),
    /// An integer literal (`#123`).
    Integer(i64),
    /// A decimal literal (`#1.5`).
    Decimal(String),
    /// A quoted string literal.
    String(String),
}

/// A single `attribute = value` refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    /// The attribute concept.
    pub attribute: ConceptRef,
    /// The refinement's value.
    pub value: Value,
}

/// One focus clause: its concepts plus ungrouped and grouped refinements.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// The focus concepts, joined by `+` in source syntax.
    pub focus_concepts: Vec<ConceptRef>,
    /// Refinements outside any `{ }` group.
    pub refinements: Vec<Refinement>,
    /// Refinements grouped by `{ }`.
    pub groups: Vec<Vec<Refinement>>,
}

/// A complete Compositional Grammar expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    /// Whether this expression denotes an equivalent or a subtype meaning.
    pub definition_status: DefinitionStatus,
    /// The expression's single clause.
    pub clause: Clause,
}
