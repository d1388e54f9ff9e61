//! Rendering of a parsed [`Expression`] back to Compositional Grammar text,
//! in three modes: Default (terms preserved as parsed), Canonical (terms
//! stripped and every list sorted, for structural equality testing), and
//! Updating (terms replaced with freshly resolved preferred synonyms).

use crate::ast::{Clause, ConceptRef, DefinitionStatus, Expression, Refinement, Value};
use snomed_types::SctId;
use std::fmt::Write as _;

/// Supplies a fresh display term for a concept, used by [`RenderMode::Updating`].
///
/// Kept as a trait rather than a hard dependency on a semantic query engine,
/// so this crate can render expressions without depending on a live store.
pub trait TermResolver {
    /// Returns the term to display for `concept_id`, if one can be resolved.
    fn resolve_term(&self, concept_id: SctId) -> Option<String>;
}

/// How an [`Expression`] should be rendered back to text.
pub enum RenderMode<'a> {
    /// Preserve terms and ordering exactly as parsed.
    Default,
    /// Strip terms and sort every list, for canonical-form equality testing.
    Canonical,
    /// Replace every concept's term with one freshly resolved by `resolver`.
    Updating(&'a dyn TermResolver),
}

/// Renders `expr` to Compositional Grammar text under the given mode.
pub fn render(expr: &Expression, mode: &RenderMode<'_>) -> String {
    match mode {
        RenderMode::Default => render_expression(expr, &|c| c.term.clone()),
        RenderMode::Canonical => {
            let canonical = canonicalize(expr);
            render_expression(&canonical, &|_| None)
        }
        RenderMode::Updating(resolver) => {
            render_expression(expr, &|c| resolver.resolve_term(c.concept_id))
        }
    }
}

/// Produces the canonical form of `expr`: terms stripped, focus concepts,
/// refinements, and groups sorted into a deterministic order. Applying this
/// twice is idempotent, which is what makes it suitable for testing whether
/// two expressions denote the same post-coordinated meaning.
pub fn canonicalize(expr: &Expression) -> Expression {
    Expression {
        definition_status: expr.definition_status,
        clause: canonicalize_clause(&expr.clause),
    }
}

fn canonicalize_clause(clause: &Clause) -> Clause {
    let mut focus_concepts: Vec<ConceptRef> = clause
        .focus_concepts
        .iter()
        .map(|c| ConceptRef::new(c.concept_id))
        .collect();
    focus_concepts.sort_by_key(|c| c.concept_id);

    let mut refinements: Vec<Refinement> =
        clause.refinements.iter().map(canonicalize_refinement).collect();
    refinements.sort_by(refinement_order);

    let mut groups: Vec<Vec<Refinement>> = clause
        .groups
        .iter()
        .map(|group| {
            let mut canon: Vec<Refinement> = group.iter().map(canonicalize_refinement).collect();
            canon.sort_by(refinement_order);
            canon
        })
        .collect();
    groups.sort_by(|a, b| render_group(a, &|_| None).cmp(&render_group(b, &|_| None)));

    Clause {
        focus_concepts,
        refinements,
        groups,
    }
}

fn canonicalize_refinement(refinement: &Refinement) -> Refinement {
    Refinement {
        attribute: ConceptRef::new(refinement.attribute.concept_id),
        value: canonicalize_value(&refinement.value),
    }
}

fn canonicalize_value(value: &Value) -> Value {
    match value {
        Value::Concept(c) => Value::Concept(ConceptRef::new(c.concept_id)),
        Value::Nested(clause) => Value::Nested(Box::new(canonicalize_clause(clause))),
        Value::Integer(i) => Value::Integer(*i),
        Value::Decimal(d) => Value::Decimal(d.clone()),
        Value::String(s) => Value::String(s.clone()),
    }
}

fn refinement_order(a: &Refinement, b: &Refinement) -> std::cmp::Ordering {
    a.attribute
        .concept_id
        .cmp(&b.attribute.concept_id)
        .then_with(|| render_value(&a.value, &|_| None).cmp(&render_value(&b.value, &|_| None)))
}

fn render_expression(expr: &Expression, term_of: &dyn Fn(&ConceptRef) -> Option<String>) -> String {
    let mut out = String::new();
    match expr.definition_status {
        DefinitionStatus::Equivalent => {}
        DefinitionStatus::Subtype => out.push_str("<<< "),
    }
    out.push_str(&render_clause(&expr.clause, term_of));
    out
}

fn render_clause(clause: &Clause, term_of: &dyn Fn(&ConceptRef) -> Option<String>) -> String {
    let mut out = String::new();
    let focus: Vec<String> = clause
        .focus_concepts
        .iter()
        .map(|c| render_concept_ref(c, term_of))
        .collect();
    out.push_str(&focus.join(" + "));

    let mut sections = Vec::new();
    for refinement in &clause.refinements {
        sections.push(render_refinement(refinement, term_of));
    }
    for group in &clause.groups {
        sections.push(render_group(group, term_of));
    }
    if !sections.is_empty() {
        out.push_str(": ");
        out.push_str(&sections.join(", "));
    }
    out
}

fn render_group(group: &[Refinement], term_of: &dyn Fn(&ConceptRef) -> Option<String>) -> String {
    let items: Vec<String> = group.iter().map(|r| render_refinement(r, term_of)).collect();
    format!("{{ {} }}", items.join(", "))
}

fn render_refinement(refinement: &Refinement, term_of: &dyn Fn(&ConceptRef) -> Option<String>) -> String {
    format!(
        "{} = {}",
        render_concept_ref(&refinement.attribute, term_of),
        render_value(&refinement.value, term_of)
    )
}

fn render_value(value: &Value, term_of: &dyn Fn(&ConceptRef) -> Option<String>) -> String {
    match value {
        Value::Concept(c) => render_concept_ref(c, term_of),
        Value::Nested(clause) => format!("({})", render_clause(clause, term_of)),
        Value::Integer(i) => format!("#{i}"),
        Value::Decimal(d) => format!("#{d}"),
        Value::String(s) => format!("\"{s}\""),
    }
}

fn render_concept_ref(concept: &ConceptRef, term_of: &dyn Fn(&ConceptRef) -> Option<String>) -> String {
    let mut out = String::new();
    let _ = write!(out, "{}", concept.concept_id);
    if let Some(term) = term_of(concept) {
        let _ = write!(out, " |{term}|");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    struct StaticResolver;
    impl TermResolver for StaticResolver {
        fn resolve_term(&self, concept_id: SctId) -> Option<String> {
            match concept_id {
                64572001 => Some("Disease (disorder)".to_string()),
                246454002 => Some("Occurrence".to_string()),
                _ => None,
            }
        }
    }

    #[test]
    fn default_render_round_trips_terms() {
        let expr = parse("64572001 |disease|: 246454002 |occurrence| = 255407002").unwrap();
        let rendered = render(&expr, &RenderMode::Default);
        assert_eq!(
            rendered,
            "64572001 |disease|: 246454002 |occurrence| = 255407002"
        );
    }

    #[test]
    fn canonical_render_strips_terms_and_sorts_refinements() {
        let expr = parse(
            "64572001: 363698007 |finding site| = 113257007, 246454002 |occurrence| = 255407002",
        )
        .unwrap();
        let rendered = render(&expr, &RenderMode::Canonical);
        assert_eq!(
            rendered,
            "64572001: 246454002 = 255407002, 363698007 = 113257007"
        );
    }

    #[test]
    fn canonical_form_is_idempotent() {
        let expr = parse(
            "64572001 |disease|: 363698007 = 113257007, 246454002 = 255407002, \
             404684003 |finding| = #42",
        )
        .unwrap();
        let once = render(&expr, &RenderMode::Canonical);
        let twice = render(&parse(&once).unwrap(), &RenderMode::Canonical);
        assert_eq!(once, twice);
    }

    #[test]
    fn canonical_form_ignores_focus_concept_order() {
        let a = parse("64572001 + 73211009").unwrap();
        let b = parse("73211009 + 64572001").unwrap();
        assert_eq!(
            render(&a, &RenderMode::Canonical),
            render(&b, &RenderMode::Canonical)
        );
    }

    #[test]
    fn updating_render_replaces_terms_via_resolver() {
        let expr = parse("64572001 |old disease name|: 246454002 = 255407002").unwrap();
        let resolver = StaticResolver;
        let rendered = render(&expr, &RenderMode::Updating(&resolver));
        assert_eq!(
            rendered,
            "64572001 |Disease (disorder)|: 246454002 |Occurrence| = 255407002"
        );
    }
}
