//! Graph traversal over the IS-A hierarchy, description selection, and
//! cross-map resolution.

use crate::cancellation::CancellationToken;
use crate::error::{QueryError, QueryResult};
use crate::lang::{match_language_refset, LanguageRefset};
use snomed_store::Store;
use snomed_types::{
    well_known, DescriptionType, ReferenceSetItem, Rf2Concept, Rf2Description, Rf2Relationship,
    SctId,
};
use std::collections::{HashMap, HashSet, VecDeque};

/// Result of comparing two concepts under FHIR terminology-service
/// subsumption semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsumptionRelation {
    /// The two concepts are the same.
    Equivalent,
    /// `a` subsumes `b` (`b` is-a `a`).
    Subsumes,
    /// `a` is subsumed by `b` (`a` is-a `b`).
    SubsumedBy,
    /// Neither subsumes the other.
    NotSubsumed,
}

/// Graph traversal and description-selection operations over a [`Store`].
pub struct SemanticEngine<'a> {
    store: &'a Store,
}

impl<'a> SemanticEngine<'a> {
    /// Builds an engine over the given store.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Looks up a concept, erroring if it does not exist.
    pub fn concept(&self, id: SctId) -> QueryResult<Rf2Concept> {
        self.store
            .view()
            .get_concept(id)?
            .ok_or(QueryError::NotFound(id))
    }

    /// All descriptions (active and inactive) of a concept.
    pub fn descriptions(&self, concept_id: SctId) -> QueryResult<Vec<Rf2Description>> {
        Ok(self.store.view().descriptions_of(concept_id)?)
    }

    /// Looks up a single description, erroring if it does not exist.
    pub fn description(&self, id: SctId) -> QueryResult<Rf2Description> {
        self.store
            .view()
            .get_description(id)?
            .ok_or(QueryError::NotFound(id))
    }

    /// Active, non-IS-A defining relationships sourced by `concept_id`: the
    /// attribute-value refinements that narrow its meaning, as distinct from
    /// the IS-A edges that place it in the hierarchy.
    pub fn refinements(&self, concept_id: SctId) -> QueryResult<Vec<Rf2Relationship>> {
        Ok(self
            .store
            .view()
            .relationships_from(concept_id)?
            .into_iter()
            .filter(|r| r.active && !r.is_is_a())
            .collect())
    }

    /// Direct IS-A parents.
    pub fn parents(&self, concept_id: SctId) -> QueryResult<Vec<SctId>> {
        Ok(self.store.view().parents_of(concept_id)?)
    }

    /// Direct IS-A children.
    pub fn children(&self, concept_id: SctId) -> QueryResult<Vec<SctId>> {
        Ok(self.store.view().children_of(concept_id)?)
    }

    /// All ancestors reachable by active IS-A relationships. Uses the
    /// precomputed transitive closure when available, otherwise falls back
    /// to a recursive walk over `ParentRelationshipsByConcept`.
    pub fn ancestors(&self, concept_id: SctId) -> QueryResult<HashSet<SctId>> {
        let view = self.store.view();
        let precomputed = view.ancestors_of(concept_id)?;
        if !precomputed.is_empty() {
            return Ok(precomputed.into_iter().collect());
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([concept_id]);
        while let Some(current) = queue.pop_front() {
            for parent in view.parents_of(current)? {
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        Ok(seen)
    }

    /// A lazy, cancellable, fan-out-bounded walk of descendants via active
    /// IS-A relationships, breadth-first from `concept_id`.
    pub fn descendants(
        &self,
        concept_id: SctId,
        limit: usize,
        cancel: &CancellationToken,
    ) -> QueryResult<Vec<SctId>> {
        let view = self.store.view();
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut queue = VecDeque::from([concept_id]);
        seen.insert(concept_id);

        'walk: while let Some(current) = queue.pop_front() {
            if cancel.is_cancelled() {
                return Err(QueryError::Cancelled);
            }
            for child in view.children_of(current)? {
                if seen.insert(child) {
                    out.push(child);
                    if out.len() >= limit {
                        break 'walk;
                    }
                    queue.push_back(child);
                }
            }
        }
        Ok(out)
    }

    /// `isA(conceptId, ancestorId)`, constant-time when the transitive
    /// closure has been precomputed.
    pub fn is_a(&self, concept_id: SctId, ancestor_id: SctId) -> QueryResult<bool> {
        Ok(self.store.view().subsumes(ancestor_id, concept_id)?)
    }

    /// FHIR-style subsumption comparison between `a` and `b`.
    pub fn subsumes(&self, a: SctId, b: SctId) -> QueryResult<SubsumptionRelation> {
        if a == b {
            return Ok(SubsumptionRelation::Equivalent);
        }
        if self.is_a(b, a)? {
            return Ok(SubsumptionRelation::Subsumes);
        }
        if self.is_a(a, b)? {
            return Ok(SubsumptionRelation::SubsumedBy);
        }
        Ok(SubsumptionRelation::NotSubsumed)
    }

    /// Every distinct ancestor path from `concept_id` to the SNOMED root,
    /// via active IS-A relationships.
    pub fn paths_to_root(&self, concept_id: SctId) -> QueryResult<Vec<Vec<SctId>>> {
        let view = self.store.view();
        let mut paths = Vec::new();
        let mut current_path = vec![concept_id];
        walk_paths_to_root(&view, concept_id, &mut current_path, &mut paths)?;
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    /// Maps `concept_id` to the member of `target_set` closest to it (fewest
    /// IS-A steps). Ties are broken deterministically by ascending SCTID
    /// within the same BFS level.
    pub fn genericise_to(
        &self,
        concept_id: SctId,
        target_set: &HashSet<SctId>,
    ) -> QueryResult<SctId> {
        let view = self.store.view();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([concept_id]);
        seen.insert(concept_id);

        while let Some(current) = queue.pop_front() {
            if target_set.contains(&current) {
                return Ok(current);
            }
            let mut parents = view.parents_of(current)?;
            parents.sort();
            for parent in parents {
                if seen.insert(parent) {
                    queue.push_back(parent);
                }
            }
        }
        Err(QueryError::NoGenericisationTarget(concept_id))
    }

    /// Returns the concept one IS-A step below the nearest occurrence of
    /// `root_id` on the shortest path from `concept_id` toward `root_id`.
    pub fn genericise_to_root(&self, concept_id: SctId, root_id: SctId) -> QueryResult<SctId> {
        if concept_id == root_id {
            return Err(QueryError::NotAnAncestor {
                concept: concept_id,
                root: root_id,
            });
        }

        let view = self.store.view();
        let mut child_of: HashMap<SctId, SctId> = HashMap::new();
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([concept_id]);
        seen.insert(concept_id);
        let mut reached = false;

        while let Some(current) = queue.pop_front() {
            if current == root_id {
                reached = true;
                break;
            }
            for parent in view.parents_of(current)? {
                if seen.insert(parent) {
                    child_of.insert(parent, current);
                    queue.push_back(parent);
                }
            }
        }

        if !reached {
            return Err(QueryError::NotAnAncestor {
                concept: concept_id,
                root: root_id,
            });
        }
        Ok(child_of[&root_id])
    }

    /// Resolves the preferred synonym for `concept_id` given a ranked list
    /// of language preferences, optionally overridden by a specific
    /// language reference set (e.g. the dm+d realm refset).
    pub fn preferred_synonym(
        &self,
        concept_id: SctId,
        language_tags: &[String],
        dmd_override_refset: Option<SctId>,
        available_refsets: &[LanguageRefset],
    ) -> QueryResult<Rf2Description> {
        self.preferred_description(
            concept_id,
            DescriptionType::SYNONYM_ID,
            language_tags,
            dmd_override_refset,
            available_refsets,
        )
    }

    /// Resolves the fully-specified name for `concept_id`, by the same rule
    /// as [`SemanticEngine::preferred_synonym`] restricted to FSN descriptions.
    pub fn fully_specified_name(
        &self,
        concept_id: SctId,
        language_tags: &[String],
        dmd_override_refset: Option<SctId>,
        available_refsets: &[LanguageRefset],
    ) -> QueryResult<Rf2Description> {
        self.preferred_description(
            concept_id,
            DescriptionType::FSN_ID,
            language_tags,
            dmd_override_refset,
            available_refsets,
        )
    }

    fn preferred_description(
        &self,
        concept_id: SctId,
        description_type: SctId,
        language_tags: &[String],
        dmd_override_refset: Option<SctId>,
        available_refsets: &[LanguageRefset],
    ) -> QueryResult<Rf2Description> {
        let refset_id = dmd_override_refset
            .or_else(|| match_language_refset(language_tags, available_refsets))
            .ok_or(QueryError::NoLanguageRefsetMatch)?;

        let view = self.store.view();
        let mut candidates: Vec<Rf2Description> = view
            .descriptions_of(concept_id)?
            .into_iter()
            .filter(|d| d.active && d.type_id == description_type)
            .collect();
        candidates.sort_by_key(|d| d.id);

        for description in candidates {
            let items = view.component_from_refset(refset_id, description.id)?;
            let is_preferred = items.iter().any(|item| {
                item.active()
                    && matches!(item, ReferenceSetItem::Language(lang) if lang.is_preferred())
            });
            if is_preferred {
                return Ok(description);
            }
        }

        if description_type == DescriptionType::FSN_ID {
            Err(QueryError::MissingFsn(concept_id))
        } else {
            Err(QueryError::NotFound(concept_id))
        }
    }
}

fn walk_paths_to_root(
    view: &snomed_store::View<'_>,
    current: SctId,
    path: &mut Vec<SctId>,
    out: &mut Vec<Vec<SctId>>,
) -> QueryResult<()> {
    if current == well_known::SNOMED_CT_ROOT {
        out.push(path.clone());
        return Ok(());
    }
    for parent in view.parents_of(current)? {
        path.push(parent);
        walk_paths_to_root(view, parent, path, out)?;
        path.pop();
    }
    Ok(())
}
