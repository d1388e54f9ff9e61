//! The `ExtendedConcept` derived entity: a concept bundled with everything a
//! client typically needs about it in one round trip, assembled from the
//! semantic and reference-set engines rather than stored directly.

use crate::error::QueryResult;
use crate::lang::{LanguageRefset, DEFAULT_LANGUAGE_REFSETS};
use crate::semantic::SemanticEngine;
use snomed_store::Store;
use snomed_types::{Rf2Concept, Rf2Description, Rf2Relationship, SctId};
use std::collections::HashSet;

/// A concept together with its active descriptions, preferred synonym,
/// parentage, and reference-set memberships.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedConcept {
    /// The concept itself.
    pub concept: Rf2Concept,
    /// Every active description of the concept.
    pub descriptions: Vec<Rf2Description>,
    /// The preferred synonym for the caller's language preferences.
    pub preferred_synonym: Rf2Description,
    /// Direct IS-A parent ids.
    pub parent_ids: Vec<SctId>,
    /// Every ancestor reachable via active IS-A relationships.
    pub transitive_parent_ids: HashSet<SctId>,
    /// The active IS-A relationships backing `parent_ids` (full records,
    /// not just the destination ids).
    pub active_parent_relationships: Vec<Rf2Relationship>,
    /// Reference sets the concept belongs to.
    pub refset_ids: Vec<SctId>,
}

/// Assembles [`ExtendedConcept`]s by composing [`SemanticEngine`] and
/// [`RefsetEngine`] over a single store.
pub struct ExtendedConceptEngine<'a> {
    store: &'a Store,
}

impl<'a> ExtendedConceptEngine<'a> {
    /// Builds an engine over the given store.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Assembles the `ExtendedConcept` for `concept_id`, selecting the
    /// preferred synonym from `language_tags` against the default language
    /// reference sets, with no dm+d override.
    pub fn extended_concept(
        &self,
        concept_id: SctId,
        language_tags: &[String],
    ) -> QueryResult<ExtendedConcept> {
        self.extended_concept_with_refsets(concept_id, language_tags, None, DEFAULT_LANGUAGE_REFSETS)
    }

    /// As [`Self::extended_concept`], with an explicit dm+d override refset
    /// and candidate language reference sets.
    pub fn extended_concept_with_refsets(
        &self,
        concept_id: SctId,
        language_tags: &[String],
        dmd_override_refset: Option<SctId>,
        available_refsets: &[LanguageRefset],
    ) -> QueryResult<ExtendedConcept> {
        let semantic = SemanticEngine::new(self.store);

        let concept = semantic.concept(concept_id)?;
        let descriptions: Vec<Rf2Description> = semantic
            .descriptions(concept_id)?
            .into_iter()
            .filter(|d| d.active)
            .collect();
        let preferred_synonym = semantic.preferred_synonym(
            concept_id,
            language_tags,
            dmd_override_refset,
            available_refsets,
        )?;
        let parent_ids = semantic.parents(concept_id)?;
        let transitive_parent_ids = semantic.ancestors(concept_id)?;
        let active_parent_relationships = self
            .store
            .view()
            .relationships_from(concept_id)?
            .into_iter()
            .filter(|r| r.active && r.is_is_a())
            .collect();
        let refset_ids = self.store.view().refsets_of_component(concept_id)?;

        Ok(ExtendedConcept {
            concept,
            descriptions,
            preferred_synonym,
            parent_ids,
            transitive_parent_ids,
            active_parent_relationships,
            refset_ids,
        })
    }
}
