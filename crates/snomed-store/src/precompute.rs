//! Derived-index precomputation.
//!
//! `ChildRelationships` and `ParentRelationshipsByConcept` are added to
//! incrementally as relationships are imported (see [`crate::store::Update`]),
//! which is enough for a first import into an empty store. But a later
//! snapshot that inactivates a previously active IS-A relationship only
//! overwrites the base `Relationships` record; the inline maintenance never
//! removes the now-stale index entries. `TransitiveClosure` and
//! `SearchTokens` always require a pass over already-committed facts rather
//! than incremental maintenance. All three are therefore rebuilt here on
//! demand, each clearing its bucket first so a cancelled or failed pass never
//! leaves half-built state mixed with the previous generation.
//!
//! `rebuild_transitive_closure` always rebuilds the child/parent index
//! first, since it walks that index's output; call it (not
//! `rebuild_child_parent_index` directly) after every import so a
//! re-imported snapshot's inactivations are reflected consistently across
//! all three buckets.

use crate::error::StoreResult;
use crate::store::{
    Update, CF_CHILD_RELATIONSHIPS, CF_PARENT_RELATIONSHIPS_BY_CONCEPT, CF_RELATIONSHIPS,
    CF_SEARCH_TOKENS, CF_TRANSITIVE_CLOSURE,
};
use snomed_types::SctId;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Cooperative cancellation signal for long-running precomputation passes.
pub trait PrecomputeCancellation {
    /// Returns true once the caller wants the current pass to stop early.
    fn is_cancelled(&self) -> bool;
}

impl PrecomputeCancellation for std::sync::atomic::AtomicBool {
    fn is_cancelled(&self) -> bool {
        self.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// A no-op cancellation signal for callers that never want to cancel.
pub struct NeverCancel;

impl PrecomputeCancellation for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl Update<'_> {
    /// Rebuilds `ChildRelationships` and `ParentRelationshipsByConcept` from
    /// the currently committed `Relationships` bucket (active IS-A rows
    /// only), clearing both first.
    ///
    /// This is what makes re-importing a snapshot that inactivates a
    /// previously active IS-A relationship actually drop it from
    /// `children_of`/`parents_of` rather than leaving the stale entry the
    /// inline maintenance in [`crate::store::Update::put_relationships`]
    /// added on first import.
    pub fn rebuild_child_parent_index<C: PrecomputeCancellation>(
        &self,
        cancel: &C,
    ) -> StoreResult<usize> {
        self.clear_bucket(CF_CHILD_RELATIONSHIPS)?;
        self.clear_bucket(CF_PARENT_RELATIONSHIPS_BY_CONCEPT)?;

        let mut pairs_written = 0usize;
        let iter = self.db().iterator_cf(
            self.db().cf_handle(CF_RELATIONSHIPS).unwrap(),
            rocksdb::IteratorMode::Start,
        );

        for item in iter {
            if cancel.is_cancelled() {
                break;
            }
            let (_, value) = item?;
            let relationship: snomed_types::Rf2Relationship = bincode::deserialize(&value)?;
            if !relationship.active || !relationship.is_is_a() {
                continue;
            }
            // destination_id is the parent, source_id is the child.
            self.put_child_relationship(relationship.destination_id, relationship.source_id)?;
            self.put_parent_relationship(relationship.source_id, relationship.destination_id)?;
            pairs_written += 1;
        }

        Ok(pairs_written)
    }

    /// Rebuilds `ChildRelationships`/`ParentRelationshipsByConcept` and then
    /// `TransitiveClosure` from the currently committed `Relationships`
    /// bucket (active IS-A relationships only).
    ///
    /// Always rebuilds the child/parent index first: `TransitiveClosure` is
    /// derived from it, so computing one without refreshing the other first
    /// would let a stale parent/child pair from an inactivated relationship
    /// leak into the closure.
    ///
    /// Walks from each concept that appears as a parent, via breadth-first
    /// search over descendants, recording every ancestor-descendant pair.
    /// Cycles (which should not occur in valid SNOMED CT content but would
    /// otherwise loop forever) are detected per-root and logged, not
    /// followed twice.
    pub fn rebuild_transitive_closure<C: PrecomputeCancellation>(
        &self,
        cancel: &C,
    ) -> StoreResult<usize> {
        self.rebuild_child_parent_index(cancel)?;
        self.clear_bucket(CF_TRANSITIVE_CLOSURE)?;

        let children = collect_adjacency(self.db(), crate::store::CF_CHILD_RELATIONSHIPS)?;
        let mut pairs_written = 0usize;

        for &root in children.keys() {
            if cancel.is_cancelled() {
                break;
            }
            let mut visited = HashSet::new();
            let mut queue = vec![root];
            visited.insert(root);

            while let Some(current) = queue.pop() {
                if let Some(kids) = children.get(&current) {
                    for &child in kids {
                        if !visited.insert(child) {
                            if child == root {
                                warn!(concept = root, "cycle detected in IS-A hierarchy, skipping");
                            }
                            continue;
                        }
                        self.put_ancestor(child, root)?;
                        pairs_written += 1;
                        queue.push(child);
                    }
                }
            }
        }

        Ok(pairs_written)
    }

    /// Rebuilds `SearchTokens` from currently committed `Descriptions`,
    /// tokenizing each active term by ASCII whitespace and lowercasing via
    /// Unicode case folding.
    pub fn rebuild_search_tokens<C: PrecomputeCancellation>(&self, cancel: &C) -> StoreResult<usize> {
        self.clear_bucket(CF_SEARCH_TOKENS)?;

        let mut tokens_written = 0usize;
        let iter = self
            .db()
            .iterator_cf(
                self.db().cf_handle(crate::store::CF_DESCRIPTIONS).unwrap(),
                rocksdb::IteratorMode::Start,
            );

        for item in iter {
            if cancel.is_cancelled() {
                break;
            }
            let (_, value) = item?;
            let description: snomed_types::Rf2Description = bincode::deserialize(&value)?;
            if !description.active {
                continue;
            }
            for token in tokenize(&description.term) {
                self.put_search_token(&token, description.id)?;
                tokens_written += 1;
            }
        }

        Ok(tokens_written)
    }
}

fn collect_adjacency(
    db: &rocksdb::DB,
    bucket: &str,
) -> StoreResult<HashMap<SctId, Vec<SctId>>> {
    let cf_handle = db.cf_handle(bucket).unwrap();
    let mut adjacency: HashMap<SctId, Vec<SctId>> = HashMap::new();
    let iter = db.iterator_cf(cf_handle, rocksdb::IteratorMode::Start);
    for item in iter {
        let (key, _) = item?;
        let mut lead_bytes = [0u8; 8];
        lead_bytes.copy_from_slice(&key[0..8]);
        let lead = SctId::from_be_bytes(lead_bytes);
        let trail = crate::keys::trailing_sctid(&key);
        adjacency.entry(lead).or_default().push(trail);
    }
    Ok(adjacency)
}

fn tokenize(term: &str) -> Vec<String> {
    term.split(|c: char| !c.is_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;
    use snomed_types::{CharacteristicType, ModifierType};
    use tempfile::tempdir;

    #[test]
    fn tokenize_splits_and_lowercases() {
        let tokens = tokenize("Diabetes mellitus (disorder)");
        assert_eq!(tokens, vec!["diabetes", "mellitus", "disorder"]);
    }

    #[test]
    fn transitive_closure_covers_multi_level_ancestry() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let update = store.update();

        // grandchild -> child -> root
        let rel = |id: SctId, source: SctId, destination: SctId| snomed_types::Rf2Relationship {
            id,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            source_id: source,
            destination_id: destination,
            relationship_group: 0,
            type_id: snomed_types::well_known::IS_A,
            characteristic_type_id: CharacteristicType::INFERRED_ID,
            modifier_id: ModifierType::EXISTENTIAL_ID,
        };

        update
            .put_relationships(&[rel(1, 20, 10), rel(2, 30, 20)])
            .unwrap();
        update.rebuild_transitive_closure(&NeverCancel).unwrap();
        drop(update);

        let view = store.view();
        let mut ancestors = view.ancestors_of(30).unwrap();
        ancestors.sort();
        assert_eq!(ancestors, vec![10, 20]);
        assert!(view.subsumes(10, 30).unwrap());
        assert!(!view.subsumes(30, 10).unwrap());
    }

    #[test]
    fn reimport_inactivating_an_is_a_relationship_drops_it_from_every_derived_index() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let rel = |id: SctId, active: bool, effective_time: u32| snomed_types::Rf2Relationship {
            id,
            effective_time,
            active,
            module_id: 900000000000207008,
            source_id: 73211009,
            destination_id: 362969004,
            relationship_group: 0,
            type_id: snomed_types::well_known::IS_A,
            characteristic_type_id: CharacteristicType::INFERRED_ID,
            modifier_id: ModifierType::EXISTENTIAL_ID,
        };

        let update = store.update();
        update.put_relationships(&[rel(100000028, true, 20020131)]).unwrap();
        update.rebuild_transitive_closure(&NeverCancel).unwrap();
        drop(update);

        let view = store.view();
        assert_eq!(view.children_of(362969004).unwrap(), vec![73211009]);
        assert_eq!(view.parents_of(73211009).unwrap(), vec![362969004]);
        assert!(view.subsumes(362969004, 73211009).unwrap());

        // A later snapshot inactivates the same relationship id.
        let update = store.update();
        update.put_relationships(&[rel(100000028, false, 20210731)]).unwrap();
        update.rebuild_transitive_closure(&NeverCancel).unwrap();
        drop(update);

        let view = store.view();
        assert!(view.children_of(362969004).unwrap().is_empty());
        assert!(view.parents_of(73211009).unwrap().is_empty());
        assert!(!view.subsumes(362969004, 73211009).unwrap());
    }

    #[test]
    fn search_tokens_index_only_active_descriptions() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let update = store.update();

        let active = snomed_types::Rf2Description {
            id: 1,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            concept_id: 73211009,
            language_code: "en".to_string(),
            type_id: snomed_types::DescriptionType::FSN_ID,
            term: "Appendicitis".to_string(),
            case_significance_id: 900000000000448009,
        };
        let mut inactive = active.clone();
        inactive.id = 2;
        inactive.active = false;
        inactive.term = "Obsolete term".to_string();

        update.put_descriptions(&[active, inactive]).unwrap();
        update.rebuild_search_tokens(&NeverCancel).unwrap();
        drop(update);

        let view = store.view();
        assert_eq!(view.search_token("appendicitis").unwrap(), vec![1]);
        assert!(view.search_token("obsolete").unwrap().is_empty());
    }
}
