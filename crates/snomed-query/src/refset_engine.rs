//! Typed reference-set access: membership, cross-map resolution, and the
//! "best member" mapping used for dm+d-style simple-refset lookups.

use crate::error::QueryResult;
use crate::semantic::SemanticEngine;
use snomed_store::Store;
use snomed_types::{ReferenceSetItem, SctId};
use std::collections::HashSet;

/// Typed access to reference-set membership and cross-map indexes.
pub struct RefsetEngine<'a> {
    store: &'a Store,
}

impl<'a> RefsetEngine<'a> {
    /// Builds an engine over the given store.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Every item (active and inactive) binding `component_id` into `refset_id`.
    pub fn component_from_refset(
        &self,
        refset_id: SctId,
        component_id: SctId,
    ) -> QueryResult<Vec<ReferenceSetItem>> {
        Ok(self
            .store
            .view()
            .component_from_refset(refset_id, component_id)?)
    }

    /// Active members of `refset_id`.
    pub fn refset_components(&self, refset_id: SctId) -> QueryResult<HashSet<SctId>> {
        Ok(self
            .store
            .view()
            .refset_components(refset_id)?
            .into_iter()
            .collect())
    }

    /// Reverse cross-map: SCTIDs mapped to `external_code` within `refset_id`.
    pub fn map_target(&self, refset_id: SctId, external_code: &str) -> QueryResult<Vec<SctId>> {
        Ok(self.store.view().map_target(refset_id, external_code)?)
    }

    /// Whether `component_id` is an active member of `refset_id`.
    pub fn is_in_refset(&self, component_id: SctId, refset_id: SctId) -> QueryResult<bool> {
        Ok(self.store.view().is_in_refset(component_id, refset_id)?)
    }

    /// Forward cross-map: every map item for `component_id` within
    /// `target_refset_id`, in RF2 map-priority order.
    pub fn cross_map(
        &self,
        component_id: SctId,
        target_refset_id: SctId,
    ) -> QueryResult<Vec<ReferenceSetItem>> {
        let mut items = self.component_from_refset(target_refset_id, component_id)?;
        items.sort_by_key(|item| match item {
            ReferenceSetItem::ComplexMap(m) => (m.map_group, m.map_priority),
            _ => (0, 0),
        });
        Ok(items)
    }

    /// Maps `component_id` to the closest active member of `refset_id`,
    /// walking the IS-A hierarchy via [`SemanticEngine::genericise_to`].
    pub fn map(&self, component_id: SctId, refset_id: SctId) -> QueryResult<SctId> {
        let target_set = self.refset_components(refset_id)?;
        SemanticEngine::new(self.store).genericise_to(component_id, &target_set)
    }
}
