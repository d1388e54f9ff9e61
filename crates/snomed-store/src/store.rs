//! The embedded key-value store: one RocksDB column family per logical
//! bucket, a single-writer/multi-reader split, and the bucket readers and
//! writers the import pipeline and precomputation passes use.

use crate::descriptor::ensure_descriptor;
use crate::error::{StoreError, StoreResult};
use crate::keys::{
    map_target_key, map_target_prefix, pair_key, sctid_key, token_key, token_prefix,
    trailing_sctid, triple_key,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, Options, WriteBatch, DB};
use snomed_types::{ReferenceSetItem, Rf2Concept, Rf2Description, Rf2Relationship, SctId};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) const CF_CONCEPTS: &str = "concepts";
pub(crate) const CF_DESCRIPTIONS: &str = "descriptions";
pub(crate) const CF_RELATIONSHIPS: &str = "relationships";
pub(crate) const CF_REFSET_ITEMS: &str = "refset_items";
pub(crate) const CF_CHILD_RELATIONSHIPS: &str = "child_relationships";
pub(crate) const CF_DESCRIPTIONS_BY_CONCEPT: &str = "descriptions_by_concept";
pub(crate) const CF_PARENT_RELATIONSHIPS_BY_CONCEPT: &str = "parent_relationships_by_concept";
pub(crate) const CF_REFSETS_BY_COMPONENT: &str = "refsets_by_component";
pub(crate) const CF_COMPONENTS_BY_REFSET: &str = "components_by_refset";
pub(crate) const CF_MAP_TARGET_INDEX: &str = "map_target_index";
pub(crate) const CF_TRANSITIVE_CLOSURE: &str = "transitive_closure";
pub(crate) const CF_SEARCH_TOKENS: &str = "search_tokens";

const ALL_BUCKETS: &[&str] = &[
    CF_CONCEPTS,
    CF_DESCRIPTIONS,
    CF_RELATIONSHIPS,
    CF_REFSET_ITEMS,
    CF_CHILD_RELATIONSHIPS,
    CF_DESCRIPTIONS_BY_CONCEPT,
    CF_PARENT_RELATIONSHIPS_BY_CONCEPT,
    CF_REFSETS_BY_COMPONENT,
    CF_COMPONENTS_BY_REFSET,
    CF_MAP_TARGET_INDEX,
    CF_TRANSITIVE_CLOSURE,
    CF_SEARCH_TOKENS,
];

/// Embedded persistence engine for a single SNOMED CT terminology release.
///
/// Opens (or creates) a RocksDB database under `path`, one column family per
/// logical bucket described in the store's design notes. Readers and the
/// single writer are obtained through [`Store::view`] and [`Store::update`].
pub struct Store {
    db: Arc<DB>,
    write_lock: Mutex<()>,
}

impl Store {
    /// Opens the store directory at `path`, creating it (and its descriptor)
    /// if it doesn't already exist.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();
        ensure_descriptor(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cfs: Vec<ColumnFamilyDescriptor> = ALL_BUCKETS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, cfs)?;
        Ok(Self {
            db: Arc::new(db),
            write_lock: Mutex::new(()),
        })
    }

    /// Returns a read-only view over the current state of the store.
    pub fn view(&self) -> View<'_> {
        View { db: self.db.as_ref() }
    }

    /// Acquires the single write handle, blocking until any other writer
    /// finishes. Held for the lifetime of the returned [`Update`].
    pub fn update(&self) -> Update<'_> {
        let guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Update {
            db: self.db.as_ref(),
            _guard: guard,
        }
    }
}

fn cf<'a>(db: &'a DB, name: &str) -> StoreResult<&'a ColumnFamily> {
    db.cf_handle(name)
        .ok_or_else(|| StoreError::UnknownBucket(name.to_string()))
}

/// A read-only handle over the store's current contents.
pub struct View<'a> {
    db: &'a DB,
}

impl View<'_> {
    /// Looks up a concept by id.
    pub fn get_concept(&self, id: SctId) -> StoreResult<Option<Rf2Concept>> {
        get_decoded(self.db, CF_CONCEPTS, &sctid_key(id))
    }

    /// Looks up a description by id.
    pub fn get_description(&self, id: SctId) -> StoreResult<Option<Rf2Description>> {
        get_decoded(self.db, CF_DESCRIPTIONS, &sctid_key(id))
    }

    /// Looks up a relationship by id.
    pub fn get_relationship(&self, id: SctId) -> StoreResult<Option<Rf2Relationship>> {
        get_decoded(self.db, CF_RELATIONSHIPS, &sctid_key(id))
    }

    /// Looks up a reference set item by id.
    pub fn get_refset_item(&self, id: SctId) -> StoreResult<Option<ReferenceSetItem>> {
        get_decoded(self.db, CF_REFSET_ITEMS, &sctid_key(id))
    }

    /// Descriptions belonging to `concept_id`.
    pub fn descriptions_of(&self, concept_id: SctId) -> StoreResult<Vec<Rf2Description>> {
        let prefix = sctid_key(concept_id);
        let ids = scan_trailing_ids(self.db, CF_DESCRIPTIONS_BY_CONCEPT, &prefix)?;
        ids.into_iter()
            .filter_map(|id| self.get_description(id).transpose())
            .collect()
    }

    /// Active IS-A children of `parent_id` (concepts with `parent_id` as destination).
    pub fn children_of(&self, parent_id: SctId) -> StoreResult<Vec<SctId>> {
        let prefix = sctid_key(parent_id);
        scan_trailing_ids(self.db, CF_CHILD_RELATIONSHIPS, &prefix)
    }

    /// Active IS-A parents of `child_id`.
    pub fn parents_of(&self, child_id: SctId) -> StoreResult<Vec<SctId>> {
        let prefix = sctid_key(child_id);
        scan_trailing_ids(self.db, CF_PARENT_RELATIONSHIPS_BY_CONCEPT, &prefix)
    }

    /// All ancestors of `concept_id` in the active IS-A hierarchy, per the
    /// precomputed transitive closure.
    pub fn ancestors_of(&self, concept_id: SctId) -> StoreResult<Vec<SctId>> {
        let prefix = sctid_key(concept_id);
        scan_trailing_ids(self.db, CF_TRANSITIVE_CLOSURE, &prefix)
    }

    /// True if `ancestor_id` is an ancestor of (or equal to) `concept_id`.
    pub fn subsumes(&self, ancestor_id: SctId, concept_id: SctId) -> StoreResult<bool> {
        if ancestor_id == concept_id {
            return Ok(true);
        }
        let cf_handle = cf(self.db, CF_TRANSITIVE_CLOSURE)?;
        let key = pair_key(concept_id, ancestor_id);
        Ok(self.db.get_cf(cf_handle, key)?.is_some())
    }

    /// Active members of `refset_id`.
    pub fn refset_components(&self, refset_id: SctId) -> StoreResult<Vec<SctId>> {
        let prefix = sctid_key(refset_id);
        let cf_handle = cf(self.db, CF_COMPONENTS_BY_REFSET)?;
        let mut out = Vec::new();
        let iter = self
            .db
            .prefix_iterator_cf(cf_handle, prefix);
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            // key = refsetId || componentId || memberId
            let mut component_bytes = [0u8; 8];
            component_bytes.copy_from_slice(&key[8..16]);
            out.push(SctId::from_be_bytes(component_bytes));
        }
        out.dedup();
        Ok(out)
    }

    /// Every reference set item binding `component_id` into `refset_id`.
    pub fn component_from_refset(
        &self,
        refset_id: SctId,
        component_id: SctId,
    ) -> StoreResult<Vec<ReferenceSetItem>> {
        let cf_handle = cf(self.db, CF_COMPONENTS_BY_REFSET)?;
        let prefix = pair_key(refset_id, component_id);
        let mut out = Vec::new();
        let iter = self.db.prefix_iterator_cf(cf_handle, prefix);
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let member_id = trailing_sctid(&key);
            if let Some(refset_item) = self.get_refset_item(member_id)? {
                out.push(refset_item);
            }
        }
        Ok(out)
    }

    /// Whether `component_id` is an active member of `refset_id`.
    pub fn is_in_refset(&self, component_id: SctId, refset_id: SctId) -> StoreResult<bool> {
        Ok(self
            .component_from_refset(refset_id, component_id)?
            .iter()
            .any(|item| item.active()))
    }

    /// Refset ids `component_id` belongs to.
    pub fn refsets_of_component(&self, component_id: SctId) -> StoreResult<Vec<SctId>> {
        let prefix = sctid_key(component_id);
        scan_trailing_ids(self.db, CF_REFSETS_BY_COMPONENT, &prefix)
    }

    /// Reverse cross-map lookup: SCTIDs mapped to `external_code` within `refset_id`.
    pub fn map_target(
        &self,
        refset_id: SctId,
        external_code: &str,
    ) -> StoreResult<Vec<SctId>> {
        let cf_handle = cf(self.db, CF_MAP_TARGET_INDEX)?;
        let prefix = map_target_prefix(refset_id, external_code);
        let mut out = Vec::new();
        let iter = self.db.prefix_iterator_cf(cf_handle, &prefix);
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            out.push(trailing_sctid(&key));
        }
        Ok(out)
    }

    /// All relationships (active and inactive) sourced by `concept_id`, via
    /// a full scan of the `Relationships` bucket. There is no
    /// `RelationshipsBySource` derived index, so this is linear in the size
    /// of the bucket rather than a prefix scan; callers that need this
    /// repeatedly for many concepts should scan once themselves instead of
    /// calling this in a loop.
    pub fn relationships_from(&self, concept_id: SctId) -> StoreResult<Vec<Rf2Relationship>> {
        let cf_handle = cf(self.db, CF_RELATIONSHIPS)?;
        let mut out = Vec::new();
        let iter = self.db.iterator_cf(cf_handle, rocksdb::IteratorMode::Start);
        for item in iter {
            let (_, value) = item?;
            let relationship: Rf2Relationship = bincode::deserialize(&value)?;
            if relationship.source_id == concept_id {
                out.push(relationship);
            }
        }
        Ok(out)
    }

    /// Description ids whose term contains the lowercased, pre-tokenized `token`.
    pub fn search_token(&self, token: &str) -> StoreResult<Vec<SctId>> {
        let cf_handle = cf(self.db, CF_SEARCH_TOKENS)?;
        let prefix = token_prefix(token);
        let mut out = Vec::new();
        let iter = self.db.prefix_iterator_cf(cf_handle, &prefix);
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            out.push(trailing_sctid(&key));
        }
        Ok(out)
    }
}

fn get_decoded<T: serde::de::DeserializeOwned>(
    db: &DB,
    bucket: &str,
    key: &[u8],
) -> StoreResult<Option<T>> {
    let cf_handle = cf(db, bucket)?;
    match db.get_cf(cf_handle, key)? {
        Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
        None => Ok(None),
    }
}

fn scan_trailing_ids(db: &DB, bucket: &str, prefix: &[u8]) -> StoreResult<Vec<SctId>> {
    let cf_handle = cf(db, bucket)?;
    let mut out = Vec::new();
    let iter = db.prefix_iterator_cf(cf_handle, prefix);
    for item in iter {
        let (key, _) = item?;
        if !key.starts_with(prefix) {
            break;
        }
        out.push(trailing_sctid(&key));
    }
    Ok(out)
}

/// The single write handle for a [`Store`]. Held for as long as a caller
/// needs exclusive write access; dropping it releases the lock for the next
/// writer.
pub struct Update<'a> {
    db: &'a DB,
    _guard: MutexGuard<'a, ()>,
}

impl Update<'_> {
    /// Commits a batch of concepts, keeping only the highest-`effective_time`
    /// record per id.
    pub fn put_concepts(&self, concepts: &[Rf2Concept]) -> StoreResult<usize> {
        self.put_versioned(CF_CONCEPTS, concepts, |c| c.id, |c| c.effective_time)
    }

    /// Commits a batch of descriptions and maintains the `DescriptionsByConcept` index.
    pub fn put_descriptions(&self, descriptions: &[Rf2Description]) -> StoreResult<usize> {
        let written = self.put_versioned(
            CF_DESCRIPTIONS,
            descriptions,
            |d| d.id,
            |d| d.effective_time,
        )?;

        let cf_index = cf(self.db, CF_DESCRIPTIONS_BY_CONCEPT)?;
        let mut batch = WriteBatch::default();
        for description in descriptions {
            let key = pair_key(description.concept_id, description.id);
            batch.put_cf(cf_index, key, []);
        }
        self.db.write(batch)?;
        Ok(written)
    }

    /// Commits a batch of relationships and adds `ChildRelationships`/
    /// `ParentRelationshipsByConcept` entries for the active IS-A rows in
    /// this batch.
    ///
    /// This only ever adds entries: if a later snapshot inactivates a
    /// relationship that an earlier one left active, the stale pair stays
    /// in these two buckets until `rebuild_child_parent_index` (see the
    /// `precompute` module) clears and rebuilds them from the current
    /// `Relationships` bucket. Callers that re-import over existing data
    /// must run that rebuild (and the transitive closure rebuild, which
    /// depends on it) before trusting
    /// `children_of`/`parents_of`/`ancestors_of`.
    pub fn put_relationships(&self, relationships: &[Rf2Relationship]) -> StoreResult<usize> {
        let written = self.put_versioned(
            CF_RELATIONSHIPS,
            relationships,
            |r| r.id,
            |r| r.effective_time,
        )?;

        let cf_children = cf(self.db, CF_CHILD_RELATIONSHIPS)?;
        let cf_parents = cf(self.db, CF_PARENT_RELATIONSHIPS_BY_CONCEPT)?;
        let mut batch = WriteBatch::default();
        for relationship in relationships {
            if !relationship.active || !relationship.is_is_a() {
                continue;
            }
            // destination_id is the parent, source_id is the child.
            batch.put_cf(
                cf_children,
                pair_key(relationship.destination_id, relationship.source_id),
                [],
            );
            batch.put_cf(
                cf_parents,
                pair_key(relationship.source_id, relationship.destination_id),
                [],
            );
        }
        self.db.write(batch)?;
        Ok(written)
    }

    /// Commits a batch of reference set items and maintains the
    /// `RefsetsByComponent`/`ComponentsByRefset`/`MapTargetIndex` indexes.
    pub fn put_refset_items(&self, items: &[ReferenceSetItem]) -> StoreResult<usize> {
        let written =
            self.put_versioned(CF_REFSET_ITEMS, items, |i| i.id(), |i| i.effective_time())?;

        let cf_by_component = cf(self.db, CF_REFSETS_BY_COMPONENT)?;
        let cf_by_refset = cf(self.db, CF_COMPONENTS_BY_REFSET)?;
        let cf_map_target = cf(self.db, CF_MAP_TARGET_INDEX)?;
        let mut batch = WriteBatch::default();
        for item in items {
            if !item.active() {
                continue;
            }
            batch.put_cf(
                cf_by_component,
                pair_key(item.referenced_component_id(), item.refset_id()),
                [],
            );
            batch.put_cf(
                cf_by_refset,
                triple_key(item.refset_id(), item.referenced_component_id(), item.id()),
                [],
            );
            if let Some(map_target) = map_target_of(item) {
                batch.put_cf(
                    cf_map_target,
                    map_target_key(item.refset_id(), map_target, item.referenced_component_id()),
                    [],
                );
            }
        }
        self.db.write(batch)?;
        Ok(written)
    }

    /// Writes a precomputed token entry. Used by the precomputation pass;
    /// not part of the import pipeline.
    pub(crate) fn put_search_token(&self, token: &str, description_id: SctId) -> StoreResult<()> {
        let cf_handle = cf(self.db, CF_SEARCH_TOKENS)?;
        self.db.put_cf(cf_handle, token_key(token, description_id), [])?;
        Ok(())
    }

    /// Writes a precomputed transitive-closure ancestor entry.
    pub(crate) fn put_ancestor(&self, concept_id: SctId, ancestor_id: SctId) -> StoreResult<()> {
        let cf_handle = cf(self.db, CF_TRANSITIVE_CLOSURE)?;
        self.db.put_cf(cf_handle, pair_key(concept_id, ancestor_id), [])?;
        Ok(())
    }

    /// Writes a single `ChildRelationships` entry. Used by the precomputation
    /// pass that rebuilds this bucket from scratch.
    pub(crate) fn put_child_relationship(&self, parent_id: SctId, child_id: SctId) -> StoreResult<()> {
        let cf_handle = cf(self.db, CF_CHILD_RELATIONSHIPS)?;
        self.db.put_cf(cf_handle, pair_key(parent_id, child_id), [])?;
        Ok(())
    }

    /// Writes a single `ParentRelationshipsByConcept` entry. Used by the
    /// precomputation pass that rebuilds this bucket from scratch.
    pub(crate) fn put_parent_relationship(&self, child_id: SctId, parent_id: SctId) -> StoreResult<()> {
        let cf_handle = cf(self.db, CF_PARENT_RELATIONSHIPS_BY_CONCEPT)?;
        self.db.put_cf(cf_handle, pair_key(child_id, parent_id), [])?;
        Ok(())
    }

    /// Drops every entry in a derived bucket, so a precomputation pass can
    /// rebuild it from scratch rather than leave stale entries mixed with
    /// fresh ones if it fails partway through.
    pub(crate) fn clear_bucket(&self, bucket: &str) -> StoreResult<()> {
        let cf_handle = cf(self.db, bucket)?;
        let mut iter_keys = Vec::new();
        let iter = self.db.iterator_cf(cf_handle, rocksdb::IteratorMode::Start);
        for item in iter {
            let (key, _) = item?;
            iter_keys.push(key);
        }
        let mut batch = WriteBatch::default();
        for key in iter_keys {
            batch.delete_cf(cf_handle, key);
        }
        self.db.write(batch)?;
        Ok(())
    }

    /// Read access from within a writer, for precomputation passes that need
    /// to scan base facts while holding the write lock.
    pub fn view(&self) -> View<'_> {
        View { db: self.db }
    }

    pub(crate) fn db(&self) -> &DB {
        self.db
    }

    fn put_versioned<T, F, G>(
        &self,
        bucket: &str,
        records: &[T],
        id_of: F,
        effective_time_of: G,
    ) -> StoreResult<usize>
    where
        T: serde::Serialize,
        F: Fn(&T) -> SctId,
        G: Fn(&T) -> u32,
    {
        let cf_handle = cf(self.db, bucket)?;
        let mut batch = WriteBatch::default();
        let mut written = 0usize;
        for record in records {
            let id = id_of(record);
            let key = sctid_key(id);
            let keep = match self.db.get_cf(cf_handle, key)? {
                Some(existing) => {
                    let existing: T = bincode::deserialize(&existing)?;
                    effective_time_of(record) >= effective_time_of(&existing)
                }
                None => true,
            };
            if keep {
                batch.put_cf(cf_handle, key, bincode::serialize(record)?);
                written += 1;
            }
        }
        self.db.write(batch)?;
        Ok(written)
    }
}

fn map_target_of(item: &ReferenceSetItem) -> Option<&str> {
    match item {
        ReferenceSetItem::SimpleMap(m) => Some(&m.map_target),
        ReferenceSetItem::ComplexMap(m) => Some(&m.map_target),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snomed_types::{CharacteristicType, DefinitionStatus, DescriptionType, ModifierType};
    use tempfile::tempdir;

    fn concept(id: SctId, effective_time: u32) -> Rf2Concept {
        Rf2Concept {
            id,
            effective_time,
            active: true,
            module_id: 900000000000207008,
            definition_status_id: DefinitionStatus::PRIMITIVE_ID,
        }
    }

    #[test]
    fn put_and_get_concept_round_trips() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let update = store.update();
        update.put_concepts(&[concept(404684003, 20020131)]).unwrap();
        drop(update);

        let view = store.view();
        let found = view.get_concept(404684003).unwrap().unwrap();
        assert_eq!(found.id, 404684003);
    }

    #[test]
    fn newer_effective_time_overwrites_older() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let update = store.update();
        update.put_concepts(&[concept(404684003, 20020131)]).unwrap();
        drop(update);

        let update = store.update();
        let mut newer = concept(404684003, 20210731);
        newer.active = false;
        update.put_concepts(&[newer]).unwrap();
        drop(update);

        let view = store.view();
        let found = view.get_concept(404684003).unwrap().unwrap();
        assert_eq!(found.effective_time, 20210731);
        assert!(!found.active);
    }

    #[test]
    fn older_effective_time_is_ignored() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();

        let update = store.update();
        update.put_concepts(&[concept(404684003, 20210731)]).unwrap();
        drop(update);

        let update = store.update();
        update.put_concepts(&[concept(404684003, 20020131)]).unwrap();
        drop(update);

        let view = store.view();
        let found = view.get_concept(404684003).unwrap().unwrap();
        assert_eq!(found.effective_time, 20210731);
    }

    #[test]
    fn is_a_relationship_populates_child_and_parent_indexes() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let update = store.update();

        let rel = Rf2Relationship {
            id: 100000028,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            source_id: 73211009,
            destination_id: 362969004,
            relationship_group: 0,
            type_id: snomed_types::well_known::IS_A,
            characteristic_type_id: CharacteristicType::INFERRED_ID,
            modifier_id: ModifierType::EXISTENTIAL_ID,
        };
        update.put_relationships(&[rel]).unwrap();
        drop(update);

        let view = store.view();
        assert_eq!(view.children_of(362969004).unwrap(), vec![73211009]);
        assert_eq!(view.parents_of(73211009).unwrap(), vec![362969004]);
    }

    #[test]
    fn non_is_a_relationship_is_not_indexed() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let update = store.update();

        let rel = Rf2Relationship {
            id: 100000029,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            source_id: 73211009,
            destination_id: 363698007,
            relationship_group: 1,
            type_id: snomed_types::well_known::FINDING_SITE,
            characteristic_type_id: CharacteristicType::INFERRED_ID,
            modifier_id: ModifierType::EXISTENTIAL_ID,
        };
        update.put_relationships(&[rel]).unwrap();
        drop(update);

        let view = store.view();
        assert!(view.children_of(363698007).unwrap().is_empty());
    }

    #[test]
    fn description_is_indexed_by_concept() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let update = store.update();

        let description = Rf2Description {
            id: 754786011,
            effective_time: 20020131,
            active: true,
            module_id: 900000000000207008,
            concept_id: 73211009,
            language_code: "en".to_string(),
            type_id: DescriptionType::FSN_ID,
            term: "Diabetes mellitus (disorder)".to_string(),
            case_significance_id: 900000000000448009,
        };
        update.put_descriptions(&[description]).unwrap();
        drop(update);

        let view = store.view();
        let found = view.descriptions_of(73211009).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 754786011);
    }
}
