//! Filtered search over the precomputed description-token index.

use crate::cancellation::CancellationToken;
use crate::error::{QueryError, QueryResult};
use snomed_store::Store;
use snomed_types::SctId;
use std::collections::{HashMap, HashSet};

/// A filtered search request against the description-token index.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Free-text search terms, tokenized and matched against indexed terms.
    pub terms: String,
    /// Maximum number of description ids to return.
    pub limit: usize,
    /// Restrict results to descriptions in one of these modules.
    pub modules: Vec<SctId>,
    /// Restrict results to concepts with at least one of these direct parents.
    pub direct_parents: Vec<SctId>,
    /// Restrict results to concepts with at least one of these ancestors.
    pub recursive_parents: Vec<SctId>,
    /// Restrict results to active descriptions only.
    pub only_active: bool,
}

/// Executes [`SearchRequest`]s against the precomputed `SearchTokens` index.
pub struct SearchEngine<'a> {
    store: &'a Store,
}

impl<'a> SearchEngine<'a> {
    /// Builds an engine over the given store.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Runs `request`, returning description ids ordered by token-overlap
    /// relevance (most matched tokens first, ties broken by ascending id).
    pub fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> QueryResult<Vec<SctId>> {
        let view = self.store.view();
        let tokens = tokenize(&request.terms);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut overlap: HashMap<SctId, usize> = HashMap::new();
        for token in &tokens {
            if cancel.is_cancelled() {
                return Err(QueryError::Cancelled);
            }
            for description_id in view.search_token(token)? {
                *overlap.entry(description_id).or_insert(0) += 1;
            }
        }

        let mut scored: Vec<(SctId, usize)> = overlap.into_iter().collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let mut out = Vec::new();
        for (description_id, _) in scored {
            if cancel.is_cancelled() {
                return Err(QueryError::Cancelled);
            }
            if out.len() >= request.limit {
                break;
            }

            let Some(description) = view.get_description(description_id)? else {
                continue;
            };
            if request.only_active && !description.active {
                continue;
            }
            if !request.modules.is_empty() && !request.modules.contains(&description.module_id) {
                continue;
            }
            if !request.direct_parents.is_empty() {
                let parents: HashSet<SctId> =
                    view.parents_of(description.concept_id)?.into_iter().collect();
                if !request.direct_parents.iter().any(|p| parents.contains(p)) {
                    continue;
                }
            }
            if !request.recursive_parents.is_empty() {
                let ancestors: HashSet<SctId> =
                    view.ancestors_of(description.concept_id)?.into_iter().collect();
                if !request.recursive_parents.iter().any(|p| ancestors.contains(p)) {
                    continue;
                }
            }

            out.push(description_id);
        }
        Ok(out)
    }
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
    use snomed_types::{DefinitionStatus, DescriptionType, Rf2Concept, Rf2Description};
    use tempfile::tempdir;

    fn description(id: SctId, concept_id: SctId, term: &str, module_id: SctId) -> Rf2Description {
        Rf2Description {
            id,
            effective_time: 20020131,
            active: true,
            module_id,
            concept_id,
            language_code: "en".to_string(),
            type_id: DescriptionType::SYNONYM_ID,
            term: term.to_string(),
            case_significance_id: 900000000000448009,
        }
    }

    #[test]
    fn search_ranks_by_token_overlap_and_filters_by_module() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let update = store.update();

        update
            .put_concepts(&[Rf2Concept {
                id: 73211009,
                effective_time: 20020131,
                active: true,
                module_id: 900000000000207008,
                definition_status_id: DefinitionStatus::PRIMITIVE_ID,
            }])
            .unwrap();

        let exact = description(1, 73211009, "Diabetes mellitus", 900000000000207008);
        let partial = description(2, 73211009, "Diabetes insipidus", 900000000000012004);
        update.put_descriptions(&[exact, partial]).unwrap();
        update
            .rebuild_search_tokens(&snomed_store::precompute::NeverCancel)
            .unwrap();
        drop(update);

        let engine = SearchEngine::new(&store);
        let cancel = CancellationToken::new();
        let request = SearchRequest {
            terms: "diabetes mellitus".to_string(),
            limit: 10,
            ..Default::default()
        };
        let results = engine.search(&request, &cancel).unwrap();
        assert_eq!(results.first(), Some(&1));

        let module_filtered = SearchRequest {
            terms: "diabetes".to_string(),
            limit: 10,
            modules: vec![900000000000012004],
            ..Default::default()
        };
        let results = engine.search(&module_filtered, &cancel).unwrap();
        assert_eq!(results, vec![2]);
    }

    #[test]
    fn search_observes_cancellation() {
        let dir = tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        let engine = SearchEngine::new(&store);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let request = SearchRequest {
            terms: "anything".to_string(),
            limit: 10,
            ..Default::default()
        };
        let err = engine.search(&request, &cancel).unwrap_err();
        assert!(matches!(err, QueryError::Cancelled));
    }
}
