//! Facet counts over every dataset in a cart.
//!
//! A cart can hold far more dataset ids than one search request safely
//! carries, so the ids are split into fixed-size batches. Batches are searched
//! one after another and each response's facets are folded into a running
//! total. The finished result matches what a single unbatched search would
//! have reported.

use std::collections::{BTreeMap, HashMap};

use common::{
    facet::{FacetField, FacetResult, FacetSet, FacetTerm},
    search_query::{CartFacetQuery, FacetFilters, QueryParams, push_facet_filters},
    search_result::RawFacet,
};
use serde_json::json;
use tracing::{debug, info};

use crate::portal_utils::{SearchBackend, SearchRequest, search_typed};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationProgress {
    /// Share of batches completed, 0 to 100.
    Percent(u8),
    /// Every batch has been folded in; no more progress will be reported.
    Done,
}

impl AggregationProgress {
    pub fn after_batch(completed: usize, total: usize) -> Self {
        if total == 0 {
            return AggregationProgress::Percent(100);
        }
        let percent = (completed as f64 / total as f64 * 100.0).round();
        AggregationProgress::Percent(percent.clamp(0.0, 100.0) as u8)
    }
}

#[derive(Debug, Clone, Default)]
struct FieldAccumulator {
    total: u64,
    terms: Vec<FacetTerm>,
    // key -> position in `terms`
    index: HashMap<String, usize>,
}

impl FieldAccumulator {
    /// First batch for a field: terms are copied as they came. Later batches
    /// add to the first term with a matching key.
    fn seeded(facet: &RawFacet) -> Self {
        let mut index = HashMap::new();
        for (position, term) in facet.terms.iter().enumerate() {
            index.entry(term.key.clone()).or_insert(position);
        }
        FieldAccumulator { total: facet.total, terms: facet.terms.clone(), index }
    }

    fn add_term(&mut self, term: &FacetTerm) {
        match self.index.get(&term.key) {
            Some(&position) => self.terms[position].doc_count += term.doc_count,
            None => {
                self.index.insert(term.key.clone(), self.terms.len());
                self.terms.push(term.clone());
            }
        }
    }
}

/// Running facet totals for one aggregation run.
#[derive(Debug, Clone, Default)]
pub struct FacetAccumulator {
    pub total: u64,
    facets_by_field: BTreeMap<FacetField, FieldAccumulator>,
}

impl FacetAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one batch response in. Facets for fields outside `fields` are ignored.
    pub fn merge(&mut self, batch_total: u64, facets: &[RawFacet], fields: &[FacetField]) {
        self.total += batch_total;
        for facet in facets {
            let Ok(field) = facet.field.parse::<FacetField>() else {
                continue;
            };
            if !fields.contains(&field) {
                continue;
            }
            match self.facets_by_field.get_mut(&field) {
                Some(existing) => {
                    existing.total += facet.total;
                    for term in &facet.terms {
                        existing.add_term(term);
                    }
                }
                None => {
                    self.facets_by_field.insert(field, FieldAccumulator::seeded(facet));
                }
            }
        }
    }

    /// Sort each field's terms by descending count, ties keeping encounter
    /// order, and emit fields in the order given.
    pub fn finalize(self, fields: &[FacetField]) -> FacetSet {
        let mut facets_by_field = self.facets_by_field;
        let mut facets = Vec::new();
        for field in fields {
            let Some(accumulated) = facets_by_field.remove(field) else {
                continue;
            };
            let mut terms = accumulated.terms;
            terms.sort_by(|a, b| b.doc_count.cmp(&a.doc_count));
            facets.push(FacetResult { field: *field, total: accumulated.total, terms });
        }
        FacetSet { total: self.total, facets }
    }
}

/// Contiguous, order-preserving batches of at most `batch_size` ids.
pub fn partition(identifiers: &[String], batch_size: usize) -> Vec<&[String]> {
    identifiers.chunks(batch_size.max(1)).collect()
}

/// Search parameters for one batch: files of the batch's datasets, no result
/// rows, the configured facets, narrowed by the current selection.
pub fn batch_search_request(query: &CartFacetQuery, fields: &[FacetField]) -> SearchRequest {
    let mut params = QueryParams::new();
    params.push("type", "File").push("limit", "0");
    for field in fields {
        params.push("facet", field.as_str());
    }
    push_facet_filters(&mut params, &query.facet_filters, "");
    SearchRequest::post(params, json!({ "dataset": query.identifiers }))
}

pub struct FacetAggregator<'a, B> {
    backend: &'a B,
    fields: Vec<FacetField>,
    batch_size: usize,
}

impl<'a, B: SearchBackend> FacetAggregator<'a, B> {
    pub fn new(backend: &'a B, fields: Vec<FacetField>, batch_size: usize) -> Self {
        Self { backend, fields, batch_size: batch_size.max(1) }
    }

    /// Fails on the first failed batch; nothing partial is returned.
    pub async fn aggregate(
        &self,
        identifiers: &[String],
        selected: &FacetFilters,
        mut on_progress: impl FnMut(AggregationProgress),
    ) -> anyhow::Result<FacetSet> {
        let batches = partition(identifiers, self.batch_size);
        if batches.is_empty() {
            on_progress(AggregationProgress::Done);
            return Ok(FacetSet::empty());
        }

        info!("Aggregating facets for {} datasets in {} batches", identifiers.len(), batches.len());
        let mut accumulator = FacetAccumulator::new();
        for (i, batch) in batches.iter().enumerate() {
            let query = CartFacetQuery {
                identifiers: batch.to_vec(),
                facet_filters: selected.clone(),
            };
            let request = batch_search_request(&query, &self.fields);
            let results = search_typed::<serde_json::Value, B>(self.backend, request).await?;
            debug!("Facet batch {}/{}: total = {}", i + 1, batches.len(), results.total);
            accumulator.merge(results.total, &results.facets, &self.fields);
            on_progress(AggregationProgress::after_batch(i + 1, batches.len()));
        }
        on_progress(AggregationProgress::Done);
        Ok(accumulator.finalize(&self.fields))
    }
}
