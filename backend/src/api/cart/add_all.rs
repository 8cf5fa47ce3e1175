use common::search_query::QueryParams;
use serde::Deserialize;
use tracing::info;

use crate::{
    api::cart::cart_store::CartStore,
    portal_utils::{SearchBackend, SearchRequest, search_typed},
};

#[derive(Debug, Deserialize)]
struct IdOnly {
    #[serde(rename = "@id")]
    id: String,
}

/// Search parameters that list the `@id` of every result matching `filters`.
pub fn add_all_query(filters: &[(String, String)]) -> QueryParams {
    let mut params = QueryParams(filters.to_vec());
    params.push("limit", "all").push("field", "@id");
    params
}

/// Add every result of the search described by `filters` to the cart.
/// Returns how many ids the search produced.
pub async fn add_all_search_results<B: SearchBackend>(
    backend: &B,
    store: &CartStore,
    filters: &[(String, String)],
) -> anyhow::Result<usize> {
    let request = SearchRequest::get(add_all_query(filters));
    let results = search_typed::<IdOnly, B>(backend, request).await?;
    let ids: Vec<String> = results.graph.into_iter().map(|item| item.id).collect();
    if ids.is_empty() {
        return Ok(0);
    }
    info!("Adding {} search results to the cart", ids.len());
    let count = ids.len();
    store.add_many(ids);
    Ok(count)
}
