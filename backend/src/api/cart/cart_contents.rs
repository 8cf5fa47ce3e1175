//! Datasets and files behind the ids in a cart.

use std::{collections::{BTreeMap, BTreeSet, HashSet}, sync::LazyLock};

use common::{
    facet::FileFormatCount,
    search_query::QueryParams,
    search_result::{DatasetObject, FileObject},
};
use regex::Regex;
use tracing::info;

use crate::portal_utils::{SearchBackend, SearchRequest, search_typed};

/// Datasets shown per page of the cart view.
pub const PAGE_DATASET_COUNT: usize = 25;
/// Files shown per page of the cart view.
pub const PAGE_FILE_COUNT: usize = 25;

pub const FILE_LOOKUP_QUERY: &str = "/search/?type=File&limit=all";

static EXPERIMENT_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/experiments/.*?/$").expect("experiment path pattern is valid")
});

pub fn is_experiment_path(id: &str) -> bool {
    EXPERIMENT_PATH.is_match(id)
}

/// True when the cart is non-empty and holds nothing but experiments.
pub fn all_experiments<S: AsRef<str>>(items: &[S]) -> bool {
    !items.is_empty() && items.iter().all(|item| is_experiment_path(item.as_ref()))
}

/// Search parameters listing every cart item, typed as experiments only when
/// every item is one.
pub fn cart_lookup_query<S: AsRef<str>>(items: &[S]) -> QueryParams {
    let mut params = QueryParams::new();
    if all_experiments(items) {
        params.push("type", "Experiment");
    }
    for item in items {
        params.push("@id", item.as_ref());
    }
    params.push("limit", "all");
    params
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartContents {
    pub datasets: Vec<DatasetObject>,
    /// Every viewable file of every dataset, unfiltered.
    pub files: Vec<FileObject>,
}

impl CartContents {
    /// Files whose format is one of `selected_formats`; all files when none are selected.
    pub fn filtered_files(&self, selected_formats: &BTreeSet<String>) -> Vec<&FileObject> {
        self.files
            .iter()
            .filter(|file| selected_formats.is_empty() || selected_formats.contains(&file.file_format))
            .collect()
    }

    pub fn file_format_counts(&self) -> Vec<FileFormatCount> {
        file_format_counts(&self.files)
    }

    pub fn missing_items(&self, shared_items: &[String]) -> Vec<String> {
        missing_items(shared_items, &self.datasets)
    }
}

pub async fn retrieve_cart_contents<B: SearchBackend>(backend: &B, items: &[String]) -> anyhow::Result<CartContents> {
    if items.is_empty() {
        return Ok(CartContents::default());
    }

    let request = SearchRequest::get(cart_lookup_query(items));
    let datasets = search_typed::<DatasetObject, B>(backend, request).await?.graph;

    let file_ids: Vec<String> = datasets
        .iter()
        .flat_map(|dataset| dataset.files.iter().map(|file| file.id.clone()))
        .collect();
    let mut files = Vec::new();
    if !file_ids.is_empty() {
        let objects = backend.request_objects(&file_ids, FILE_LOOKUP_QUERY).await?;
        for object in objects {
            let file: FileObject = serde_json::from_value(object)?;
            if !file.restricted {
                files.push(file);
            }
        }
    }
    info!("Cart contents: {} datasets, {} files", datasets.len(), files.len());
    Ok(CartContents { datasets, files })
}

/// Count files per format, most common first, ties ordered by
/// case-insensitive format name.
pub fn file_format_counts(files: &[FileObject]) -> Vec<FileFormatCount> {
    let mut by_format: BTreeMap<&str, u64> = BTreeMap::new();
    for file in files {
        *by_format.entry(file.file_format.as_str()).or_default() += 1;
    }
    let mut counts: Vec<FileFormatCount> = by_format
        .into_iter()
        .map(|(format, count)| FileFormatCount { format: format.to_string(), count })
        .collect();
    counts.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.format.to_lowercase().cmp(&b.format.to_lowercase()))
    });
    counts
}

/// Shared-cart items the search did not return, i.e. not viewable by the
/// current user.
pub fn missing_items(shared_items: &[String], datasets: &[DatasetObject]) -> Vec<String> {
    let found: HashSet<&str> = datasets.iter().map(|dataset| dataset.id.as_str()).collect();
    shared_items.iter().filter(|item| !found.contains(item.as_str())).cloned().collect()
}

pub fn page_count(len: usize, per_page: usize) -> usize {
    len.div_ceil(per_page.max(1))
}

/// Zero-based page of `items`; past the end yields an empty slice.
pub fn page_slice<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let per_page = per_page.max(1);
    let start = page.saturating_mul(per_page).min(items.len());
    let end = start.saturating_add(per_page).min(items.len());
    &items[start..end]
}
