//! In-memory portal used by unit tests.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use common::{
    cart_object::{SavedCart, UserRef},
    facet::{FacetField, FacetTerm},
    search_result::RawFacet,
};
use serde_json::{Value, json};
use tokio::sync::oneshot;

use crate::portal_utils::{BatchDownloadRequest, CartPersistence, RawDownload, SearchBackend, SearchRequest};

const FORMATS: [&str; 4] = ["bam", "bed", "fastq", "bigWig"];
const OUTPUT_TYPES: [&str; 3] = ["alignments", "peaks", "reads"];
const OUTPUT_CATEGORIES: [&str; 2] = ["raw data", "processed data"];
const ASSEMBLIES: [&str; 2] = ["GRCh38", "mm10"];

pub fn dataset_ids(n: usize) -> Vec<String> {
    (0..n).map(dataset_id).collect()
}

pub fn dataset_id(i: usize) -> String {
    format!("/experiments/ENCSR{i:05}/")
}

pub fn raw_facet(field: &str, total: u64, terms: &[(&str, u64)]) -> RawFacet {
    RawFacet {
        field: field.to_string(),
        total,
        terms: terms.iter().map(|(k, c)| FacetTerm::new(*k, *c)).collect(),
    }
}

#[derive(Debug, Clone)]
pub struct FakeFile {
    pub id: String,
    pub file_format: String,
    pub output_type: String,
    pub output_category: String,
    pub assembly: String,
    pub restricted: bool,
}

impl FakeFile {
    fn attribute(&self, field: FacetField) -> &str {
        match field {
            FacetField::FileFormat => &self.file_format,
            FacetField::OutputType => &self.output_type,
            FacetField::OutputCategory => &self.output_category,
            FacetField::Assembly => &self.assembly,
        }
    }

    fn to_json(&self) -> Value {
        json!({
            "@id": self.id,
            "file_format": self.file_format,
            "output_type": self.output_type,
            "output_category": self.output_category,
            "assembly": self.assembly,
            "restricted": self.restricted,
        })
    }
}

/// Scripted stand-in for the portal. Each dataset owns two files whose
/// attributes cycle through small fixed vocabularies.
#[derive(Default)]
pub struct FakePortal {
    datasets: BTreeMap<String, Vec<FakeFile>>,
    search_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
    fail_search_call: Mutex<Option<usize>>,
    paused_search_calls: Mutex<HashMap<usize, oneshot::Receiver<()>>>,
    pub search_requests: Mutex<Vec<SearchRequest>>,
    pub download_requests: Mutex<Vec<BatchDownloadRequest>>,
    download_response: Mutex<Option<(Option<String>, Vec<u8>)>>,
    saved_cart: Mutex<Option<SavedCart>>,
    pub saved_elements: Mutex<Vec<Vec<String>>>,
    fail_saves: Mutex<bool>,
}

impl FakePortal {
    pub fn with_datasets(n: usize) -> Self {
        let mut datasets = BTreeMap::new();
        for i in 0..n {
            let files = (0..2)
                .map(|j| {
                    let k = i * 2 + j;
                    FakeFile {
                        id: format!("/files/ENCFF{i:05}{}/", if j == 0 { "A" } else { "B" }),
                        file_format: FORMATS[k % FORMATS.len()].to_string(),
                        output_type: OUTPUT_TYPES[k % OUTPUT_TYPES.len()].to_string(),
                        output_category: OUTPUT_CATEGORIES[(k / 3) % OUTPUT_CATEGORIES.len()].to_string(),
                        assembly: ASSEMBLIES[i % ASSEMBLIES.len()].to_string(),
                        restricted: i % 7 == 6 && j == 1,
                    }
                })
                .collect();
            datasets.insert(dataset_id(i), files);
        }
        Self {
            datasets,
            download_response: Mutex::new(Some((Some("attachment; filename=\"cart_files.txt\"".to_string()), b"https://portal/files/ENCFF00000A/\n".to_vec()))),
            ..Default::default()
        }
    }

    pub fn files_of(&self, dataset: &str) -> Vec<FakeFile> {
        self.datasets.get(dataset).cloned().unwrap_or_default()
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    /// Make the nth search call (1-based) fail.
    pub fn fail_search_call(&self, n: usize) {
        *self.fail_search_call.lock().unwrap() = Some(n);
    }

    /// Hold the nth search call (1-based) until the returned sender fires.
    pub fn pause_search_call(&self, n: usize) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.paused_search_calls.lock().unwrap().insert(n, rx);
        tx
    }

    /// `None` makes batch downloads fail with 500.
    pub fn set_download_response(&self, response: Option<(Option<String>, Vec<u8>)>) {
        *self.download_response.lock().unwrap() = response;
    }

    pub fn set_saved_cart(&self, cart: Option<SavedCart>) {
        *self.saved_cart.lock().unwrap() = cart;
    }

    pub fn fail_saves(&self, fail: bool) {
        *self.fail_saves.lock().unwrap() = fail;
    }

    fn facet_search(&self, request: &SearchRequest) -> Value {
        let body = request.body.clone().unwrap_or_default();
        let wanted: Vec<String> = body["dataset"]
            .as_array()
            .map(|ids| ids.iter().filter_map(|id| id.as_str().map(|s| s.to_string())).collect())
            .unwrap_or_default();
        let files: Vec<&FakeFile> = wanted.iter().filter_map(|id| self.datasets.get(id)).flatten().collect();

        let mut filters: BTreeMap<FacetField, HashSet<String>> = BTreeMap::new();
        for (key, value) in &request.params.0 {
            if let Ok(field) = key.parse::<FacetField>() {
                filters.entry(field).or_default().insert(value.clone());
            }
        }
        let matches = |file: &FakeFile, skip: Option<FacetField>| {
            filters.iter().all(|(field, terms)| Some(*field) == skip || terms.contains(file.attribute(*field)))
        };

        let total = files.iter().filter(|file| matches(**file, None)).count();
        let mut facets = Vec::new();
        for facet_name in request.params.get_all("facet") {
            let Ok(field) = facet_name.parse::<FacetField>() else {
                continue;
            };
            let mut terms: Vec<(String, u64)> = Vec::new();
            let mut facet_total = 0;
            for file in files.iter().filter(|file| matches(**file, Some(field))) {
                facet_total += 1;
                let key = file.attribute(field);
                match terms.iter_mut().find(|(k, _)| k == key) {
                    Some((_, count)) => *count += 1,
                    None => terms.push((key.to_string(), 1)),
                }
            }
            facets.push(json!({
                "field": field.as_str(),
                "total": facet_total,
                "terms": terms.iter().map(|(key, doc_count)| json!({"key": key, "doc_count": doc_count})).collect::<Vec<_>>(),
            }));
        }
        // a facet the cart view does not know about
        facets.push(json!({"field": "lab.title", "total": total, "terms": [{"key": "Some Lab", "doc_count": total}]}));
        json!({ "@graph": [], "total": total, "facets": facets })
    }

    fn object_search(&self, request: &SearchRequest) -> Value {
        let ids = request.params.get_all("@id");
        let graph: Vec<Value> = if ids.is_empty() {
            self.datasets.keys().map(|id| json!({ "@id": id })).collect()
        } else {
            ids.iter()
                .filter_map(|id| {
                    self.datasets.get(*id).map(|files| {
                        json!({ "@id": id, "files": files.iter().map(|f| f.id.clone()).collect::<Vec<_>>() })
                    })
                })
                .collect()
        };
        json!({ "@id": format!("/search/?{}", request.params.to_query_string()), "@graph": graph, "total": graph.len() })
    }
}

impl SearchBackend for FakePortal {
    async fn search(&self, request: SearchRequest) -> anyhow::Result<Value> {
        let call = self.search_calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.search_requests.lock().unwrap().push(request.clone());
        let paused = self.paused_search_calls.lock().unwrap().remove(&call);
        if let Some(rx) = paused {
            let _ = rx.await;
        }
        let fail = *self.fail_search_call.lock().unwrap() == Some(call);
        if fail {
            anyhow::bail!("Error: 500 Internal Server Error: search call {call} failed");
        }
        if request.body.as_ref().is_some_and(|body| body.get("dataset").is_some()) {
            Ok(self.facet_search(&request))
        } else {
            Ok(self.object_search(&request))
        }
    }

    async fn request_objects(&self, ids: &[String], _base_query: &str) -> anyhow::Result<Vec<Value>> {
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        let by_id: HashMap<&str, &FakeFile> = self.datasets.values().flatten().map(|f| (f.id.as_str(), f)).collect();
        Ok(ids.iter().filter_map(|id| by_id.get(id.as_str()).map(|f| f.to_json())).collect())
    }

    async fn batch_download(&self, request: BatchDownloadRequest) -> anyhow::Result<RawDownload> {
        self.download_requests.lock().unwrap().push(request);
        let response = self.download_response.lock().unwrap().clone();
        let Some((content_disposition, body)) = response else {
            anyhow::bail!("Batch download failed: Internal Server Error");
        };
        let chunks: Vec<anyhow::Result<bytes::Bytes>> = body.chunks(8).map(|c| Ok(bytes::Bytes::copy_from_slice(c))).collect();
        Ok(RawDownload { content_disposition, content: Box::pin(futures::stream::iter(chunks)) })
    }
}

impl CartPersistence for FakePortal {
    async fn load_saved_cart(&self, _user: &UserRef) -> anyhow::Result<Option<SavedCart>> {
        Ok(self.saved_cart.lock().unwrap().clone())
    }

    async fn save_cart(&self, user: &UserRef, elements: &[String]) -> anyhow::Result<SavedCart> {
        if *self.fail_saves.lock().unwrap() {
            anyhow::bail!("Error: 403 Forbidden: cannot save cart for {}", user.uuid);
        }
        self.saved_elements.lock().unwrap().push(elements.to_vec());
        let cart = SavedCart {
            id: format!("/carts/{}-cart/", user.uuid),
            uuid: format!("{}-cart", user.uuid),
            name: None,
            elements: elements.to_vec(),
        };
        *self.saved_cart.lock().unwrap() = Some(cart.clone());
        Ok(cart)
    }
}
