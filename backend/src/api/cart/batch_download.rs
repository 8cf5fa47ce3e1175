//! One bulk download covering every file of the cart that passes the
//! current facet selection.

use common::search_query::{FacetFilters, QueryParams, push_facet_filters};
use tracing::{error, info};

use crate::{
    api::cart::cart_contents::all_experiments,
    config::PortalConfig,
    portal_utils::{BatchDownloadRequest, ByteStream, SearchBackend},
};


pub struct DownloadedFile {
    pub filename: String,
    pub content: ByteStream,
}

impl std::fmt::Debug for DownloadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadedFile").field("filename", &self.filename).finish_non_exhaustive()
    }
}

pub fn build_batch_download_request(items: &[String], selected: &FacetFilters) -> BatchDownloadRequest {
    let mut params = QueryParams::new();
    if all_experiments(items) {
        params.push("type", "Experiment");
    }
    push_facet_filters(&mut params, selected, "files.");
    BatchDownloadRequest { params, elements: items.to_vec() }
}

/// Filename suggested by a `Content-Disposition` header, or `default` when the
/// header is missing or names nothing usable.
pub fn content_disposition_filename(header: Option<&str>, default: &str) -> String {
    header
        .and_then(filename_parameter)
        // never let a header pick a directory
        .map(|value| value.rsplit(['/', '\\']).next().unwrap_or("").trim())
        .filter(|value| !value.is_empty())
        .unwrap_or(default)
        .to_string()
}

// Value of the `filename` parameter. A quoted value runs to its closing quote
// and may contain `;`; an unclosed quote yields nothing.
fn filename_parameter(header: &str) -> Option<&str> {
    let mut rest = header;
    while let Some((_, after)) = rest.split_once(';') {
        let after = after.trim_start();
        let (key, value) = after.split_once('=')?;
        if key.contains(';') {
            // a parameter without a value
            rest = after;
            continue;
        }
        let value = value.trim_start();
        let (parsed, remainder) = match value.strip_prefix('"') {
            Some(quoted) => {
                let end = quoted.find('"')?;
                (&quoted[..end], &quoted[end + 1..])
            }
            None => {
                let end = value.find(';').unwrap_or(value.len());
                (value[..end].trim_end(), &value[end..])
            }
        };
        if key.trim().eq_ignore_ascii_case("filename") {
            return Some(parsed);
        }
        rest = remainder;
    }
    None
}

/// Not retried; a failed response comes back as an error carrying its status text.
pub async fn batch_download<B: SearchBackend>(
    backend: &B,
    config: &PortalConfig,
    items: &[String],
    selected: &FacetFilters,
) -> anyhow::Result<DownloadedFile> {
    let request = build_batch_download_request(items, selected);
    info!("Batch download for {} cart items: {}", items.len(), request.params.to_query_string());
    let response = backend.batch_download(request).await?;
    let filename = content_disposition_filename(response.content_disposition.as_deref(), &config.download_filename);
    Ok(DownloadedFile { filename, content: response.content })
}

/// What the download control calls: failures are logged, not propagated.
pub async fn batch_download_logged<B: SearchBackend>(
    backend: &B,
    config: &PortalConfig,
    items: &[String],
    selected: &FacetFilters,
) -> Option<DownloadedFile> {
    match batch_download(backend, config, items, selected).await {
        Ok(file) => Some(file),
        Err(e) => {
            error!("batch_download: request failed: {:#}", e);
            None
        }
    }
}
