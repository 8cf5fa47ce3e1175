//! Capabilities the cart logic needs from the portal, and the HTTP client
//! that provides them.

use std::pin::Pin;

use common::{cart_object::{SavedCart, UserRef}, search_query::QueryParams, search_result::SearchResults};
use serde::de::DeserializeOwned;

pub mod portal_client;
pub use portal_client::PortalClient;

pub type ByteStream = Pin<Box<dyn futures::Stream<Item = anyhow::Result<bytes::Bytes>> + Send + 'static>>;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchRequest {
    pub params: QueryParams,
    /// Sent as JSON with a POST when present; too many ids do not fit in a URL.
    pub body: Option<serde_json::Value>,
}

impl SearchRequest {
    pub fn get(params: QueryParams) -> Self {
        Self { params, body: None }
    }

    pub fn post(params: QueryParams, body: serde_json::Value) -> Self {
        Self { params, body: Some(body) }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchDownloadRequest {
    pub params: QueryParams,
    pub elements: Vec<String>,
}

pub struct RawDownload {
    pub content_disposition: Option<String>,
    pub content: ByteStream,
}

/// Search, lookup and bulk download against the portal.
pub trait SearchBackend {
    fn search(&self, request: SearchRequest) -> impl Future<Output = anyhow::Result<serde_json::Value>> + Send;

    /// Resolve full objects for `ids`, scoped by `base_query` (a path plus query string).
    fn request_objects(&self, ids: &[String], base_query: &str) -> impl Future<Output = anyhow::Result<Vec<serde_json::Value>>> + Send;

    fn batch_download(&self, request: BatchDownloadRequest) -> impl Future<Output = anyhow::Result<RawDownload>> + Send;
}

/// Per-user saved carts.
pub trait CartPersistence {
    fn load_saved_cart(&self, user: &UserRef) -> impl Future<Output = anyhow::Result<Option<SavedCart>>> + Send;

    fn save_cart(&self, user: &UserRef, elements: &[String]) -> impl Future<Output = anyhow::Result<SavedCart>> + Send;
}

impl<P: CartPersistence + Send + Sync> CartPersistence for std::sync::Arc<P> {
    async fn load_saved_cart(&self, user: &UserRef) -> anyhow::Result<Option<SavedCart>> {
        (**self).load_saved_cart(user).await
    }

    async fn save_cart(&self, user: &UserRef, elements: &[String]) -> anyhow::Result<SavedCart> {
        (**self).save_cart(user, elements).await
    }
}

pub async fn search_typed<T: DeserializeOwned, B: SearchBackend>(backend: &B, request: SearchRequest) -> anyhow::Result<SearchResults<T>> {
    let raw = backend.search(request).await?;
    let results = serde_json::from_value::<SearchResults<T>>(raw)?;
    Ok(results)
}
