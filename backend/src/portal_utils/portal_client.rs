use anyhow::Context;
use common::{cart_object::{SavedCart, UserRef}, search_query::QueryParams};
use futures::TryStreamExt;
use reqwest::header::{ACCEPT, CONTENT_DISPOSITION};
use serde_json::json;
use tracing::{debug, info};

use crate::{config::PortalConfig, portal_utils::{BatchDownloadRequest, CartPersistence, RawDownload, SearchBackend, SearchRequest}};


#[derive(Debug, Clone)]
pub struct PortalClient {
    client: reqwest::Client,
    base_url: String,
    lookup_chunk_size: usize,
}

impl PortalClient {
    pub fn new(config: &PortalConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.portal_url.trim_end_matches('/').to_string(),
            lookup_chunk_size: config.lookup_chunk_size.max(1),
        }
    }

    fn url(&self, path_and_query: &str) -> String {
        format!("{}{}", self.base_url, path_and_query)
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> anyhow::Result<Option<serde_json::Value>> {
        let response = request.header(ACCEPT, "application/json").send().await?;
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response_txt = response.text().await?;
        if status.is_client_error() || status.is_server_error() {
            anyhow::bail!("Error: {}: {}", status, response_txt);
        }
        debug!("PORTAL RESPONSE: len = {}", response_txt.len());
        let value = serde_json::from_str(&response_txt).context("Portal returned invalid JSON")?;
        Ok(Some(value))
    }
}

impl SearchBackend for PortalClient {
    async fn search(&self, request: SearchRequest) -> anyhow::Result<serde_json::Value> {
        let url = self.url(&format!("/search/?{}", request.params.to_query_string()));
        let builder = match request.body {
            Some(body) => self.client.post(url).json(&body),
            None => self.client.get(url),
        };
        self.send_json(builder).await?.context("Search endpoint not found")
    }

    async fn request_objects(&self, ids: &[String], base_query: &str) -> anyhow::Result<Vec<serde_json::Value>> {
        let mut objects = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(self.lookup_chunk_size) {
            let mut params = QueryParams::new();
            for id in chunk {
                params.push("@id", id.clone());
            }
            let separator = if base_query.contains('?') { "&" } else { "?" };
            let url = self.url(&format!("{base_query}{separator}{}", params.to_query_string()));
            let Some(response) = self.send_json(self.client.get(url)).await? else {
                anyhow::bail!("request_objects: lookup endpoint {base_query} not found");
            };
            if let Some(serde_json::Value::Array(graph)) = response.get("@graph") {
                objects.extend(graph.iter().cloned());
            }
        }
        info!("Resolved {} of {} requested objects", objects.len(), ids.len());
        Ok(objects)
    }

    async fn batch_download(&self, request: BatchDownloadRequest) -> anyhow::Result<RawDownload> {
        let url = self.url(&format!("/batch_download/?{}", request.params.to_query_string()));
        let response = self.client
            .post(url)
            .json(&json!({ "elements": request.elements }))
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Batch download failed: {}", status.canonical_reason().unwrap_or(status.as_str()));
        }
        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());
        let stream = response.bytes_stream().map_err(|x| anyhow::Error::from(x));
        Ok(RawDownload { content_disposition, content: Box::pin(stream) })
    }
}

impl CartPersistence for PortalClient {
    async fn load_saved_cart(&self, user: &UserRef) -> anyhow::Result<Option<SavedCart>> {
        let url = self.url(&format!("/users/{}/carts/", user.uuid));
        match self.send_json(self.client.get(url)).await? {
            Some(value) => Ok(Some(serde_json::from_value(value).context("Malformed saved cart")?)),
            None => Ok(None),
        }
    }

    async fn save_cart(&self, user: &UserRef, elements: &[String]) -> anyhow::Result<SavedCart> {
        let url = self.url(&format!("/users/{}/carts/", user.uuid));
        let builder = self.client.put(url).json(&json!({ "elements": elements }));
        let value = self.send_json(builder).await?.context("Cart endpoint not found")?;
        let cart = serde_json::from_value(value).context("Malformed saved cart")?;
        Ok(cart)
    }
}
