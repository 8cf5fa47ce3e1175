//! Environment-driven settings for talking to the portal.

use std::{fmt::Display, str::FromStr};

use tracing::{info, warn};

use common::facet::FacetField;

pub const DEFAULT_PORTAL_URL: &str = "http://127.0.0.1:6543";
pub const DEFAULT_FACET_BATCH_SIZE: usize = 2000;
pub const DEFAULT_LOOKUP_CHUNK_SIZE: usize = 100;
pub const DEFAULT_DOWNLOAD_FILENAME: &str = "files.txt";

#[derive(Debug, Clone, PartialEq)]
pub struct PortalConfig {
    pub portal_url: String,
    /// Dataset ids per facet search request.
    pub facet_batch_size: usize,
    /// Ids per batch-lookup request.
    pub lookup_chunk_size: usize,
    /// Used when a download response names no file.
    pub download_filename: String,
    pub facet_fields: Vec<FacetField>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            portal_url: DEFAULT_PORTAL_URL.to_string(),
            facet_batch_size: DEFAULT_FACET_BATCH_SIZE,
            lookup_chunk_size: DEFAULT_LOOKUP_CHUNK_SIZE,
            download_filename: DEFAULT_DOWNLOAD_FILENAME.to_string(),
            facet_fields: FacetField::ALL.to_vec(),
        }
    }
}

impl PortalConfig {
    pub fn load() -> Self {
        Self {
            portal_url: load_or("PORTAL_URL", DEFAULT_PORTAL_URL.to_string()),
            facet_batch_size: load_positive("CART_FACET_BATCH_SIZE", DEFAULT_FACET_BATCH_SIZE),
            lookup_chunk_size: load_positive("CART_LOOKUP_CHUNK_SIZE", DEFAULT_LOOKUP_CHUNK_SIZE),
            download_filename: load_or("CART_DOWNLOAD_FILENAME", DEFAULT_DOWNLOAD_FILENAME.to_string()),
            facet_fields: FacetField::ALL.to_vec(),
        }
    }
}

fn load_or<T: FromStr + Display>(key: &str, default: T) -> T
where
    T::Err: Display,
{
    parse_or(key, std::env::var(key).ok(), default)
}

fn parse_or<T: FromStr + Display>(key: &str, raw: Option<String>, default: T) -> T
where
    T::Err: Display,
{
    let Some(raw) = raw else {
        info!("{key} not set, using default: {default}");
        return default;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
            default
        }
    }
}

fn load_positive(key: &str, default: usize) -> usize {
    at_least_one(key, load_or(key, default), default)
}

fn at_least_one(key: &str, value: usize, default: usize) -> usize {
    if value == 0 {
        warn!("{key} must be at least 1, using default: {default}");
        return default;
    }
    value
}
