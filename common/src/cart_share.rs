//! Carts passed around inside a URL.

use std::{fmt, io::Cursor};

use base64::{Engine, engine::general_purpose::URL_SAFE};
use serde::{Deserialize, Serialize};


#[derive(Debug)]
pub enum ShareTokenError {
    Encode(ciborium::ser::Error<std::io::Error>),
    Base64(base64::DecodeError),
    Decode(ciborium::de::Error<std::io::Error>),
}

impl fmt::Display for ShareTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "cannot encode shared cart: {err}"),
            Self::Base64(err) => write!(f, "share token is not url-safe base64: {err}"),
            Self::Decode(err) => write!(f, "share token does not hold a cart: {err}"),
        }
    }
}

impl std::error::Error for ShareTokenError {}


/// Cart contents for someone without an account: only an active cart exists,
/// so the link carries the elements themselves.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SharedCartLink {
    pub name: Option<String>,
    pub elements: Vec<String>,
}

impl SharedCartLink {
    pub fn new(name: Option<String>, elements: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name,
            elements: elements.into_iter().map(|e| e.into()).collect(),
        }
    }

    /// CBOR, then URL-safe base64; fits in a path segment or query value.
    pub fn to_token(&self) -> Result<String, ShareTokenError> {
        let mut cbor = Vec::new();
        ciborium::into_writer(self, &mut cbor).map_err(ShareTokenError::Encode)?;
        Ok(URL_SAFE.encode(cbor))
    }

    pub fn from_token(token: &str) -> Result<Self, ShareTokenError> {
        let cbor = URL_SAFE.decode(token.trim()).map_err(ShareTokenError::Base64)?;
        ciborium::from_reader(Cursor::new(cbor)).map_err(ShareTokenError::Decode)
    }
}
