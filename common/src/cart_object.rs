//! Server-persisted cart objects.

use serde::{Deserialize, Serialize};


/// A cart as stored in a user's `carts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCart {
    #[serde(rename = "@id")]
    pub id: String,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// The shared cart view calls these `items`.
    #[serde(default, alias = "items")]
    pub elements: Vec<String>,
}

impl SavedCart {
    /// Listing form of the cart, with the element list left out.
    pub fn without_elements(&self) -> SavedCart {
        SavedCart {
            elements: vec![],
            ..self.clone()
        }
    }

    /// Stable path others can open to view this cart.
    pub fn shared_path(&self) -> String {
        format!("/carts/{}/", self.uuid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserRef {
    pub uuid: String,
}

impl UserRef {
    pub fn new(uuid: impl Into<String>) -> Self {
        Self { uuid: uuid.into() }
    }
}
