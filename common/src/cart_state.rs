//! In-memory cart state and the pure transitions that mutate it.
//!
//! The active cart holds both saved and unsaved items. Every change goes
//! through one of the transition functions below; each takes the current
//! state by reference and returns a new state, leaving the input untouched.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::cart_object::SavedCart;


/// Set of cart item identifiers that remembers insertion order.
///
/// Membership is answered by the hash set; the vector only exists so lists
/// render and serialize in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CartItems {
    order: Vec<String>,
    members: HashSet<String>,
}

impl CartItems {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.order.clone()
    }

    fn insert(&mut self, id: &str) -> bool {
        if self.members.contains(id) {
            return false;
        }
        self.members.insert(id.to_string());
        self.order.push(id.to_string());
        true
    }

    fn remove_all(&mut self, doomed: &HashSet<&str>) -> bool {
        let before = self.order.len();
        self.order.retain(|id| !doomed.contains(id.as_str()));
        self.members.retain(|id| !doomed.contains(id.as_str()));
        before != self.order.len()
    }
}

impl From<Vec<String>> for CartItems {
    fn from(ids: Vec<String>) -> Self {
        let mut items = CartItems::new();
        for id in &ids {
            items.insert(id);
        }
        items
    }
}

impl From<CartItems> for Vec<String> {
    fn from(items: CartItems) -> Self {
        items.order
    }
}

impl<S: AsRef<str>> FromIterator<S> for CartItems {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut items = CartItems::new();
        for id in iter {
            items.insert(id.as_ref());
        }
        items
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CartState {
    pub items: CartItems,
    /// Last persisted cart fetched from the server, if any.
    pub saved_cart: Option<SavedCart>,
    /// True while a save or load against the server is running.
    pub in_progress: bool,
}

impl CartState {
    pub fn contains(&self, id: &str) -> bool {
        self.items.contains(id)
    }

    /// True when every given id is already in the cart; an "add all" control
    /// has nothing left to do in that case.
    pub fn contains_all<S: AsRef<str>>(&self, ids: &[S]) -> bool {
        ids.iter().all(|id| self.items.contains(id.as_ref()))
    }

    /// True when the id is part of the cached saved cart.
    pub fn is_saved(&self, id: &str) -> bool {
        self.saved_cart
            .as_ref()
            .map(|cart| cart.elements.iter().any(|element| element == id))
            .unwrap_or(false)
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CartAction {
    AddOne(String),
    AddMany(Vec<String>),
    RemoveOne(String),
    RemoveMany(Vec<String>),
    CacheSaved(SavedCart),
    SetInProgress(bool),
}

pub fn reduce(state: &CartState, action: CartAction) -> CartState {
    match action {
        CartAction::AddOne(id) => add_one(state, &id),
        CartAction::AddMany(ids) => add_many(state, &ids),
        CartAction::RemoveOne(id) => remove_one(state, &id),
        CartAction::RemoveMany(ids) => remove_many(state, &ids),
        CartAction::CacheSaved(cart) => cache_saved(state, cart),
        CartAction::SetInProgress(in_progress) => set_in_progress(state, in_progress),
    }
}

pub fn add_one(state: &CartState, id: &str) -> CartState {
    let mut next = state.clone();
    next.items.insert(id);
    next
}

/// Appends every id not yet in the cart, keeping the existing order and the
/// first occurrence of duplicates inside `ids`.
pub fn add_many<S: AsRef<str>>(state: &CartState, ids: &[S]) -> CartState {
    let mut next = state.clone();
    for id in ids {
        next.items.insert(id.as_ref());
    }
    next
}

pub fn remove_one(state: &CartState, id: &str) -> CartState {
    remove_many(state, &[id])
}

pub fn remove_many<S: AsRef<str>>(state: &CartState, ids: &[S]) -> CartState {
    let doomed: HashSet<&str> = ids.iter().map(|id| id.as_ref()).collect();
    let mut next = state.clone();
    next.items.remove_all(&doomed);
    next
}

pub fn cache_saved(state: &CartState, cart: SavedCart) -> CartState {
    CartState {
        saved_cart: Some(cart),
        ..state.clone()
    }
}

pub fn set_in_progress(state: &CartState, in_progress: bool) -> CartState {
    CartState {
        in_progress,
        ..state.clone()
    }
}
