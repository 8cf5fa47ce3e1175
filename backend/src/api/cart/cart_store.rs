//! Session-wide cart handle and its server-saving wrapper.

use std::sync::Arc;

use common::{
    cart_object::{SavedCart, UserRef},
    cart_state::{CartAction, CartState, reduce},
};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::portal_utils::CartPersistence;


/// Handle to the one active cart of a session. Cloning the handle shares the
/// cart; every write goes through a [`CartAction`].
#[derive(Debug, Clone)]
pub struct CartStore {
    state: Arc<watch::Sender<CartState>>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new(CartState::default())
    }
}

impl CartStore {
    pub fn new(initial: CartState) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state: Arc::new(state) }
    }

    pub fn snapshot(&self) -> CartState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.state.subscribe()
    }

    /// Apply one transition. Subscribers are only woken when the state changed.
    pub fn dispatch(&self, action: CartAction) -> CartState {
        self.state.send_if_modified(|state| {
            let next = reduce(state, action);
            if next == *state {
                return false;
            }
            *state = next;
            true
        });
        self.snapshot()
    }

    pub fn add_one(&self, id: impl Into<String>) -> CartState {
        self.dispatch(CartAction::AddOne(id.into()))
    }

    pub fn add_many(&self, ids: Vec<String>) -> CartState {
        self.dispatch(CartAction::AddMany(ids))
    }

    pub fn remove_one(&self, id: impl Into<String>) -> CartState {
        self.dispatch(CartAction::RemoveOne(id.into()))
    }

    pub fn remove_many(&self, ids: Vec<String>) -> CartState {
        self.dispatch(CartAction::RemoveMany(ids))
    }

    pub fn cache_saved(&self, cart: SavedCart) -> CartState {
        self.dispatch(CartAction::CacheSaved(cart))
    }

    /// Remove every item currently in the cart.
    pub fn clear(&self) -> CartState {
        let items = self.snapshot().items.to_vec();
        self.remove_many(items)
    }

    /// Copy a shared cart's elements into the active cart.
    pub fn merge_shared(&self, shared: &SavedCart) -> CartState {
        self.add_many(shared.elements.clone())
    }
}


/// Wraps store transitions with saving to the user's server-side cart.
pub struct CartSync<P> {
    store: CartStore,
    persistence: P,
    user: UserRef,
}

impl<P: CartPersistence> CartSync<P> {
    pub fn new(store: CartStore, persistence: P, user: UserRef) -> Self {
        Self { store, persistence, user }
    }

    pub fn store(&self) -> &CartStore {
        &self.store
    }

    /// Pull the user's saved cart into the cached copy. The active items are
    /// left alone.
    pub async fn fetch_saved(&self) -> anyhow::Result<Option<SavedCart>> {
        self.store.dispatch(CartAction::SetInProgress(true));
        let result = self.persistence.load_saved_cart(&self.user).await;
        self.store.dispatch(CartAction::SetInProgress(false));
        let saved = result?;
        if let Some(cart) = &saved {
            self.store.cache_saved(cart.clone());
        }
        Ok(saved)
    }

    pub async fn add_and_save(&self, id: impl Into<String>) -> anyhow::Result<SavedCart> {
        self.apply_and_save(CartAction::AddOne(id.into())).await
    }

    pub async fn remove_and_save(&self, id: impl Into<String>) -> anyhow::Result<SavedCart> {
        self.apply_and_save(CartAction::RemoveOne(id.into())).await
    }

    pub async fn save_current(&self) -> anyhow::Result<SavedCart> {
        self.store.dispatch(CartAction::SetInProgress(true));
        self.save().await
    }

    async fn apply_and_save(&self, action: CartAction) -> anyhow::Result<SavedCart> {
        self.store.dispatch(CartAction::SetInProgress(true));
        self.store.dispatch(action);
        self.save().await
    }

    // expects in-progress to be set; always clears it
    async fn save(&self) -> anyhow::Result<SavedCart> {
        let elements = self.store.snapshot().items.to_vec();
        let result = self.persistence.save_cart(&self.user, &elements).await;
        self.store.dispatch(CartAction::SetInProgress(false));
        match result {
            Ok(cart) => {
                info!("Saved cart {} with {} elements", cart.id, cart.elements.len());
                self.store.cache_saved(cart.clone());
                Ok(cart)
            }
            Err(e) => {
                warn!("Saving cart for user {} failed: {:#}", self.user.uuid, e);
                Err(e)
            }
        }
    }
}
