//! The shopping cart.
//!
//! Carts are process-wide, per-user maps from product id to quantity. They are deliberately not persisted: a restart
//! empties every cart. Product ids are not validated when they are added; that happens at checkout.
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, RwLock},
};

use log::*;
use serde::{Deserialize, Serialize};

use crate::db_types::{ProductId, UserId};

/// The contents of one user's cart. Iteration follows product-id order, and every quantity is at least 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: BTreeMap<ProductId, u32>,
}

impl Cart {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn quantity(&self, product_id: &ProductId) -> u32 {
        self.items.get(product_id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProductId, u32)> {
        self.items.iter().map(|(k, v)| (k, *v))
    }

    /// Adds one unit of the product, returning the new quantity.
    pub fn add(&mut self, product_id: ProductId) -> u32 {
        let qty = self.items.entry(product_id).or_insert(0);
        *qty = qty.saturating_add(1);
        *qty
    }

    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        self.items.remove(product_id).is_some()
    }
}

impl<P: Into<ProductId>> FromIterator<(P, u32)> for Cart {
    fn from_iter<T: IntoIterator<Item = (P, u32)>>(iter: T) -> Self {
        let items = iter.into_iter().filter(|(_, q)| *q > 0).map(|(p, q)| (p.into(), q)).collect();
        Self { items }
    }
}

/// Storage for carts.
pub trait CartStore: Clone + Send + Sync {
    /// A copy of the user's cart. Users without a cart get an empty one.
    fn cart(&self, user_id: UserId) -> Cart;

    /// Adds one unit of the product to the user's cart. Returns the new quantity of that line.
    fn add_item(&self, user_id: UserId, product_id: ProductId) -> u32;

    /// Removes the whole line for the product. Returns `false` if it was not in the cart.
    fn remove_item(&self, user_id: UserId, product_id: &ProductId) -> bool;

    fn clear(&self, user_id: UserId);
}

/// The default, in-memory cart store. Cloning it yields a handle onto the same carts.
#[derive(Debug, Clone, Default)]
pub struct MemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CartStore for MemoryCartStore {
    fn cart(&self, user_id: UserId) -> Cart {
        match self.carts.read() {
            Ok(carts) => carts.get(&user_id).cloned().unwrap_or_default(),
            Err(poisoned) => poisoned.into_inner().get(&user_id).cloned().unwrap_or_default(),
        }
    }

    fn add_item(&self, user_id: UserId, product_id: ProductId) -> u32 {
        let mut carts = self.carts.write().unwrap_or_else(|e| e.into_inner());
        trace!("🛒️ Adding {product_id} to the cart of user {user_id}");
        carts.entry(user_id).or_default().add(product_id)
    }

    fn remove_item(&self, user_id: UserId, product_id: &ProductId) -> bool {
        let mut carts = self.carts.write().unwrap_or_else(|e| e.into_inner());
        let removed = carts.get_mut(&user_id).map(|c| c.remove(product_id)).unwrap_or(false);
        if carts.get(&user_id).is_some_and(Cart::is_empty) {
            carts.remove(&user_id);
        }
        removed
    }

    fn clear(&self, user_id: UserId) {
        let mut carts = self.carts.write().unwrap_or_else(|e| e.into_inner());
        if carts.remove(&user_id).is_some() {
            debug!("🛒️ Cleared the cart of user {user_id}");
        }
    }
}
