//! In-memory cart storage.
//!
//! `CartStore` keeps one `Cart` per user behind two levels of locking: the
//! outer map lock only guards which users have a cart, every cart carries its
//! own lock for its item list. Creating a cart takes the map lock exclusively
//! for the insert alone, so item-level work on different users never contends.

use ahash::AHashMap as HashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::debug;

/// A single line of a user's cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
}

/// A user's cart. Item ids are unique within `items`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub user_id: String,
    pub items: Vec<CartItem>,
}

impl Cart {
    fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_owned(),
            items: Vec::new(),
        }
    }

    /// Merges `item` into the cart: an existing entry with the same id only
    /// has its quantity increased, anything else is appended.
    fn merge(&mut self, item: CartItem) {
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(item.quantity);
            }
            None => self.items.push(item),
        }
    }

    fn remove(&mut self, item_id: &str) -> Option<CartItem> {
        let pos = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(pos))
    }

    /// Looks up an item by id.
    pub fn item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Sum of all item quantities.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// Errors reported by cart operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    #[error("cart not found for user {user_id}")]
    NotFound { user_id: String },

    #[error("item {item_id} not found in cart for user {user_id}")]
    ItemNotFound { user_id: String, item_id: String },
}

/// Aggregate view over every cart, used for the cart gauges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartTotals {
    /// Sum of quantities over all items in all carts.
    pub total_quantity: u64,
    /// Users with a cart entry, empty carts included.
    pub active_users: usize,
}

type SharedCart = Arc<RwLock<Cart>>;

/// Process-wide cart storage.
#[derive(Default)]
pub struct CartStore {
    carts: RwLock<HashMap<String, SharedCart>>,
}

// Every critical section below is a single in-memory mutation, so a panic
// while holding a guard cannot leave torn data behind.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `item` to the user's cart, creating the cart on first use.
    ///
    /// Callers must pass a non-empty `user_id` and item id.
    pub fn add_item(&self, user_id: &str, item: CartItem) {
        debug_assert!(!user_id.is_empty(), "user id must not be empty");
        debug_assert!(!item.id.is_empty(), "item id must not be empty");

        let cart = self.cart_or_insert(user_id);
        let mut cart = write(&cart);
        debug!(user_id, item_id = %item.id, quantity = item.quantity, "Adding item to cart");
        cart.merge(item);
    }

    /// Returns a copy of the user's cart.
    pub fn get_cart(&self, user_id: &str) -> Result<Cart, CartError> {
        let cart = self.cart(user_id)?;
        let snapshot = read(&cart).clone();
        Ok(snapshot)
    }

    /// Removes an item from the user's cart and returns it.
    pub fn remove_item(&self, user_id: &str, item_id: &str) -> Result<CartItem, CartError> {
        let cart = self.cart(user_id)?;
        let mut cart = write(&cart);
        cart.remove(item_id).ok_or_else(|| CartError::ItemNotFound {
            user_id: user_id.to_owned(),
            item_id: item_id.to_owned(),
        })
    }

    /// Computes the aggregate totals over all carts.
    ///
    /// The map stays read-locked for the whole walk so no cart can appear
    /// halfway through; each cart is read-locked while its items are summed.
    pub fn totals(&self) -> CartTotals {
        let carts = read(&self.carts);
        let total_quantity = carts
            .values()
            .map(|cart| read(cart).total_quantity())
            .sum();

        CartTotals {
            total_quantity,
            active_users: carts.len(),
        }
    }

    fn cart(&self, user_id: &str) -> Result<SharedCart, CartError> {
        read(&self.carts)
            .get(user_id)
            .cloned()
            .ok_or_else(|| CartError::NotFound {
                user_id: user_id.to_owned(),
            })
    }

    fn cart_or_insert(&self, user_id: &str) -> SharedCart {
        if let Some(cart) = read(&self.carts).get(user_id) {
            return Arc::clone(cart);
        }

        let mut carts = write(&self.carts);
        Arc::clone(carts.entry(user_id.to_owned()).or_insert_with(|| {
            debug!(user_id, "Creating cart");
            Arc::new(RwLock::new(Cart::new(user_id)))
        }))
    }
}
