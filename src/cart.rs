//! The current user's cart: one cached read plus mutations that invalidate it.
//!
//! Nothing is applied locally before the backend answers. Every successful
//! mutation invalidates `(cart, userId)` so the next read shows the
//! backend's state; a confirmed clear stores the empty cart directly. Every
//! mutation pushes exactly one notification built from its own response.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};
use crate::models::{Ack, CartItem};
use crate::notify::{Notification, Notifier};
use crate::query::{QueryClient, QueryKey};
use crate::services::FoodApi;
use crate::session::SessionStore;

pub const CART: &str = "cart";

pub fn cart_key(user_id: &str) -> QueryKey {
    QueryKey::new(CART, [user_id])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartAction {
    Add,
    Remove,
    Increment,
    Decrement,
    Clear,
}

impl CartAction {
    fn default_message(self) -> &'static str {
        match self {
            CartAction::Add => "Item added to cart",
            CartAction::Remove => "Item removed from cart",
            CartAction::Increment => "Quantity increased",
            CartAction::Decrement => "Quantity decreased",
            CartAction::Clear => "Cart cleared",
        }
    }
}

#[derive(Clone)]
pub struct CartHook {
    api: Arc<dyn FoodApi>,
    queries: QueryClient,
    notifier: Notifier,
    session: SessionStore,
    stale_time: Duration,
}

impl CartHook {
    pub fn new(
        api: Arc<dyn FoodApi>,
        queries: QueryClient,
        notifier: Notifier,
        session: SessionStore,
        stale_time: Duration,
    ) -> Self {
        Self {
            api,
            queries,
            notifier,
            session,
            stale_time,
        }
    }

    fn key(&self) -> Option<QueryKey> {
        self.session.user_id().map(|id| cart_key(&id))
    }

    /// Reads the cart through the cache. Without a logged-in user the cart is
    /// empty and nothing is requested.
    pub async fn load(&self) -> ApiResult<Vec<CartItem>> {
        let Some(key) = self.key() else {
            return Ok(Vec::new());
        };
        let api = self.api.clone();
        self.queries
            .fetch(&key, self.stale_time, move || async move { api.cart_items().await })
            .await
    }

    pub fn cached(&self) -> Vec<CartItem> {
        self.key()
            .and_then(|key| self.queries.get_cached::<Vec<CartItem>>(&key))
            .unwrap_or_default()
    }

    pub fn quantity_of(&self, meal_id: &str) -> u32 {
        self.cached()
            .iter()
            .find(|item| item.meal_id == meal_id)
            .map(|item| item.quantity)
            .unwrap_or(0)
    }

    pub async fn add(&self, meal_id: &str) -> ApiResult<Notification> {
        self.mutate(CartAction::Add, meal_id).await
    }

    pub async fn remove(&self, meal_id: &str) -> ApiResult<Notification> {
        self.mutate(CartAction::Remove, meal_id).await
    }

    pub async fn increment(&self, meal_id: &str) -> ApiResult<Notification> {
        self.mutate(CartAction::Increment, meal_id).await
    }

    /// At quantity 1 the backend deletes the item, so the notification says
    /// "removed" rather than "decreased".
    pub async fn decrement(&self, meal_id: &str) -> ApiResult<Notification> {
        self.mutate(CartAction::Decrement, meal_id).await
    }

    pub async fn clear(&self) -> ApiResult<Notification> {
        self.mutate(CartAction::Clear, "").await
    }

    async fn mutate(&self, action: CartAction, meal_id: &str) -> ApiResult<Notification> {
        let Some(key) = self.key() else {
            let err = ApiError::Unauthorized("cart mutation without identity".to_string());
            self.notifier.api_error(&err);
            return Err(err);
        };

        // read before the round trip; the cache may be refreshed meanwhile
        let previous = if action == CartAction::Decrement {
            // a missing or invalidated cart is read from the backend first
            match self.load().await {
                Ok(items) => items
                    .iter()
                    .find(|item| item.meal_id == meal_id)
                    .map(|item| item.quantity)
                    .unwrap_or(0),
                Err(err) => {
                    debug!(meal_id, "cart read before decrement failed: {}", err);
                    self.quantity_of(meal_id)
                }
            }
        } else {
            self.quantity_of(meal_id)
        };

        let result: ApiResult<Ack> = match action {
            CartAction::Add => self.api.add_to_cart(meal_id).await,
            CartAction::Remove => self.api.remove_from_cart(meal_id).await,
            CartAction::Increment => self.api.increment(meal_id).await,
            CartAction::Decrement => self.api.decrement(meal_id).await,
            CartAction::Clear => self.api.clear_cart().await,
        };

        match result {
            Ok(ack) => {
                if action == CartAction::Clear {
                    self.queries.set(&key, Vec::<CartItem>::new());
                } else {
                    self.queries.invalidate(&key);
                }
                let message = success_message(action, previous, &ack);
                info!(?action, meal_id, previous, "cart mutation applied");
                Ok(self.notifier.success(message))
            }
            Err(err) => {
                debug!(?action, meal_id, "cart mutation failed: {}", err);
                self.notifier.api_error(&err);
                Err(err)
            }
        }
    }
}

fn success_message(action: CartAction, previous: u32, ack: &Ack) -> String {
    if action == CartAction::Decrement && previous == 1 {
        return CartAction::Remove.default_message().to_string();
    }
    if ack.message.trim().is_empty() {
        action.default_message().to_string()
    } else {
        ack.message.clone()
    }
}
