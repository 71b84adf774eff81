//! In-memory backend used by unit and route tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::config::Config;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    Ack, AddressForm, AddressItem, AuthUserItem, CartItem, LoginRequest, MealItem, Order, PaymentRequest,
    PaymentSession, RegisterRequest, Restaurant, RestaurantDetail,
};
use crate::services::FoodApi;
use crate::state::AppState;
use crate::storage::Storage;

pub fn meal(meal_id: &str, title: &str, price: f64) -> MealItem {
    MealItem {
        id: format!("db-{}", meal_id),
        meal_id: meal_id.to_string(),
        restaurant_id: "r1".to_string(),
        category: "Pizza".to_string(),
        image: String::new(),
        title: title.to_string(),
        short_description: String::new(),
        full_description: vec![],
        price,
        is_popular: true,
        restaurant: None,
    }
}

pub fn user() -> AuthUserItem {
    AuthUserItem {
        is_authenticated: true,
        id: "u1".to_string(),
        email: "ana@example.com".to_string(),
        user_name: "ana".to_string(),
        profile_image: String::new(),
    }
}

pub fn address_form() -> AddressForm {
    AddressForm {
        recipient_name: "Ana".to_string(),
        street: "1 Main St".to_string(),
        city: "Mumbai".to_string(),
        state: "MH".to_string(),
        pincode: "400001".to_string(),
        country: None,
    }
}

#[derive(Default)]
struct Backend {
    cart: Vec<(String, u32)>,
    addresses: Vec<AddressItem>,
    next_address: usize,
    logged_in: bool,
    payment_requests: Vec<PaymentRequest>,
}

/// Backend with real cart semantics: decrement at quantity 1 deletes the item.
pub struct FakeFoodApi {
    meals: Vec<MealItem>,
    backend: Mutex<Backend>,
    fail_mutations: Mutex<Option<ApiError>>,
    reply: Mutex<Option<String>>,
    fail_reads: Mutex<Option<ApiError>>,
    pub cart_reads: AtomicUsize,
    pub verify_calls: AtomicUsize,
}

impl FakeFoodApi {
    pub fn new() -> Self {
        Self {
            meals: vec![meal("m1", "Margherita", 299.0), meal("m2", "Garlic Bread", 99.0)],
            backend: Mutex::new(Backend::default()),
            fail_mutations: Mutex::new(None),
            reply: Mutex::new(None),
            fail_reads: Mutex::new(None),
            cart_reads: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
        }
    }

    pub fn logged_in() -> Self {
        let api = Self::new();
        api.lock().logged_in = true;
        api
    }

    pub fn fail_mutations_with(&self, err: ApiError) {
        if let Ok(mut slot) = self.fail_mutations.lock() {
            *slot = Some(err);
        }
    }

    pub fn fail_reads_with(&self, err: ApiError) {
        if let Ok(mut slot) = self.fail_reads.lock() {
            *slot = Some(err);
        }
    }

    /// Every later cart mutation answers with this message.
    pub fn reply_with(&self, message: &str) {
        if let Ok(mut slot) = self.reply.lock() {
            *slot = Some(message.to_string());
        }
    }

    fn cart_ack(&self, message: &str) -> Ack {
        let fixed = self.reply.lock().ok().and_then(|slot| slot.clone());
        ack(fixed.as_deref().unwrap_or(message))
    }

    pub fn quantity(&self, meal_id: &str) -> Option<u32> {
        self.lock().cart.iter().find(|(m, _)| m == meal_id).map(|(_, q)| *q)
    }

    pub fn payment_requests(&self) -> Vec<PaymentRequest> {
        self.lock().payment_requests.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Backend> {
        self.backend.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn guard(&self) -> ApiResult<()> {
        if !self.lock().logged_in {
            return Err(ApiError::Unauthorized("Not logged in".to_string()));
        }
        Ok(())
    }

    fn mutation_guard(&self) -> ApiResult<()> {
        self.guard()?;
        if let Ok(slot) = self.fail_mutations.lock() {
            if let Some(err) = slot.clone() {
                return Err(err);
            }
        }
        Ok(())
    }

    fn find_meal(&self, meal_id: &str) -> ApiResult<MealItem> {
        self.meals.iter().find(|m| m.meal_id == meal_id).cloned().ok_or(ApiError::Backend {
            status: 404,
            message: "Meal not found".to_string(),
            fields: Default::default(),
        })
    }
}

fn ack(message: &str) -> Ack {
    Ack {
        status: "success".to_string(),
        message: message.to_string(),
    }
}

fn missing(message: &str) -> ApiError {
    ApiError::Backend {
        status: 404,
        message: message.to_string(),
        fields: Default::default(),
    }
}

#[async_trait]
impl FoodApi for FakeFoodApi {
    async fn verify_user(&self) -> ApiResult<AuthUserItem> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        self.guard()?;
        Ok(user())
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthUserItem> {
        if request.password != "secret1" {
            return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
        }
        self.lock().logged_in = true;
        Ok(user())
    }

    async fn register(&self, _request: &RegisterRequest) -> ApiResult<Ack> {
        Ok(ack("Registered successfully"))
    }

    async fn logout(&self) -> ApiResult<Ack> {
        self.lock().logged_in = false;
        Ok(ack("Logged out"))
    }

    async fn cart_items(&self) -> ApiResult<Vec<CartItem>> {
        self.cart_reads.fetch_add(1, Ordering::SeqCst);
        self.guard()?;
        if let Some(err) = self.fail_reads.lock().ok().and_then(|slot| slot.clone()) {
            return Err(err);
        }
        let cart = self.lock().cart.clone();
        cart.into_iter()
            .map(|(meal_id, quantity)| {
                Ok(CartItem {
                    id: format!("c-{}", meal_id),
                    meal: self.find_meal(&meal_id)?,
                    meal_id,
                    quantity,
                })
            })
            .collect()
    }

    async fn add_to_cart(&self, meal_id: &str) -> ApiResult<Ack> {
        self.mutation_guard()?;
        self.find_meal(meal_id)?;
        let mut backend = self.lock();
        match backend.cart.iter().position(|(m, _)| m == meal_id) {
            Some(pos) => backend.cart[pos].1 += 1,
            None => backend.cart.push((meal_id.to_string(), 1)),
        }
        Ok(self.cart_ack("Item added to cart"))
    }

    async fn remove_from_cart(&self, meal_id: &str) -> ApiResult<Ack> {
        self.mutation_guard()?;
        let mut backend = self.lock();
        let before = backend.cart.len();
        backend.cart.retain(|(m, _)| m != meal_id);
        if before == backend.cart.len() {
            return Err(missing("Item not in cart"));
        }
        Ok(self.cart_ack("Item removed from cart"))
    }

    async fn increment(&self, meal_id: &str) -> ApiResult<Ack> {
        self.mutation_guard()?;
        let mut backend = self.lock();
        match backend.cart.iter_mut().find(|(m, _)| m == meal_id) {
            Some((_, q)) => *q += 1,
            None => return Err(missing("Item not in cart")),
        }
        Ok(self.cart_ack("Quantity increased"))
    }

    async fn decrement(&self, meal_id: &str) -> ApiResult<Ack> {
        self.mutation_guard()?;
        let mut backend = self.lock();
        let Some(pos) = backend.cart.iter().position(|(m, _)| m == meal_id) else {
            return Err(missing("Item not in cart"));
        };
        if backend.cart[pos].1 <= 1 {
            backend.cart.remove(pos);
            return Ok(self.cart_ack("Item removed from cart"));
        }
        backend.cart[pos].1 -= 1;
        Ok(self.cart_ack("Quantity decreased"))
    }

    async fn clear_cart(&self) -> ApiResult<Ack> {
        self.mutation_guard()?;
        self.lock().cart.clear();
        Ok(self.cart_ack("Cart cleared"))
    }

    async fn addresses(&self) -> ApiResult<Vec<AddressItem>> {
        self.guard()?;
        Ok(self.lock().addresses.clone())
    }

    async fn add_address(&self, form: &AddressForm) -> ApiResult<AddressItem> {
        self.guard()?;
        let mut backend = self.lock();
        backend.next_address += 1;
        let item = AddressItem {
            id: format!("a{}", backend.next_address),
            recipient_name: form.recipient_name.clone(),
            street: form.street.clone(),
            city: form.city.clone(),
            state: form.state.clone(),
            pincode: form.pincode.clone(),
            country: form.country.clone(),
        };
        backend.addresses.push(item.clone());
        Ok(item)
    }

    async fn update_address(&self, id: &str, form: &AddressForm) -> ApiResult<AddressItem> {
        self.guard()?;
        let mut backend = self.lock();
        let Some(existing) = backend.addresses.iter_mut().find(|a| a.id == id) else {
            return Err(missing("Address not found"));
        };
        existing.recipient_name = form.recipient_name.clone();
        existing.street = form.street.clone();
        existing.city = form.city.clone();
        existing.state = form.state.clone();
        existing.pincode = form.pincode.clone();
        existing.country = form.country.clone();
        Ok(existing.clone())
    }

    async fn delete_address(&self, id: &str) -> ApiResult<Ack> {
        self.guard()?;
        self.lock().addresses.retain(|a| a.id != id);
        Ok(ack("Address deleted"))
    }

    async fn meals(&self) -> ApiResult<Vec<MealItem>> {
        Ok(self.meals.clone())
    }

    async fn meal(&self, meal_id: &str) -> ApiResult<MealItem> {
        self.find_meal(meal_id)
    }

    async fn search_meals(&self, query: &str) -> ApiResult<Vec<MealItem>> {
        let needle = query.to_lowercase();
        Ok(self
            .meals
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn restaurants(&self) -> ApiResult<Vec<Restaurant>> {
        Ok(vec![restaurant()])
    }

    async fn restaurant(&self, id: &str) -> ApiResult<RestaurantDetail> {
        if id != "r1" {
            return Err(missing("Restaurant not found"));
        }
        Ok(RestaurantDetail {
            restaurant: restaurant(),
            meals: self.meals.clone(),
        })
    }

    async fn orders(&self) -> ApiResult<Vec<Order>> {
        self.guard()?;
        Ok(vec![])
    }

    async fn create_payment_session(&self, request: &PaymentRequest) -> ApiResult<PaymentSession> {
        self.guard()?;
        self.lock().payment_requests.push(request.clone());
        Ok(PaymentSession {
            id: "cs_test_1".to_string(),
        })
    }
}

fn restaurant() -> Restaurant {
    Restaurant {
        id: "db-r1".to_string(),
        restaurant_id: "r1".to_string(),
        name: "Slice House".to_string(),
        image: String::new(),
        location: "Bandra".to_string(),
        rating: Some(4.5),
        cuisines: vec!["Italian".to_string()],
    }
}

/// Process-local [`Storage`].
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> ApiResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| ApiError::Storage("memory storage poisoned".to_string()))
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get(&self, key: &str) -> ApiResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> ApiResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// App state over the fake backend and in-memory storage.
pub fn app_state(api: Arc<FakeFoodApi>) -> AppState {
    AppState::new(api, Arc::new(MemoryStorage::new()), Config::default())
}
