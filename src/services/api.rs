use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{normalize_response, ApiError, ApiResult};
use crate::models::address::{AddressListResponse, AddressResponse};
use crate::models::cart::CartResponse;
use crate::models::meal::{MealListResponse, MealResponse};
use crate::models::order::OrderListResponse;
use crate::models::restaurant::RestaurantListResponse;
use crate::models::user::UserResponse;
use crate::models::{
    Ack, AddressForm, AddressItem, AuthUserItem, CartItem, LoginRequest, MealItem, Order, PaymentRequest,
    PaymentSession, RegisterRequest, Restaurant, RestaurantDetail,
};

/// The remote food-ordering backend as seen by the client.
#[async_trait]
pub trait FoodApi: Send + Sync {
    async fn verify_user(&self) -> ApiResult<AuthUserItem>;
    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthUserItem>;
    async fn register(&self, request: &RegisterRequest) -> ApiResult<Ack>;
    async fn logout(&self) -> ApiResult<Ack>;

    async fn cart_items(&self) -> ApiResult<Vec<CartItem>>;
    async fn add_to_cart(&self, meal_id: &str) -> ApiResult<Ack>;
    async fn remove_from_cart(&self, meal_id: &str) -> ApiResult<Ack>;
    async fn increment(&self, meal_id: &str) -> ApiResult<Ack>;
    async fn decrement(&self, meal_id: &str) -> ApiResult<Ack>;
    async fn clear_cart(&self) -> ApiResult<Ack>;

    async fn addresses(&self) -> ApiResult<Vec<AddressItem>>;
    async fn add_address(&self, form: &AddressForm) -> ApiResult<AddressItem>;
    async fn update_address(&self, id: &str, form: &AddressForm) -> ApiResult<AddressItem>;
    async fn delete_address(&self, id: &str) -> ApiResult<Ack>;

    async fn meals(&self) -> ApiResult<Vec<MealItem>>;
    async fn meal(&self, meal_id: &str) -> ApiResult<MealItem>;
    async fn search_meals(&self, query: &str) -> ApiResult<Vec<MealItem>>;
    async fn restaurants(&self) -> ApiResult<Vec<Restaurant>>;
    async fn restaurant(&self, id: &str) -> ApiResult<RestaurantDetail>;

    async fn orders(&self) -> ApiResult<Vec<Order>>;
    async fn create_payment_session(&self, request: &PaymentRequest) -> ApiResult<PaymentSession>;
}

/// reqwest-backed [`FoodApi`]. The backend's session cookie lives in the
/// client's cookie store.
pub struct HttpFoodApi {
    client: Client,
    base_url: String,
}

impl HttpFoodApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, format!("{}{}", self.base_url, path))
    }

    fn item_request(&self, method: Method, path: &str, id: &str) -> ApiResult<RequestBuilder> {
        let url = item_url(&self.base_url, path, id)?;
        Ok(self.client.request(method, url))
    }

    async fn send<T: DeserializeOwned>(&self, req: RequestBuilder) -> ApiResult<T> {
        let res = match req.send().await {
            Ok(r) => r,
            Err(err) => {
                warn!("Backend request failed to send: {}", err);
                return Err(ApiError::Network(err.to_string()));
            }
        };

        let status = res.status();
        let url = res.url().path().to_string();
        let text = res.text().await.map_err(|e| ApiError::Network(e.to_string()))?;

        if let Some(err) = normalize_response(status, &text) {
            warn!(%url, %status, "backend reported error: {}", err);
            return Err(err);
        }
        debug!(%url, %status, "backend request ok");

        serde_json::from_str(&text).map_err(|e| {
            warn!(%url, "undecodable backend response: {}", e);
            ApiError::Decode(format!("{}: {}", url, e))
        })
    }
}

/// `{base}{path}/{id}` with `id` percent-encoded as a single path segment.
fn item_url(base_url: &str, path: &str, id: &str) -> ApiResult<Url> {
    if id.trim().is_empty() {
        return Err(ApiError::Validation(format!("Missing id for {}", path)));
    }
    let mut url = Url::parse(&format!("{}{}", base_url, path))
        .map_err(|e| ApiError::Network(format!("invalid backend url {}: {}", base_url, e)))?;
    url.path_segments_mut()
        .map_err(|_| ApiError::Network(format!("backend url {} cannot take a path", base_url)))?
        .push(id);
    Ok(url)
}

#[async_trait]
impl FoodApi for HttpFoodApi {
    async fn verify_user(&self) -> ApiResult<AuthUserItem> {
        let body: UserResponse = self.send(self.request(Method::GET, "/api/user/verifyUser")).await?;
        Ok(body.user.into())
    }

    async fn login(&self, request: &LoginRequest) -> ApiResult<AuthUserItem> {
        let body: UserResponse = self
            .send(self.request(Method::POST, "/api/auth/login").json(request))
            .await?;
        Ok(body.user.into())
    }

    async fn register(&self, request: &RegisterRequest) -> ApiResult<Ack> {
        self.send(self.request(Method::POST, "/api/auth/register").json(request)).await
    }

    async fn logout(&self) -> ApiResult<Ack> {
        self.send(self.request(Method::POST, "/api/auth/logout")).await
    }

    async fn cart_items(&self) -> ApiResult<Vec<CartItem>> {
        let body: CartResponse = self.send(self.request(Method::GET, "/api/cart/allCartData")).await?;
        Ok(body.cart_item)
    }

    async fn add_to_cart(&self, meal_id: &str) -> ApiResult<Ack> {
        self.send(self.item_request(Method::POST, "/api/cart/addToCart", meal_id)?).await
    }

    async fn remove_from_cart(&self, meal_id: &str) -> ApiResult<Ack> {
        self.send(self.item_request(Method::DELETE, "/api/cart/removeFromCart", meal_id)?).await
    }

    async fn increment(&self, meal_id: &str) -> ApiResult<Ack> {
        self.send(self.item_request(Method::PATCH, "/api/cart/increment", meal_id)?).await
    }

    async fn decrement(&self, meal_id: &str) -> ApiResult<Ack> {
        self.send(self.item_request(Method::PATCH, "/api/cart/decrement", meal_id)?).await
    }

    async fn clear_cart(&self) -> ApiResult<Ack> {
        self.send(self.request(Method::DELETE, "/api/cart/clearCart")).await
    }

    async fn addresses(&self) -> ApiResult<Vec<AddressItem>> {
        let body: AddressListResponse = self.send(self.request(Method::GET, "/api/user/addresses")).await?;
        Ok(body.addresses)
    }

    async fn add_address(&self, form: &AddressForm) -> ApiResult<AddressItem> {
        let body: AddressResponse = self
            .send(self.request(Method::POST, "/api/user/addAddress").json(form))
            .await?;
        Ok(body.address)
    }

    async fn update_address(&self, id: &str, form: &AddressForm) -> ApiResult<AddressItem> {
        let req = self.item_request(Method::PATCH, "/api/user/updateAddress", id)?.json(form);
        let body: AddressResponse = self.send(req).await?;
        Ok(body.address)
    }

    async fn delete_address(&self, id: &str) -> ApiResult<Ack> {
        self.send(self.item_request(Method::DELETE, "/api/user/deleteAddress", id)?).await
    }

    async fn meals(&self) -> ApiResult<Vec<MealItem>> {
        let body: MealListResponse = self.send(self.request(Method::GET, "/api/meal/allMeals")).await?;
        Ok(body.meals)
    }

    async fn meal(&self, meal_id: &str) -> ApiResult<MealItem> {
        let req = self.item_request(Method::GET, "/api/meal/getMeal", meal_id)?;
        let body: MealResponse = self.send(req).await?;
        Ok(body.meal)
    }

    async fn search_meals(&self, query: &str) -> ApiResult<Vec<MealItem>> {
        let body: MealListResponse = self
            .send(self.request(Method::GET, "/api/meal/search").query(&[("query", query)]))
            .await?;
        Ok(body.meals)
    }

    async fn restaurants(&self) -> ApiResult<Vec<Restaurant>> {
        let body: RestaurantListResponse = self
            .send(self.request(Method::GET, "/api/restaurant/allRestaurants"))
            .await?;
        Ok(body.restaurants)
    }

    async fn restaurant(&self, id: &str) -> ApiResult<RestaurantDetail> {
        self.send(self.item_request(Method::GET, "/api/restaurant/getRestaurant", id)?).await
    }

    async fn orders(&self) -> ApiResult<Vec<Order>> {
        let body: OrderListResponse = self.send(self.request(Method::GET, "/api/order/allOrders")).await?;
        Ok(body.orders)
    }

    async fn create_payment_session(&self, request: &PaymentRequest) -> ApiResult<PaymentSession> {
        self.send(self.request(Method::POST, "/api/payment/createCheckoutSession").json(request))
            .await
    }
}
