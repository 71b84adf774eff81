//! Checkout summary and payment hand-off.
//!
//! The total computed here is for display. The amount actually charged comes
//! from the payment session the backend creates, and the promotional
//! discount is never sent to it, so the two can disagree.

use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::models::cart::{item_count, subtotal};
use crate::models::order::PaymentLine;
use crate::models::{CartItem, PaymentRequest};
use crate::services::{FoodApi, PaymentRedirect};

pub const PROMO_CODE: &str = "FIRST50";
pub const PROMO_DISCOUNT: f64 = 50.0;
pub const PROMO_MIN_SUBTOTAL: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CouponError {
    #[error("Enter a coupon code")]
    Empty,

    #[error("A coupon is already applied")]
    AlreadyApplied,

    #[error("Coupon code {0} is not valid")]
    Invalid(String),

    #[error("Add items worth at least {0} to use this coupon")]
    BelowMinimum(f64),
}

impl From<CouponError> for ApiError {
    fn from(err: CouponError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub subtotal: f64,
    pub discount: f64,
    pub delivery_charges: f64,
    pub total: f64,
    pub item_count: u32,
}

/// What the user has entered on the checkout page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub coupon: Option<String>,
    pub selected_address: Option<String>,
}

impl CheckoutForm {
    /// Applies the promotional code. Once applied it stays until [`CheckoutForm::reset`].
    pub fn apply_coupon(&mut self, code: &str, subtotal: f64) -> Result<f64, CouponError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CouponError::Empty);
        }
        if self.coupon.is_some() {
            return Err(CouponError::AlreadyApplied);
        }
        if !code.eq_ignore_ascii_case(PROMO_CODE) {
            return Err(CouponError::Invalid(code.to_string()));
        }
        if subtotal < PROMO_MIN_SUBTOTAL {
            return Err(CouponError::BelowMinimum(PROMO_MIN_SUBTOTAL));
        }
        self.coupon = Some(PROMO_CODE.to_string());
        Ok(PROMO_DISCOUNT)
    }

    pub fn select_address(&mut self, address_id: &str) {
        self.selected_address = Some(address_id.to_string());
    }

    pub fn reset(&mut self) {
        *self = CheckoutForm::default();
    }

    // the coupon stops counting if the cart shrinks under the minimum afterwards
    fn discount(&self, subtotal: f64) -> f64 {
        match self.coupon {
            Some(_) if subtotal >= PROMO_MIN_SUBTOTAL => PROMO_DISCOUNT,
            _ => 0.0,
        }
    }

    /// `total = subtotal - discount + deliveryCharges`; no delivery on an empty cart.
    pub fn summary(&self, items: &[CartItem], delivery_charges: f64) -> OrderSummary {
        let subtotal = subtotal(items);
        let discount = self.discount(subtotal);
        let delivery_charges = if items.is_empty() { 0.0 } else { delivery_charges };
        OrderSummary {
            subtotal,
            discount,
            delivery_charges,
            total: subtotal - discount + delivery_charges,
            item_count: item_count(items),
        }
    }

    pub fn can_checkout(&self, items: &[CartItem]) -> bool {
        self.selected_address.is_some() && !items.is_empty()
    }
}

/// Asks the backend for a payment session and returns the external payment URL.
pub async fn begin_payment(
    api: &dyn FoodApi,
    redirect: &PaymentRedirect,
    form: &CheckoutForm,
    items: &[CartItem],
) -> ApiResult<String> {
    let address_id = match (&form.selected_address, items.is_empty()) {
        (Some(id), false) => id.clone(),
        (None, _) => return Err(ApiError::Validation("Select a delivery address".to_string())),
        (_, true) => return Err(ApiError::Validation("Your cart is empty".to_string())),
    };

    let request = PaymentRequest {
        items: items
            .iter()
            .map(|item| PaymentLine {
                meal_id: item.meal_id.clone(),
                title: item.meal.title.clone(),
                quantity: item.quantity,
            })
            .collect(),
        address_id,
    };

    let session = api.create_payment_session(&request).await?;
    let url = redirect.redirect_url(&session)?;
    info!(session = %session.id, "payment session created");
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, FakeFoodApi};

    fn line(meal_id: &str, price: f64, quantity: u32) -> CartItem {
        CartItem {
            id: format!("c-{}", meal_id),
            meal_id: meal_id.to_string(),
            quantity,
            meal: testing::meal(meal_id, "Meal", price),
        }
    }

    #[test]
    fn promo_code_is_case_insensitive() {
        let mut form = CheckoutForm::default();
        assert_eq!(form.apply_coupon("first50", 598.0), Ok(50.0));
        assert_eq!(form.coupon.as_deref(), Some(PROMO_CODE));
    }

    #[test]
    fn other_codes_give_no_discount() {
        let mut form = CheckoutForm::default();
        assert_eq!(form.apply_coupon("SAVE10", 598.0), Err(CouponError::Invalid("SAVE10".to_string())));
        assert_eq!(form.summary(&[line("m1", 299.0, 2)], 40.0).discount, 0.0);
        assert_eq!(form.apply_coupon("   ", 598.0), Err(CouponError::Empty));
    }

    #[test]
    fn coupon_cannot_be_replaced_until_reset() {
        let mut form = CheckoutForm::default();
        form.apply_coupon("FIRST50", 598.0).unwrap();
        assert_eq!(form.apply_coupon("FIRST50", 598.0), Err(CouponError::AlreadyApplied));

        form.reset();
        assert_eq!(form.coupon, None);
        assert_eq!(form.apply_coupon("FIRST50", 598.0), Ok(50.0));
    }

    #[test]
    fn coupon_needs_minimum_subtotal() {
        let mut form = CheckoutForm::default();
        assert_eq!(form.apply_coupon("FIRST50", 49.0), Err(CouponError::BelowMinimum(50.0)));
        assert_eq!(form.coupon, None);
    }

    #[test]
    fn total_is_subtotal_minus_discount_plus_delivery() {
        let mut form = CheckoutForm::default();
        let items = vec![line("m1", 299.0, 2)];
        form.apply_coupon("FIRST50", 598.0).unwrap();

        let summary = form.summary(&items, 40.0);
        assert_eq!(summary.subtotal, 598.0);
        assert_eq!(summary.discount, 50.0);
        assert_eq!(summary.delivery_charges, 40.0);
        assert_eq!(summary.total, 588.0);
        assert_eq!(summary.item_count, 2);
    }

    #[test]
    fn empty_cart_has_no_charges() {
        let summary = CheckoutForm::default().summary(&[], 40.0);
        assert_eq!(summary.total, 0.0);
        assert_eq!(summary.delivery_charges, 0.0);
    }

    #[test]
    fn checkout_needs_address_and_items() {
        let mut form = CheckoutForm::default();
        let items = vec![line("m1", 299.0, 1)];
        assert!(!form.can_checkout(&items));
        form.select_address("a1");
        assert!(!form.can_checkout(&[]));
        assert!(form.can_checkout(&items));
    }

    #[tokio::test]
    async fn payment_request_carries_items_but_no_amount() {
        let api = FakeFoodApi::logged_in();
        let redirect = PaymentRedirect::new("https://pay.example.com/c/pay/");
        let mut form = CheckoutForm::default();
        form.select_address("a1");
        form.apply_coupon("FIRST50", 598.0).unwrap();

        let url = begin_payment(&api, &redirect, &form, &[line("m1", 299.0, 2)]).await.unwrap();
        assert_eq!(url, "https://pay.example.com/c/pay/cs_test_1");

        let sent = api.payment_requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].address_id, "a1");
        assert_eq!(sent[0].items[0].quantity, 2);
    }

    #[tokio::test]
    async fn payment_without_address_sends_nothing() {
        let api = FakeFoodApi::logged_in();
        let redirect = PaymentRedirect::new("https://pay.example.com/");
        let err = begin_payment(&api, &redirect, &CheckoutForm::default(), &[line("m1", 299.0, 1)])
            .await
            .unwrap_err();
        assert_eq!(err.user_message(), "Select a delivery address");
        assert!(api.payment_requests().is_empty());
    }

    #[tokio::test]
    async fn broken_redirect_is_a_payment_error() {
        let api = FakeFoodApi::logged_in();
        let redirect = PaymentRedirect::new("ftp://pay.example.com/");
        let mut form = CheckoutForm::default();
        form.select_address("a1");
        let err = begin_payment(&api, &redirect, &form, &[line("m1", 299.0, 1)]).await.unwrap_err();
        assert!(matches!(err, ApiError::Payment(_)));
    }
}
