use serde::{Deserialize, Serialize};

use super::meal::MealItem;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(alias = "_id")]
    pub id: String,
    pub meal_id: String,
    pub quantity: u32,
    pub meal: MealItem,
}

impl CartItem {
    pub fn line_total(&self) -> f64 {
        self.meal.price * f64::from(self.quantity)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    #[serde(default)]
    pub cart_item: Vec<CartItem>,
}

/// `{status, message}` reply of every mutation endpoint.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Ack {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
}

pub fn subtotal(items: &[CartItem]) -> f64 {
    items.iter().map(CartItem::line_total).sum()
}

pub fn item_count(items: &[CartItem]) -> u32 {
    items.iter().map(|i| i.quantity).sum()
}
