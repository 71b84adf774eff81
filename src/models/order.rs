use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::address::AddressItem;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub meal_id: String,
    pub title: String,
    pub quantity: u32,
    pub price: f64,
    #[serde(default)]
    pub image: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: String,
    #[serde(default)]
    pub payment_status: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub address: Option<AddressItem>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListResponse {
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// Most recent first.
pub fn newest_first(mut orders: Vec<Order>) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLine {
    pub meal_id: String,
    pub title: String,
    pub quantity: u32,
}

/// Body of the payment-session request. Carries no amount: the backend prices it.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub items: Vec<PaymentLine>,
    pub address_id: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct PaymentSession {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: &str, at: &str) -> Order {
        Order {
            id: id.to_string(),
            items: vec![],
            total_amount: 0.0,
            status: "delivered".to_string(),
            payment_status: None,
            created_at: at.parse().unwrap(),
            address: None,
        }
    }

    #[test]
    fn orders_sorted_newest_first() {
        let sorted = newest_first(vec![
            order("a", "2024-01-01T10:00:00Z"),
            order("b", "2024-03-01T10:00:00Z"),
            order("c", "2024-02-01T10:00:00Z"),
        ]);
        let ids: Vec<&str> = sorted.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn decodes_order_timestamp() {
        let json = r#"{"_id":"o1","items":[{"mealId":"m1","title":"Pizza","quantity":2,"price":299}],"totalAmount":638,"status":"placed","createdAt":"2024-05-01T12:30:00.000Z"}"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.total_amount, 638.0);
    }
}
