use serde::{Deserialize, Serialize};

use super::restaurant::Restaurant;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealItem {
    #[serde(alias = "_id")]
    pub id: String,
    pub meal_id: String,
    pub restaurant_id: String,
    pub category: String,
    #[serde(default)]
    pub image: String,
    pub title: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub full_description: Vec<String>,
    pub price: f64,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant: Option<Restaurant>,
}

#[derive(Debug, Deserialize)]
pub struct MealListResponse {
    #[serde(default)]
    pub meals: Vec<MealItem>,
}

#[derive(Debug, Deserialize)]
pub struct MealResponse {
    pub meal: MealItem,
}

/// Distinct categories in first-seen order.
pub fn categories(meals: &[MealItem]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for meal in meals {
        if !out.iter().any(|c| c.eq_ignore_ascii_case(&meal.category)) {
            out.push(meal.category.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_backend_meal() {
        let json = r#"{
            "_id": "665f",
            "mealId": "m-1",
            "restaurantId": "r-1",
            "category": "Pizza",
            "image": "margherita.png",
            "title": "Margherita",
            "shortDescription": "Classic",
            "fullDescription": ["Tomato", "Mozzarella"],
            "price": 299,
            "isPopular": true
        }"#;
        let meal: MealItem = serde_json::from_str(json).unwrap();
        assert_eq!(meal.id, "665f");
        assert_eq!(meal.meal_id, "m-1");
        assert_eq!(meal.price, 299.0);
        assert!(meal.is_popular);
        assert!(meal.restaurant.is_none());
    }

    #[test]
    fn rejects_meal_without_price() {
        let json = r#"{"id":"1","mealId":"m-1","restaurantId":"r","category":"c","title":"t"}"#;
        assert!(serde_json::from_str::<MealItem>(json).is_err());
    }
}
