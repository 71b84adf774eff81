use serde::{Deserialize, Serialize};

use super::meal::MealItem;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Restaurant {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub restaurant_id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub cuisines: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestaurantListResponse {
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RestaurantDetail {
    pub restaurant: Restaurant,
    #[serde(default)]
    pub meals: Vec<MealItem>,
}
