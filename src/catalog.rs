use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiResult;
use crate::models::{MealItem, Restaurant, RestaurantDetail};
use crate::query::{QueryClient, QueryKey};
use crate::services::FoodApi;

/// Read-only catalog queries, cached per resource.
#[derive(Clone)]
pub struct Catalog {
    api: Arc<dyn FoodApi>,
    queries: QueryClient,
    stale_time: Duration,
}

impl Catalog {
    pub fn new(api: Arc<dyn FoodApi>, queries: QueryClient, stale_time: Duration) -> Self {
        Self { api, queries, stale_time }
    }

    pub async fn meals(&self) -> ApiResult<Vec<MealItem>> {
        let api = self.api.clone();
        self.queries
            .fetch(&QueryKey::resource("meals"), self.stale_time, move || async move { api.meals().await })
            .await
    }

    pub async fn popular_meals(&self) -> ApiResult<Vec<MealItem>> {
        Ok(self.meals().await?.into_iter().filter(|m| m.is_popular).collect())
    }

    pub async fn meals_in_category(&self, category: Option<&str>) -> ApiResult<Vec<MealItem>> {
        let meals = self.meals().await?;
        Ok(match category.map(str::trim).filter(|c| !c.is_empty()) {
            Some(category) => meals
                .into_iter()
                .filter(|m| m.category.eq_ignore_ascii_case(category))
                .collect(),
            None => meals,
        })
    }

    pub async fn meal(&self, meal_id: &str) -> ApiResult<MealItem> {
        let api = self.api.clone();
        let id = meal_id.to_string();
        self.queries
            .fetch(&QueryKey::new("meal", [meal_id]), self.stale_time, move || async move {
                api.meal(&id).await
            })
            .await
    }

    /// Blank queries match nothing and send nothing.
    pub async fn search(&self, query: &str) -> ApiResult<Vec<MealItem>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let api = self.api.clone();
        let key = QueryKey::new("search", [query.as_str()]);
        self.queries
            .fetch(&key, self.stale_time, move || async move { api.search_meals(&query).await })
            .await
    }

    pub async fn restaurants(&self) -> ApiResult<Vec<Restaurant>> {
        let api = self.api.clone();
        self.queries
            .fetch(&QueryKey::resource("restaurants"), self.stale_time, move || async move {
                api.restaurants().await
            })
            .await
    }

    pub async fn restaurant(&self, id: &str) -> ApiResult<RestaurantDetail> {
        let api = self.api.clone();
        let owned = id.to_string();
        self.queries
            .fetch(&QueryKey::new("restaurant", [id]), self.stale_time, move || async move {
                api.restaurant(&owned).await
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeFoodApi;

    fn catalog() -> Catalog {
        Catalog::new(Arc::new(FakeFoodApi::new()), QueryClient::new(), Duration::from_secs(600))
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_skips_blank_queries() {
        let catalog = catalog();
        let hits = catalog.search("  MARGH ").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].meal_id, "m1");
        assert!(catalog.search("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_filter() {
        let catalog = catalog();
        assert_eq!(catalog.meals_in_category(Some("pizza")).await.unwrap().len(), 2);
        assert!(catalog.meals_in_category(Some("Sushi")).await.unwrap().is_empty());
        assert_eq!(catalog.meals_in_category(None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unknown_restaurant_is_an_error() {
        let err = catalog().restaurant("nope").await.unwrap_err();
        assert_eq!(err.user_message(), "Restaurant not found");
    }
}
