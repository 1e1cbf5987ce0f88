//! Ingredient-catalog endpoints
//!
//! Search, lookup, and CRUD for the shared ingredient catalog backing the
//! diet log.

use crate::client::NutrilogClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

pub use super::diet::UnitType;

/// A catalog ingredient with per-100g and per-serving nutrients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub brand: String,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
    pub serving_size_grams: f64,
    pub serving_calories: f64,
    pub serving_protein: f64,
    pub serving_fat: f64,
    pub serving_carbohydrates: f64,
    /// Whether the entry was created from a photo
    pub added_by_image: bool,
    pub image_url: Option<String>,
    pub unit_type: UnitType,
    /// Creating user, null for curated catalog entries
    pub added_user_id: Option<i64>,
}

/// Response of `POST /ingredient/get_ingredient_list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientListResponse {
    pub ingredients: Vec<Ingredient>,
    pub total_count: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
}

/// Name-similarity search hit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarIngredient {
    pub id: i64,
    pub brand: String,
    pub name: String,
    pub calories: f64,
    pub unit_type: UnitType,
}

/// Request body for `POST /ingredient/add`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewIngredient {
    pub unit_type: UnitType,
    pub brand: String,
    pub name: String,
    pub calories: f64,
    pub fat: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    /// Required when `unit_type` is servings
    pub serving_size_grams: Option<f64>,
    /// Optional photo, base64-encoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

/// Request body for `POST /ingredient/update`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateIngredient {
    pub id: i64,
    pub brand: String,
    pub name: String,
    pub calories: f64,
    pub fat: f64,
    pub protein: f64,
    pub carbohydrates: f64,
    pub serving_size_grams: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
}

/// Ingredient API interface
#[derive(Clone)]
pub struct IngredientApi {
    client: NutrilogClient,
}

impl IngredientApi {
    /// Create a new ingredient API interface
    pub(crate) fn new(client: NutrilogClient) -> Self {
        Self { client }
    }

    /// Search the catalog by name, paginated
    ///
    /// POST /ingredient/get_ingredient_list
    pub async fn list(
        &self,
        name: &str,
        page: u32,
        page_size: u32,
    ) -> ApiResult<IngredientListResponse> {
        self.client
            .post_json(
                "/ingredient/get_ingredient_list",
                &serde_json::json!({
                    "name": name,
                    "page": page,
                    "page_size": page_size,
                }),
            )
            .await
    }

    /// Fetch a single ingredient by ID
    ///
    /// GET /ingredient/get_ingredient?id=
    pub async fn get(&self, id: i64) -> ApiResult<Ingredient> {
        self.client
            .get_json(&format!("/ingredient/get_ingredient?id={id}"))
            .await
    }

    /// Find catalog entries with similar names
    ///
    /// POST /ingredient/get_similar_ingredients
    pub async fn similar(&self, name: &str) -> ApiResult<Vec<SimilarIngredient>> {
        self.client
            .post_json(
                "/ingredient/get_similar_ingredients",
                &serde_json::json!({ "name": name }),
            )
            .await
    }

    /// Add a new ingredient to the catalog
    ///
    /// POST /ingredient/add
    pub async fn create(&self, ingredient: &NewIngredient) -> ApiResult<Ingredient> {
        self.client.post_json("/ingredient/add", ingredient).await
    }

    /// Update an existing ingredient
    ///
    /// POST /ingredient/update
    pub async fn update(&self, ingredient: &UpdateIngredient) -> ApiResult<Ingredient> {
        self.client.post_json("/ingredient/update", ingredient).await
    }

    /// Delete an ingredient by ID
    ///
    /// POST /ingredient/delete
    pub async fn delete(&self, id: i64) -> ApiResult<()> {
        self.client
            .post_unit("/ingredient/delete", &serde_json::json!({ "id": id }))
            .await
    }
}
