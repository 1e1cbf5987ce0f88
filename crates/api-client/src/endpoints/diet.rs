//! Diet-log endpoints
//!
//! Daily intake log reads and writes: AI-prompted intake, manual intake,
//! per-entry removal, photo attachment, and the month calendar view.

use crate::client::NutrilogClient;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

/// Measurement unit for a food quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitType {
    /// Quantity in grams
    Grams,
    /// Quantity in servings of the ingredient's serving size
    Servings,
}

/// One logged food entry as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeFood {
    pub id: i64,
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
    pub quantity: f64,
    pub unit_type: UnitType,
    pub date: String,
    pub added_by_ai: bool,
    pub image_url: Option<String>,
}

/// A day's diet log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietLog {
    /// Day this log covers (`YYYY-MM-DD`)
    pub log_date: String,
    /// Calories taken in
    pub intake: f64,
    /// Calories consumed (burned)
    pub consumption: f64,
    /// Individual logged foods
    pub intake_foods: Vec<IntakeFood>,
}

/// One food in an intake-recording request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FoodEntry {
    /// Brand, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub food_name: String,
    pub unit_type: UnitType,
    pub quantity: f64,
}

/// Request body for `POST /diet/intake`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordIntakeRequest {
    pub foods: Vec<FoodEntry>,
    pub log_date: String,
    pub added_by_ai: bool,
    /// Correlates a recording with the prompt round that produced it
    pub unique_id: Option<String>,
    /// Set when the user corrected an AI-proposed list before saving
    pub is_corrected: Option<bool>,
}

impl RecordIntakeRequest {
    /// Start a manual recording for a day
    #[must_use]
    pub fn new(log_date: impl Into<String>) -> Self {
        Self {
            foods: Vec::new(),
            log_date: log_date.into(),
            added_by_ai: false,
            unique_id: None,
            is_corrected: None,
        }
    }

    /// Add a food entry
    #[must_use]
    pub fn with_food(mut self, food: FoodEntry) -> Self {
        self.foods.push(food);
        self
    }

    /// Mark the recording as AI-proposed, tied to a prompt round
    #[must_use]
    pub fn from_prompt(mut self, unique_id: impl Into<String>, corrected: bool) -> Self {
        self.added_by_ai = true;
        self.unique_id = Some(unique_id.into());
        self.is_corrected = Some(corrected);
        self
    }
}

/// Quantity in a prompt response: the model sometimes answers with a
/// number, sometimes with a numeric string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PromptQuantity {
    /// Plain numeric quantity
    Number(f64),
    /// Quantity as text, parsed lazily
    Text(String),
}

impl PromptQuantity {
    /// Numeric value, if the text form parses
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One food proposed by the intake prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptFood {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub food_name: String,
    pub unit_type: UnitType,
    pub quantity: PromptQuantity,
}

/// Response of `POST /diet/intake-prompt`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakePromptResponse {
    /// Foods the model extracted from the prompt
    pub foods: Vec<PromptFood>,
    /// Round ID to echo back when the proposal is recorded
    pub unique_id: String,
}

/// Request body for `POST /diet/intake-manually`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualIntakeRequest {
    pub google_id: String,
    pub log_date: String,
    pub food_name: String,
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
    pub quantity: f64,
    pub unit_type: UnitType,
    /// Optional photo of the food, base64-encoded
    pub image_base64: Option<String>,
}

/// Response of `POST /diet/upload_image`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadImageResponse {
    /// Public URL of the stored image
    pub image_url: String,
}

/// Response of `GET /diet/date_has_intake_in_month`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthIntakeDates {
    /// Days in the month that have at least one intake (`YYYY-MM-DD`)
    pub dates: Vec<String>,
}

/// Diet-log API interface
#[derive(Clone)]
pub struct DietApi {
    client: NutrilogClient,
}

impl DietApi {
    /// Create a new diet API interface
    pub(crate) fn new(client: NutrilogClient) -> Self {
        Self { client }
    }

    /// Fetch the diet log for a day
    ///
    /// POST /diet/get_diet_log
    pub async fn log(&self, log_date: &str) -> ApiResult<DietLog> {
        self.client
            .post_json("/diet/get_diet_log", &serde_json::json!({ "log_date": log_date }))
            .await
    }

    /// Record a list of intake foods for a day
    ///
    /// POST /diet/intake
    pub async fn record_intake(&self, request: &RecordIntakeRequest) -> ApiResult<DietLog> {
        self.client.post_json("/diet/intake", request).await
    }

    /// Record calories consumed (burned) for a day
    ///
    /// POST /diet/comsumption (route spelling is the backend's)
    pub async fn record_consumption(
        &self,
        consumption: f64,
        log_date: &str,
    ) -> ApiResult<DietLog> {
        self.client
            .post_json(
                "/diet/comsumption",
                &serde_json::json!({ "consumption": consumption, "log_date": log_date }),
            )
            .await
    }

    /// Ask the backend to turn a free-text prompt into food proposals
    ///
    /// POST /diet/intake-prompt
    pub async fn intake_from_prompt(
        &self,
        google_id: &str,
        prompts: &str,
        log_date: Option<&str>,
    ) -> ApiResult<IntakePromptResponse> {
        self.client
            .post_json(
                "/diet/intake-prompt",
                &serde_json::json!({
                    "google_id": google_id,
                    "prompts": prompts,
                    "log_date": log_date,
                }),
            )
            .await
    }

    /// Record a manually entered food with explicit nutrients
    ///
    /// POST /diet/intake-manually
    pub async fn record_manual(&self, request: &ManualIntakeRequest) -> ApiResult<DietLog> {
        self.client.post_json("/diet/intake-manually", request).await
    }

    /// Remove one intake entry by ID
    ///
    /// POST /diet/remove_intake_by_id
    pub async fn remove_intake(&self, id: i64) -> ApiResult<()> {
        self.client
            .post_unit("/diet/remove_intake_by_id", &serde_json::json!({ "id": id }))
            .await
    }

    /// Attach a photo to an intake entry
    ///
    /// POST /diet/upload_image
    pub async fn upload_image(
        &self,
        id: i64,
        image_base64: &str,
    ) -> ApiResult<UploadImageResponse> {
        self.client
            .post_json(
                "/diet/upload_image",
                &serde_json::json!({ "image_base64": image_base64, "id": id }),
            )
            .await
    }

    /// Remove the photo from an intake entry
    ///
    /// POST /diet/delete_image
    pub async fn delete_image(&self, id: i64) -> ApiResult<()> {
        self.client
            .post_unit("/diet/delete_image", &serde_json::json!({ "id": id }))
            .await
    }

    /// Days of a month that have any intake recorded
    ///
    /// GET /diet/date_has_intake_in_month?year=&month=
    pub async fn dates_with_intake(&self, year: i32, month: u32) -> ApiResult<MonthIntakeDates> {
        self.client
            .get_json(&format!(
                "/diet/date_has_intake_in_month?year={year}&month={month}"
            ))
            .await
    }
}
