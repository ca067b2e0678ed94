use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct RedeemSchema {
    #[validate(length(min = 1, max = 100))]
    pub code: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct QrSchema {
    /// The decoded payload of a scanned QR sticker
    #[validate(length(min = 1, max = 100))]
    pub qr: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct NewPostSchema {
    #[validate(length(min = 1, max = 1000))]
    pub content: String,
    #[validate(length(max = 100))]
    pub author_name: Option<String>,
    #[validate(length(max = 100))]
    pub care_package_code: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct LikeToggleSchema {
    pub post_id: Uuid,
    #[validate(length(min = 16, max = 200))]
    pub session_token: String,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct NewCommentSchema {
    pub post_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[validate(length(max = 100))]
    pub author_name: Option<String>,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct ChatSchema {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

/// The lifecycle stage an analytics event reports
#[derive(Debug, ToSchema, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayEvent {
    Start,
    Progress,
    End,
}

#[derive(Debug, ToSchema, Validate, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub struct AnalyticsSchema {
    pub event: PlayEvent,
    #[validate(length(max = 200))]
    pub track_key: Option<String>,
    pub play_id: Option<Uuid>,
    pub position_ms: Option<i64>,
    /// Reported but not persisted, the manifest is authoritative
    pub duration_ms: Option<i64>,
    #[validate(length(max = 200))]
    pub idempotency_key: Option<String>,
}

pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let extracted_json: Json<T> = Json::from_request(req, state)
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "JSON parse failed"))?;

        extracted_json
            .0
            .validate()
            .map_err(|_| (StatusCode::BAD_REQUEST, "Request body is invalid"))?;

        Ok(Self(extracted_json.0))
    }
}
