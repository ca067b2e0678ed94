use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    routing::post,
    Json,
};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    rate_limit::client_key,
    schemas::{QrSchema, RedeemSchema, ValidatedJson},
    serialized::{Ack, QrCheck, Redemption, SessionStatus, ToSerialized},
    Router,
};

/// A validated session, extracted from the Authorization header
pub struct Session {
    pub token: String,
}

#[async_trait]
impl FromRequestParts<ServerContext> for Session {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerContext,
    ) -> Result<Self, Self::Rejection> {
        let context = ServerContext::from_ref(state);

        let token = bearer_token(&parts.headers)
            .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization"))?;

        let valid = context
            .community
            .auth
            .validate(&token)
            .await
            .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "Session check failed"))?;

        if !valid {
            return Err((StatusCode::UNAUTHORIZED, "Session does not exist"));
        }

        Ok(Self { token })
    }
}

/// Pulls the token out of a `Bearer <token>` Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let parts: Vec<_> = value.split_ascii_whitespace().collect();

    if parts.first() != Some(&"Bearer") {
        return None;
    }

    parts.last().map(|t| t.to_string())
}

#[utoipa::path(
    post,
    path = "/v1/auth",
    tag = "auth",
    request_body = RedeemSchema,
    responses(
        (status = 200, body = Redemption),
        (status = 401, description = "The access code is not valid")
    )
)]
pub(crate) async fn redeem(
    State(context): State<ServerContext>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<RedeemSchema>,
) -> ServerResult<Json<Redemption>> {
    context.limits.auth.ensure(&client_key(&headers))?;

    let redemption = context.community.auth.redeem(&body.code).await?;
    Ok(Json(redemption.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/auth",
    tag = "auth",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = SessionStatus),
        (status = 400, description = "No session token was provided"),
        (status = 401, description = "The session is invalid or expired")
    )
)]
pub(crate) async fn session_status(
    State(context): State<ServerContext>,
    headers: HeaderMap,
) -> ServerResult<Json<SessionStatus>> {
    let token = bearer_token(&headers)
        .ok_or(ServerError::InvalidInput("No session token was provided"))?;

    if !context.community.auth.validate(&token).await? {
        return Err(ServerError::Unauthorized);
    }

    Ok(Json(SessionStatus { ok: true }))
}

#[utoipa::path(
    delete,
    path = "/v1/auth",
    tag = "auth",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Ack),
        (status = 400, description = "No session token was provided")
    )
)]
pub(crate) async fn revoke(
    State(context): State<ServerContext>,
    headers: HeaderMap,
) -> ServerResult<Json<Ack>> {
    let token = bearer_token(&headers)
        .ok_or(ServerError::InvalidInput("No session token was provided"))?;

    // Idempotent, revoking an already gone session is still a success
    context.community.auth.revoke(&token).await?;
    Ok(Json(Ack { ok: true }))
}

#[utoipa::path(
    post,
    path = "/v1/qr",
    tag = "auth",
    request_body = QrSchema,
    responses(
        (status = 200, body = QrCheck)
    )
)]
pub(crate) async fn check_qr(
    State(context): State<ServerContext>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<QrSchema>,
) -> ServerResult<Json<QrCheck>> {
    context.limits.qr.ensure(&client_key(&headers))?;

    let check = context.community.auth.redeem_qr(&body.qr).await?;
    Ok(Json(check.to_serialized()))
}

pub fn router() -> Router {
    Router::new().route("/", post(redeem).get(session_status).delete(revoke))
}

pub fn qr_router() -> Router {
    Router::new().route("/", post(check_qr))
}
