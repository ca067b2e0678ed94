use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::post,
    Json,
};
use encore_community::NewTrackPlay;

use crate::{
    auth::Session,
    context::ServerContext,
    errors::{ServerError, ServerResult},
    rate_limit::client_key,
    schemas::{AnalyticsSchema, PlayEvent, ValidatedJson},
    serialized::{Ack, PlayStarted, ToSerialized},
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/analytics/track",
    tag = "analytics",
    request_body = AnalyticsSchema,
    responses(
        (status = 200, body = PlayStarted, description = "Returned for start events"),
        (status = 400, description = "The event is missing required fields")
    )
)]
pub(crate) async fn track(
    session: Option<Session>,
    State(context): State<ServerContext>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<AnalyticsSchema>,
) -> ServerResult<Response> {
    context.limits.analytics.ensure(&client_key(&headers))?;

    match body.event {
        PlayEvent::Start => {
            let track_key = body
                .track_key
                .ok_or(ServerError::InvalidInput("A start event needs a track_key"))?;

            let play = context
                .community
                .analytics
                .track_started(NewTrackPlay {
                    track_key,
                    session_token: session.map(|s| s.token),
                    ip: forwarded_ip(&headers),
                    user_agent: user_agent(&headers),
                    idempotency_key: body.idempotency_key,
                })
                .await?;

            Ok(Json(play.to_serialized()).into_response())
        }
        PlayEvent::Progress => {
            let (play_id, position_ms) = progress_fields(&body)?;

            context
                .community
                .analytics
                .track_progressed(play_id, position_ms)
                .await?;

            Ok(Json(Ack { ok: true }).into_response())
        }
        PlayEvent::End => {
            let (play_id, position_ms) = progress_fields(&body)?;

            context
                .community
                .analytics
                .track_ended(play_id, position_ms)
                .await?;

            Ok(Json(Ack { ok: true }).into_response())
        }
    }
}

fn progress_fields(body: &AnalyticsSchema) -> ServerResult<(uuid::Uuid, i64)> {
    let play_id = body
        .play_id
        .ok_or(ServerError::InvalidInput("This event needs a play_id"))?;

    let position_ms = body
        .position_ms
        .ok_or(ServerError::InvalidInput("This event needs position_ms"))?;

    Ok((play_id, position_ms))
}

fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

pub fn router() -> Router {
    Router::new().route("/track", post(track))
}
