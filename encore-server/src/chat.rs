use axum::{
    extract::State,
    http::HeaderMap,
    routing::post,
    Json,
};

use crate::{
    auth::Session,
    context::ServerContext,
    errors::ServerResult,
    rate_limit::client_key,
    schemas::{ChatSchema, ValidatedJson},
    serialized::Reply,
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/chat",
    tag = "chat",
    request_body = ChatSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Reply),
        (status = 502, description = "The upstream service is unavailable"),
        (status = 504, description = "The upstream service took too long to respond")
    )
)]
pub(crate) async fn send_message(
    _session: Session,
    State(context): State<ServerContext>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<ChatSchema>,
) -> ServerResult<Json<Reply>> {
    context.limits.chat.ensure(&client_key(&headers))?;

    let reply = context.relays.assistant.forward(&body.message).await?;
    Ok(Json(Reply { reply }))
}

#[utoipa::path(
    post,
    path = "/v1/guardian",
    tag = "chat",
    request_body = ChatSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Reply),
        (status = 502, description = "The upstream service is unavailable"),
        (status = 504, description = "The upstream service took too long to respond")
    )
)]
pub(crate) async fn send_guardian_message(
    _session: Session,
    State(context): State<ServerContext>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<ChatSchema>,
) -> ServerResult<Json<Reply>> {
    context.limits.chat.ensure(&client_key(&headers))?;

    let reply = context.relays.guardian.forward(&body.message).await?;
    Ok(Json(Reply { reply }))
}

pub fn router() -> Router {
    Router::new().route("/", post(send_message))
}

pub fn guardian_router() -> Router {
    Router::new().route("/", post(send_guardian_message))
}
