use std::borrow::BorrowMut;

use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::{schemas, serialized, sse};

#[derive(OpenApi)]
#[openapi(
    modifiers(&Security),
    info(
        description = "encore-server exposes endpoints to interact with this encore instance"
    ),
    paths(
        crate::auth::redeem,
        crate::auth::session_status,
        crate::auth::revoke,
        crate::auth::check_qr,
        crate::wall::list_posts,
        crate::wall::create_post,
        crate::wall::toggle_like,
        crate::wall::list_comments,
        crate::wall::create_comment,
        crate::chat::send_message,
        crate::chat::send_guardian_message,
        crate::analytics::track,
        crate::album::album,
        crate::sse::event_stream,
    ),
    components(schemas(
        serialized::Redemption,
        serialized::SessionStatus,
        serialized::QrCheck,
        serialized::Post,
        serialized::LikeToggle,
        serialized::Comment,
        serialized::Comments,
        serialized::Reply,
        serialized::PlayStarted,
        serialized::Ack,
        serialized::Album,
        serialized::AlbumTrack,
        schemas::RedeemSchema,
        schemas::QrSchema,
        schemas::NewPostSchema,
        schemas::LikeToggleSchema,
        schemas::NewCommentSchema,
        schemas::ChatSchema,
        schemas::AnalyticsSchema,
        schemas::PlayEvent,
        sse::ServerEvent,
    ))
)]
pub struct ApiDoc;

struct Security;

impl Modify for Security {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.borrow_mut() {
            let scheme = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("Bearer <token>")
                .build();

            components.add_security_scheme("BearerAuth", SecurityScheme::Http(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
