use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json,
};
use encore_community::{NewWallComment, NewWallPost};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    auth::Session,
    context::ServerContext,
    errors::{ServerError, ServerResult},
    rate_limit::client_key,
    schemas::{LikeToggleSchema, NewCommentSchema, NewPostSchema, ValidatedJson},
    serialized::{Ack, Comments, LikeToggle, Post, ToSerialized},
    sse,
    Router,
};

#[derive(Debug, Deserialize, IntoParams)]
pub struct CommentQuery {
    pub post_id: Uuid,
}

#[utoipa::path(
    get,
    path = "/v1/posts",
    tag = "wall",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Vec<Post>)
    )
)]
pub(crate) async fn list_posts(
    _session: Session,
    State(context): State<ServerContext>,
) -> ServerResult<Json<Vec<Post>>> {
    let posts = context.community.wall.latest_posts().await?;
    Ok(Json(posts.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/posts",
    tag = "wall",
    request_body = NewPostSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Post)
    )
)]
pub(crate) async fn create_post(
    _session: Session,
    State(context): State<ServerContext>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<NewPostSchema>,
) -> ServerResult<Json<Post>> {
    context.limits.posts.ensure(&client_key(&headers))?;

    let post = context
        .community
        .wall
        .create_post(NewWallPost {
            content: body.content,
            author_name: body.author_name,
            care_package_code: body.care_package_code,
        })
        .await?;

    Ok(Json(post.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/likes/toggle",
    tag = "wall",
    request_body = LikeToggleSchema,
    responses(
        (status = 200, body = LikeToggle),
        (status = 404, description = "The post does not exist")
    )
)]
pub(crate) async fn toggle_like(
    State(context): State<ServerContext>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<LikeToggleSchema>,
) -> ServerResult<Json<LikeToggle>> {
    context.limits.likes.ensure(&client_key(&headers))?;

    // The token in the body identifies the liker, so it has to be live
    let valid = context.community.auth.validate(&body.session_token).await?;

    if !valid {
        return Err(ServerError::Unauthorized);
    }

    let result = context
        .community
        .wall
        .toggle_like(body.post_id, &body.session_token)
        .await?;

    Ok(Json(result.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/comments",
    tag = "wall",
    params(CommentQuery),
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Comments)
    )
)]
pub(crate) async fn list_comments(
    _session: Session,
    State(context): State<ServerContext>,
    Query(query): Query<CommentQuery>,
) -> ServerResult<Json<Comments>> {
    let comments = context.community.wall.comments(query.post_id).await?;

    Ok(Json(Comments {
        comments: comments.to_serialized(),
    }))
}

#[utoipa::path(
    post,
    path = "/v1/comments",
    tag = "wall",
    request_body = NewCommentSchema,
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 201, body = Ack)
    )
)]
pub(crate) async fn create_comment(
    _session: Session,
    State(context): State<ServerContext>,
    headers: HeaderMap,
    ValidatedJson(body): ValidatedJson<NewCommentSchema>,
) -> ServerResult<(StatusCode, Json<Ack>)> {
    context.limits.comments.ensure(&client_key(&headers))?;

    // The created comment reaches clients through the event stream
    context
        .community
        .wall
        .create_comment(NewWallComment {
            post_id: body.post_id,
            content: body.content,
            author_name: body.author_name,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(Ack { ok: true })))
}

pub fn posts_router() -> Router {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/events", get(sse::event_stream))
}

pub fn likes_router() -> Router {
    Router::new().route("/toggle", post(toggle_like))
}

pub fn comments_router() -> Router {
    Router::new().route("/", get(list_comments).post(create_comment))
}
