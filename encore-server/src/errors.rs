use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use encore_community::{AuthError, DatabaseError, RelayError, WallError};
use log::error;
use serde_json::json;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    InvalidInput(&'static str),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Too many requests")]
    RateLimited,
    #[error("The upstream service took too long to respond")]
    UpstreamTimeout,
    #[error("The upstream service is unavailable")]
    UpstreamUnavailable,
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("{resource} with {field} of value {value} already exists")]
    Conflict {
        resource: &'static str,
        field: &'static str,
        value: String,
    },
    #[error("Internal server error")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let Self::Unknown(detail) = &self {
            error!("Internal server error: {}", detail);
        }

        let body = Json(json!({ "error": self.to_string() }));
        (self.as_status_code(), body).into_response()
    }
}

impl From<AuthError> for ServerError {
    fn from(value: AuthError) -> Self {
        match value {
            AuthError::MissingCode => Self::InvalidInput("No access code was provided"),
            AuthError::InvalidCode => Self::Unauthorized,
            AuthError::SessionCreateFailed => Self::Unknown(value.to_string()),
            AuthError::Database(e) => e.into(),
        }
    }
}

impl From<WallError> for ServerError {
    fn from(value: WallError) -> Self {
        match value {
            WallError::EmptyContent => Self::InvalidInput("Content must not be empty"),
            WallError::InvalidToken => Self::Unauthorized,
            WallError::PostNotFound => Self::NotFound {
                resource: "post",
                identifier: "id",
            },
            WallError::Database(e) => e.into(),
        }
    }
}

impl From<RelayError> for ServerError {
    fn from(value: RelayError) -> Self {
        match value {
            RelayError::InvalidMessage => Self::InvalidInput("The message must not be empty"),
            RelayError::Timeout => Self::UpstreamTimeout,
            RelayError::Network | RelayError::Upstream { .. } => Self::UpstreamUnavailable,
        }
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            DatabaseError::Conflict {
                resource,
                field,
                value,
            } => Self::Conflict {
                resource,
                field,
                value,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}
