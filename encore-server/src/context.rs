use std::sync::Arc;

use axum::extract::FromRef;
use encore_community::{ChatRelay, Community, PgDatabase};
use encore_core::AlbumManifest;

use crate::{rate_limit::RateLimits, sse::ServerSentEvents};

#[derive(Clone, FromRef)]
pub struct ServerContext {
    pub community: Arc<Community<PgDatabase>>,
    pub relays: Arc<Relays>,
    pub limits: Arc<RateLimits>,
    pub sse: Arc<ServerSentEvents>,
    pub album: Arc<AlbumManifest>,
}

/// The upstream webhooks messages are forwarded to
pub struct Relays {
    /// Answers visitor questions about the album
    pub assistant: ChatRelay,
    /// Moderates content concerns
    pub guardian: ChatRelay,
}
