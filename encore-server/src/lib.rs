use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
    path::PathBuf,
    sync::Arc,
    thread,
};

use axum::routing::get;
use encore_community::{ChatRelay, Community, PgDatabase};
use encore_core::AlbumManifest;
use encore_impls::available_transports;
use log::{info, warn};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

mod album;
mod analytics;
mod auth;
mod chat;
mod context;
mod docs;
mod errors;
mod logging;
mod rate_limit;
mod schemas;
mod serialized;
mod sse;
mod wall;

pub use logging::init_logger;

use context::{Relays, ServerContext};
use rate_limit::RateLimits;
use sse::ServerSentEvents;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9600;

pub type Router = axum::Router<ServerContext>;

/// Starts the encore server
pub async fn run_server() {
    let port = env::var("ENCORE_SERVER_PORT")
        .map(|x| x.parse::<u16>().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);

    let database_url = env::var("ENCORE_DATABASE_URL").expect("ENCORE_DATABASE_URL must be set");
    let chat_webhook = env::var("ENCORE_CHAT_WEBHOOK_URL").expect("ENCORE_CHAT_WEBHOOK_URL must be set");
    let guardian_webhook =
        env::var("ENCORE_GUARDIAN_WEBHOOK_URL").expect("ENCORE_GUARDIAN_WEBHOOK_URL must be set");

    let manifest_path: PathBuf = env::var("ENCORE_ALBUM_MANIFEST")
        .unwrap_or_else(|_| "album.ron".to_string())
        .into();

    let album = AlbumManifest::load(&manifest_path).expect("album manifest loads");

    let media_root = env::var("ENCORE_MEDIA_ROOT").unwrap_or_else(|_| "media".to_string());
    let transports = available_transports(media_root);
    let missing = album::unsupported_tracks(&album, &transports);

    if !missing.is_empty() {
        warn!("No transport can load these tracks: {}", missing.join(", "));
    }

    let database = PgDatabase::new(&database_url)
        .await
        .expect("database connects");

    let community = Arc::new(Community::new(database));
    let sse = ServerSentEvents::new();

    spawn_event_thread(&community, &sse);

    let context = ServerContext {
        community,
        relays: Arc::new(Relays {
            assistant: ChatRelay::new(chat_webhook),
            guardian: ChatRelay::new(guardian_webhook),
        }),
        limits: Arc::new(RateLimits::default()),
        album: Arc::new(album),
        sse,
    };

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let version_one_router = Router::new()
        .nest("/auth", auth::router())
        .nest("/qr", auth::qr_router())
        .nest("/posts", wall::posts_router())
        .nest("/likes", wall::likes_router())
        .nest("/comments", wall::comments_router())
        .nest("/chat", chat::router())
        .nest("/guardian", chat::guardian_router())
        .nest("/analytics", analytics::router())
        .nest("/album", album::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    info!("encore server listening on port {}", port);

    axum::serve(listener, root_router.into_make_service())
        .await
        .expect("server runs");
}

/// Forwards community events to connected event stream clients
fn spawn_event_thread(community: &Arc<Community<PgDatabase>>, sse: &Arc<ServerSentEvents>) {
    let community = community.clone();
    let sse = sse.clone();

    thread::spawn(move || loop {
        let event = community.wait_for_event();
        sse.broadcast(event.into());
    });
}
