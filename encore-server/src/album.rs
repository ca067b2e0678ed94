use axum::{extract::State, routing::get, Json};
use encore_core::{AlbumManifest, AudioTransport, Transports};

use crate::{
    auth::Session,
    context::ServerContext,
    serialized::{Album, ToSerialized},
    Router,
};

/// Returns the keys of tracks no transport can handle, so a broken manifest
/// is caught at startup instead of on the first play
pub fn unsupported_tracks(manifest: &AlbumManifest, transports: &Transports) -> Vec<String> {
    manifest
        .tracks
        .iter()
        .filter(|track| !transports.iter().any(|t| t.supports(&track.file)))
        .map(|track| track.key.clone())
        .collect()
}

#[utoipa::path(
    get,
    path = "/v1/album",
    tag = "album",
    security(
        ("BearerAuth" = [])
    ),
    responses(
        (status = 200, body = Album)
    )
)]
pub(crate) async fn album(_session: Session, State(context): State<ServerContext>) -> Json<Album> {
    Json(context.album.to_serialized())
}

pub fn router() -> Router {
    Router::new().route("/", get(album))
}

#[cfg(test)]
mod test {
    use std::fs;

    use encore_core::{AlbumManifest, BoxedTransport, Track};
    use encore_impls::LocalFileTransport;

    use super::unsupported_tracks;

    fn track(key: &str, file: &str) -> Track {
        Track {
            key: key.to_string(),
            title: key.to_string(),
            file: file.to_string(),
        }
    }

    #[test]
    fn manifests_are_checked_against_the_transports() {
        let root = std::env::temp_dir().join("encore-album-check");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("present.mp3"), b"not real audio").unwrap();

        let transports = vec![BoxedTransport::new(LocalFileTransport::new(&root))];

        let manifest = AlbumManifest {
            title: "Dreams in Transit".to_string(),
            artist: "The Wandering".to_string(),
            tracks: vec![
                track("present", "present.mp3"),
                track("missing", "missing.mp3"),
            ],
        };

        assert_eq!(
            unsupported_tracks(&manifest, &transports),
            vec!["missing".to_string()]
        );
    }
}
