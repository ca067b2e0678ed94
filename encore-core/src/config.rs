use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Track;

/// The configuration of the playback engine
#[derive(Debug, Clone)]
pub struct Config {
    /// How many times per second the position of a playing track is sampled
    pub position_updates_per_second: u32,
    /// If this is true, a track starts playing as soon as it finishes loading
    pub autoplay_on_change: bool,
    /// The volume a player starts out with, between 0 and 1
    pub default_volume: f32,
}

impl Config {
    /// How long the sampling thread waits between position updates
    pub fn sampling_interval(&self) -> Duration {
        Duration::from_secs(1) / self.position_updates_per_second
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            position_updates_per_second: 4,
            autoplay_on_change: false,
            default_volume: 0.8,
        }
    }
}

/// The album served by an encore instance, deserialized from a RON manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumManifest {
    pub title: String,
    pub artist: String,
    pub tracks: Vec<Track>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse manifest: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

impl AlbumManifest {
    pub fn from_ron(source: &str) -> Result<Self, ManifestError> {
        Ok(ron::from_str(source)?)
    }

    pub fn load<P>(path: P) -> Result<Self, ManifestError>
    where
        P: AsRef<Path>,
    {
        Self::from_ron(&fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod test {
    use super::AlbumManifest;

    #[test]
    fn parse_manifest() {
        let manifest = AlbumManifest::from_ron(
            r#"
            (
                title: "Dreams in Transit",
                artist: "The Wandering",
                tracks: [
                    (key: "opening", title: "Opening", file: "audio/opening.mp3"),
                    (key: "closing", title: "Closing", file: "audio/closing.mp3"),
                ],
            )
            "#,
        )
        .expect("manifest parses");

        assert_eq!(manifest.tracks.len(), 2);
        assert_eq!(manifest.tracks[0].key, "opening");
        assert_eq!(manifest.tracks[1].file, "audio/closing.mp3");
    }
}
