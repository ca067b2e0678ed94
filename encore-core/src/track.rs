use serde::{Deserialize, Serialize};

/// A single album track.
///
/// Tracks are immutable and come from the album manifest, they are never
/// created or modified at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    /// A stable identifier used to attribute plays to this track
    pub key: String,
    /// Human readable title
    pub title: String,
    /// Where the media for this track lives.
    /// Either a local path or an http(s) url.
    pub file: String,
}

impl Track {
    #[cfg(test)]
    pub fn mock(key: &str) -> Self {
        Self {
            key: key.to_string(),
            title: key.to_string(),
            file: format!("{}.ogg", key),
        }
    }
}
