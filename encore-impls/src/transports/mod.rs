use std::path::PathBuf;

use encore_core::{BoxedTransport, TransportError, Transports};
use symphonia::core::{
    formats::FormatOptions,
    io::{MediaSource, MediaSourceStream},
    meta::MetadataOptions,
    probe::Hint,
};

mod local_file;
mod network_stream;

pub use local_file::*;
pub use network_stream::*;

/// Returns every transport this process can construct, in preference order.
///
/// Which one handles a given source is decided by [AudioTransport::supports],
/// so callers never inspect the concrete types.
///
/// [AudioTransport::supports]: encore_core::AudioTransport::supports
pub fn available_transports<P>(media_root: P) -> Transports
where
    P: Into<PathBuf>,
{
    vec![
        BoxedTransport::new(LocalFileTransport::new(media_root)),
        BoxedTransport::new(NetworkStreamTransport::new()),
    ]
}

pub(crate) fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Best-effort file extension, used only as a probe hint.
pub(crate) fn extension_of(source: &str) -> Option<&str> {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    path.rsplit_once('.').map(|(_, extension)| extension)
}

/// Probes the media with symphonia and calculates its duration in seconds.
pub(crate) fn probe_duration(
    source: Box<dyn MediaSource>,
    extension: Option<&str>,
) -> Result<f32, TransportError> {
    let stream = MediaSourceStream::new(source, Default::default());

    let mut hint = Hint::new();

    if let Some(extension) = extension {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            stream,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| TransportError::Load(e.to_string()))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| TransportError::Load("no playable track in media".to_string()))?;

    let params = &track.codec_params;

    let duration = params
        .time_base
        .zip(params.n_frames)
        .map(|(time_base, n_frames)| {
            let time = time_base.calc_time(n_frames);
            time.seconds as f32 + time.frac as f32
        })
        .unwrap_or(0.);

    Ok(duration)
}

#[cfg(test)]
mod test {
    use super::{extension_of, is_url};

    #[test]
    fn url_detection() {
        assert!(is_url("https://cdn.example.com/a.mp3"));
        assert!(is_url("http://cdn.example.com/a.mp3"));
        assert!(!is_url("audio/a.mp3"));
        assert!(!is_url("/var/media/a.mp3"));
    }

    #[test]
    fn extension_hints() {
        assert_eq!(extension_of("audio/opening.mp3"), Some("mp3"));
        assert_eq!(
            extension_of("https://cdn.example.com/a.ogg?token=1"),
            Some("ogg")
        );
        assert_eq!(extension_of("noext"), None);
    }
}
