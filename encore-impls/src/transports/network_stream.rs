use std::{io::Cursor, time::Duration};

use encore_core::{AudioTransport, TransportError};
use log::warn;
use reqwest::blocking::Client;

use super::{extension_of, is_url, probe_duration};

/// Loads track media over http(s).
///
/// The body is fetched in full before probing. Album tracks are small enough
/// that this is cheaper than teaching the prober to stream.
pub struct NetworkStreamTransport {
    client: Client,
}

impl NetworkStreamTransport {
    const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Self::FETCH_TIMEOUT)
            .build()
            .expect("client is built");

        Self { client }
    }
}

impl Default for NetworkStreamTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioTransport for NetworkStreamTransport {
    fn supports(&self, source: &str) -> bool {
        is_url(source)
    }

    fn load(&self, source: &str) -> Result<f32, TransportError> {
        let response = self
            .client
            .get(source)
            .send()
            .map_err(|e| TransportError::Load(e.to_string()))?;

        let status = response.status();

        if !status.is_success() {
            warn!("stream request for {} failed with {}", source, status);

            return Err(TransportError::Load(format!(
                "stream request failed with {}",
                status
            )));
        }

        let bytes = response
            .bytes()
            .map_err(|e| TransportError::Load(e.to_string()))?;

        probe_duration(Box::new(Cursor::new(bytes.to_vec())), extension_of(source))
    }
}

#[cfg(test)]
mod test {
    use encore_core::AudioTransport;

    use super::NetworkStreamTransport;

    #[test]
    fn only_urls_are_supported() {
        let transport = NetworkStreamTransport::new();

        assert!(transport.supports("https://cdn.example.com/a.mp3"));
        assert!(!transport.supports("audio/a.mp3"));
    }
}
