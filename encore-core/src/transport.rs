use thiserror::Error;

/// Where a transport is in the lifecycle of the current source.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// A source is set but its metadata is not known yet.
    #[default]
    Loading,
    /// The source is playing and its position is advancing.
    Playing,
    /// The source is loaded but not advancing.
    Paused,
    /// The source played to its natural end.
    Ended,
}

#[derive(Debug, Error)]
pub enum TransportError {
    /// No available transport can handle this source
    #[error("unsupported source: {0}")]
    Unsupported(String),
    /// The source exists but its media could not be loaded
    #[error("could not load source: {0}")]
    Load(String),
}

/// Represents a media backend the player can load track sources with.
///
/// Which transport handles a source is decided by a capability check, never
/// by inspecting the transport's concrete type.
pub trait AudioTransport
where
    Self: 'static + Sync + Send,
{
    /// Returns true if this transport is able to load the given source.
    fn supports(&self, source: &str) -> bool;

    /// Loads the source, returning its duration in seconds.
    fn load(&self, source: &str) -> Result<f32, TransportError>;
}

/// The set of transports available to a player, in preference order.
pub type Transports = Vec<BoxedTransport>;

/// [AudioTransport] trait object.
pub struct BoxedTransport(Box<dyn AudioTransport>);

impl BoxedTransport {
    pub fn new<T>(transport: T) -> Self
    where
        T: AudioTransport,
    {
        BoxedTransport(Box::new(transport))
    }
}

impl AudioTransport for BoxedTransport {
    fn supports(&self, source: &str) -> bool {
        self.0.supports(source)
    }

    fn load(&self, source: &str) -> Result<f32, TransportError> {
        self.0.load(source)
    }
}
