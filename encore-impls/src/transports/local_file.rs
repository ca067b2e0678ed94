use std::{
    fs::File,
    path::{Path, PathBuf},
};

use encore_core::{AudioTransport, TransportError};

use super::{extension_of, is_url, probe_duration};

/// Loads track media from files below a media root directory.
pub struct LocalFileTransport {
    root: PathBuf,
}

impl LocalFileTransport {
    pub fn new<P>(root: P) -> Self
    where
        P: Into<PathBuf>,
    {
        Self { root: root.into() }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        let path = Path::new(source);

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl AudioTransport for LocalFileTransport {
    fn supports(&self, source: &str) -> bool {
        !is_url(source) && self.resolve(source).is_file()
    }

    fn load(&self, source: &str) -> Result<f32, TransportError> {
        let file =
            File::open(self.resolve(source)).map_err(|e| TransportError::Load(e.to_string()))?;

        probe_duration(Box::new(file), extension_of(source))
    }
}

#[cfg(test)]
mod test {
    use encore_core::AudioTransport;

    use super::LocalFileTransport;

    #[test]
    fn urls_are_not_supported() {
        let transport = LocalFileTransport::new("/var/media");

        assert!(!transport.supports("https://cdn.example.com/a.mp3"));
    }

    #[test]
    fn missing_files_are_not_supported() {
        let transport = LocalFileTransport::new("/var/media");

        assert!(!transport.supports("definitely/not/here.mp3"));
    }
}
