mod config;
mod events;
mod playback;
mod queuing;
mod track;
mod transport;
mod util;

pub use config::*;
pub use events::*;
pub use playback::*;
pub use queuing::*;
pub use track::*;
pub use transport::*;
pub use util::*;
