mod transports;

pub use transports::*;
