/// Local filesystem transport with optional gzip decoding.
pub mod fs;

pub use fs::{Compression, LineReader, LineStream};
