pub mod decoder;
pub mod encoder;
pub mod format;
pub mod options;
pub mod source;

pub use decoder::decode;
pub use encoder::{encode, encode_pixels};
