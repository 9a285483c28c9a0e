pub mod compression;
pub mod image;

use log::*;
use std::io::Write;

pub use crate::compression::palette::{Color, Palette};
pub use crate::compression::Encoding;
pub use crate::image::format::ImageRecord;
pub use crate::image::options::ConvertOptions;
pub use crate::image::{decode, encode, encode_pixels};

pub fn init_logging() {
    let result = env_logger::Builder::new()
        .target(env_logger::Target::Stderr)
        .filter(Some("lib_sprite"), LevelFilter::Debug)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .try_init();

    if let Err(e) = result {
        debug!("Logger already installed, keeping it: {}", e);
    }
}
