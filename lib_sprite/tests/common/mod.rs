#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

pub const MAGENTA: [u8; 4] = [255, 0, 255, 255];
pub const WHITE: [u8; 4] = [255, 255, 255, 255];
pub const BLACK: [u8; 4] = [0, 0, 0, 255];

pub fn to_png(image: RgbaImage) -> Vec<u8> {
    let mut png = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .unwrap();
    png
}

/// 16x16 sprite: magenta background with a white frame and a black centre.
pub fn sprite() -> RgbaImage {
    RgbaImage::from_fn(16, 16, |x, y| {
        if x == 0 || y == 0 || x == 15 || y == 15 {
            Rgba(WHITE)
        } else if (6..10).contains(&x) && (6..10).contains(&y) {
            Rgba(BLACK)
        } else {
            Rgba(MAGENTA)
        }
    })
}

/// Every pixel a distinct grey, 16x16 = 256 colours.
pub fn gradient() -> RgbaImage {
    RgbaImage::from_fn(16, 16, |x, y| {
        let v = (y * 16 + x) as u8;
        Rgba([v, v, v, 255])
    })
}

/// Repeating 5-colour diagonal stripes with no long runs.
pub fn stripes(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let v = (((x + y) % 5) * 50) as u8;
        Rgba([v, 255 - v, 0, 255])
    })
}

pub fn flat(width: u32, height: u32, color: [u8; 4]) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba(color))
}
