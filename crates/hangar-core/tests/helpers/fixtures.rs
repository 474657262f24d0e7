//! In-process test images.

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

pub const TIFF_HEADER: &[u8] = &[b'I', b'I', 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 96])
    }))
}

pub fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut out, format)
        .expect("encode fixture");
    out.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

/// JPEG carrying an EXIF block with camera make and orientation.
pub fn jpeg_with_exif(width: u32, height: u32, make: &str, orientation: u16) -> Vec<u8> {
    let make = Field {
        tag: Tag::Make,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![make.as_bytes().to_vec()]),
    };
    let orientation = Field {
        tag: Tag::Orientation,
        ifd_num: In::PRIMARY,
        value: Value::Short(vec![orientation]),
    };
    let mut writer = Writer::new();
    writer.push_field(&make);
    writer.push_field(&orientation);
    let mut tiff = Cursor::new(Vec::new());
    writer.write(&mut tiff, false).expect("write exif");
    let tiff = tiff.into_inner();

    // SOI, then an APP1 "Exif" segment, then the rest of the encoded JPEG
    let body = jpeg(width, height);
    let segment_len = u16::try_from(2 + 6 + tiff.len()).expect("exif fits one segment");
    let mut out = Vec::with_capacity(body.len() + tiff.len() + 10);
    out.extend_from_slice(&body[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&body[2..]);
    out
}

/// Bytes that pass the RAW signature check for TIFF-based formats.
pub fn fake_raw() -> Vec<u8> {
    let mut raw = TIFF_HEADER.to_vec();
    raw.extend(std::iter::repeat(0xAB).take(256));
    raw
}
