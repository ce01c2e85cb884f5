use std::io::Cursor;

use super::*;

fn png_bytes(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn from_bytes_sniffs_mime() {
    let img = EncodedImage::from_bytes(png_bytes(3, 2));
    assert_eq!(img.mime(), "image/png");
    assert_eq!(img.extension(), "png");
    assert_eq!(img.dimensions().unwrap(), (3, 2));

    let junk = EncodedImage::from_bytes(vec![1, 2, 3]);
    assert_eq!(junk.mime(), "application/octet-stream");
    assert_eq!(junk.extension(), "bin");
    assert!(junk.decode().is_err());
}

#[test]
fn data_url_is_self_describing() {
    let img = EncodedImage::new("image/jpeg", vec![0xff, 0xd8, 0xff]);
    let url = img.to_data_url();
    assert!(url.starts_with("data:image/jpeg;base64,"));

    let back = EncodedImage::from_data_url(&url).unwrap();
    assert_eq!(back, img);
}

#[test]
fn malformed_data_urls_are_rejected() {
    assert!(EncodedImage::from_data_url("http://example.com/a.png").is_err());
    assert!(EncodedImage::from_data_url("data:image/png;base64").is_err());
    assert!(EncodedImage::from_data_url("data:image/png,abc").is_err());
    assert!(EncodedImage::from_data_url("data:image/png;base64,@@@").is_err());
}

#[test]
fn serde_uses_data_url_string() {
    let img = EncodedImage::from_bytes(png_bytes(1, 1));
    let json = serde_json::to_string(&img).unwrap();
    assert!(json.starts_with("\"data:image/png;base64,"));

    let back: EncodedImage = serde_json::from_str(&json).unwrap();
    assert_eq!(back.bytes(), img.bytes());
    assert!(serde_json::from_str::<EncodedImage>("\"nope\"").is_err());
}

#[test]
fn debug_does_not_dump_bytes() {
    let img = EncodedImage::new("image/png", vec![0u8; 4096]);
    let dbg = format!("{img:?}");
    assert!(dbg.contains("len: 4096"));
    assert!(dbg.len() < 100);
}
