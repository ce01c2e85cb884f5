use super::*;

fn noise_image(w: u32, h: u32) -> DynamicImage {
    let mut state = 0x2545_f491_u32;
    let img = image::RgbImage::from_fn(w, h, |_, _| {
        let mut next = || {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        };
        image::Rgb([next(), next(), next()])
    });
    DynamicImage::ImageRgb8(img)
}

fn flat_image(w: u32, h: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        w,
        h,
        image::Rgba([40, 80, 120, 255]),
    ))
}

#[test]
fn scaled_dimensions_downscale_only() {
    assert_eq!(scaled_dimensions(1600, 900, 800), (800, 450));
    assert_eq!(scaled_dimensions(900, 1600, 800), (450, 800));
    assert_eq!(scaled_dimensions(100, 50, 800), (100, 50));
    assert_eq!(scaled_dimensions(800, 800, 800), (800, 800));
    assert_eq!(scaled_dimensions(4000, 1, 800), (800, 1));
}

#[test]
fn presets_match_capture_and_upload_profiles() {
    assert_eq!(NormalizePreset::CAPTURE.max_dimension, 800);
    assert_eq!(NormalizePreset::CAPTURE.jpeg_quality(), 55);
    assert_eq!(NormalizePreset::UPLOAD.max_dimension, 1280);
    assert_eq!(NormalizePreset::UPLOAD.jpeg_quality(), 70);
}

#[test]
fn invalid_parameters_are_rejected() {
    let img = flat_image(4, 4);
    assert!(matches!(
        normalize(img.clone().into(), 0, 0.5),
        Err(FlipbookError::Validation(_))
    ));
    assert!(matches!(
        normalize(img.clone().into(), 100, 0.0),
        Err(FlipbookError::Validation(_))
    ));
    assert!(matches!(
        normalize(img.into(), 100, 1.5),
        Err(FlipbookError::Validation(_))
    ));
}

#[test]
fn undecodable_input_is_image_decode_error() {
    let err = normalize(RawImage::Encoded(b"not an image".to_vec()), 800, 0.55).unwrap_err();
    assert!(matches!(err, FlipbookError::ImageDecode(_)));
}

#[test]
fn large_bitmap_is_downscaled_preserving_aspect() {
    let out = normalize_with(noise_image(1600, 900).into(), NormalizePreset::CAPTURE).unwrap();
    assert_eq!(out.dimensions().unwrap(), (800, 450));
}

#[test]
fn small_image_is_never_upscaled() {
    let out = normalize_with(noise_image(120, 60).into(), NormalizePreset::UPLOAD).unwrap();
    assert_eq!(out.dimensions().unwrap(), (120, 60));
}

#[test]
fn detailed_image_keeps_lossy_encoding() {
    let out = normalize(noise_image(128, 128).into(), 800, 0.55).unwrap();
    assert_eq!(out.mime(), "image/jpeg");
}

#[test]
fn size_guard_prefers_png_when_jpeg_is_larger() {
    // A tiny flat image compresses to a few dozen PNG bytes; any JPEG carries larger headers.
    let out = normalize(flat_image(4, 4).into(), 800, 0.55).unwrap();
    assert_eq!(out.mime(), "image/png");
    assert_eq!(out.decode().unwrap().to_rgba8().get_pixel(0, 0).0, [40, 80, 120, 255]);
}

#[test]
fn encoded_input_is_decoded_first() {
    let mut png = Vec::new();
    flat_image(10, 20)
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .unwrap();

    let out = normalize(RawImage::Encoded(png), 10, 0.7).unwrap();
    assert_eq!(out.dimensions().unwrap(), (5, 10));
}
