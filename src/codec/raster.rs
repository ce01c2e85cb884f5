use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage, imageops::FilterType};

use crate::foundation::core::Canvas;

/// Flatten straight-alpha RGBA8 over an opaque background color.
pub fn flatten_to_rgb(src: &RgbaImage, bg_rgba: [u8; 4]) -> RgbImage {
    let (width, height) = src.dimensions();
    let mut out = RgbImage::new(width, height);
    for (d, s) in out.pixels_mut().zip(src.pixels()) {
        let [r, g, b, _] = flatten_px(s.0, bg_rgba);
        *d = Rgb([r, g, b]);
    }
    out
}

/// Draw `img` letterboxed and centered on an opaque canvas filled with `bg_rgba`.
pub fn fit_on_canvas(img: &DynamicImage, canvas: Canvas, bg_rgba: [u8; 4]) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(
        canvas.width,
        canvas.height,
        Rgba([bg_rgba[0], bg_rgba[1], bg_rgba[2], 255]),
    );

    let placement = canvas.place(img.width(), img.height());
    if placement.width == 0 || placement.height == 0 {
        return out;
    }

    let scaled = if (placement.width, placement.height) == (img.width(), img.height()) {
        img.to_rgba8()
    } else {
        img.resize_exact(placement.width, placement.height, FilterType::Triangle)
            .to_rgba8()
    };

    for (x, y, px) in scaled.enumerate_pixels() {
        let dst = out.get_pixel_mut(placement.x + x, placement.y + y);
        *dst = Rgba(flatten_px(px.0, bg_rgba));
    }
    out
}

fn flatten_px(s: [u8; 4], bg_rgba: [u8; 4]) -> [u8; 4] {
    let a = s[3] as u16;
    if a == 255 {
        return [s[0], s[1], s[2], 255];
    }

    let inv = 255u16 - a;
    let r = mul_div255(s[0] as u16, a) + mul_div255(bg_rgba[0] as u16, inv);
    let g = mul_div255(s[1] as u16, a) + mul_div255(bg_rgba[1] as u16, inv);
    let b = mul_div255(s[2] as u16, a) + mul_div255(bg_rgba[2] as u16, inv);

    [r.min(255) as u8, g.min(255) as u8, b.min(255) as u8, 255]
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/codec/raster.rs"]
mod tests;
