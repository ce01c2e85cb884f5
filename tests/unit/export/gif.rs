use std::io::Cursor;

use image::{AnimationDecoder, ImageFormat, Rgba, RgbaImage, codecs::gif::GifDecoder};

use super::*;
use crate::{
    codec::payload::EncodedImage,
    export::progress::NoopObserver,
    foundation::{core::Fps, time::RecordingPacer},
    store::frame::{Frame, FrameId},
};

fn png_frame(w: u32, h: u32, color: [u8; 4]) -> Frame {
    let img = RgbaImage::from_pixel(w, h, Rgba(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    Frame::new(
        FrameId::generate(),
        EncodedImage::new("image/png", out.into_inner()),
        0,
    )
}

fn job(frames: Vec<Frame>, fps: u32) -> ExportJob {
    ExportJob {
        frames,
        fps: Fps::new(fps).unwrap(),
        format: ExportFormat::Gif,
        app_name: "flipbook".into(),
        started_at: 42,
    }
}

#[test]
fn encodes_looping_gif_on_first_frame_canvas() {
    let frames = vec![
        png_frame(40, 30, [255, 0, 0, 255]),
        png_frame(30, 40, [0, 255, 0, 255]),
        png_frame(80, 60, [0, 0, 255, 128]),
    ];
    let mut observer = NoopObserver;
    let mut pacer = RecordingPacer::new();
    let mut ctx = StrategyContext::new(&mut observer, &mut pacer);

    let artifact = GifStrategy::default()
        .encode(&job(frames, 10), &mut ctx)
        .unwrap();

    assert_eq!(artifact.format, ExportFormat::Gif);
    assert_eq!(artifact.filenames(), vec!["flipbook-42.gif"]);
    let file = &artifact.files[0];
    assert_eq!(file.mime, "image/gif");
    assert!(file.bytes.starts_with(b"GIF89a"));

    let decoded = GifDecoder::new(Cursor::new(file.bytes.clone()))
        .unwrap()
        .into_frames()
        .collect_frames()
        .unwrap();
    assert_eq!(decoded.len(), 3);
    for f in &decoded {
        assert_eq!(f.buffer().dimensions(), (40, 30));
        let (numer, denom) = f.delay().numer_denom_ms();
        assert_eq!(numer / denom, 100);
    }
    assert!(ctx.progress() > 0.9);
}

#[test]
fn disabled_encoder_is_unavailable() {
    let strategy = GifStrategy {
        enabled: false,
        ..GifStrategy::default()
    };
    assert!(matches!(
        strategy.check_available(),
        Err(FlipbookError::EncodingUnavailable(_))
    ));
    assert!(GifStrategy::default().check_available().is_ok());
}

#[test]
fn undecodable_frame_fails_the_strategy() {
    let broken = Frame::new(
        FrameId::generate(),
        EncodedImage::new("image/png", vec![1, 2, 3]),
        0,
    );
    let mut observer = NoopObserver;
    let mut pacer = RecordingPacer::new();
    let mut ctx = StrategyContext::new(&mut observer, &mut pacer);

    let err = GifStrategy::default()
        .encode(&job(vec![broken], 12), &mut ctx)
        .unwrap_err();
    assert!(matches!(err, FlipbookError::ImageDecode(_)));
}
