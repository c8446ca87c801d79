use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use stickerpro::{
    BackgroundRemover, CornerKeyRemover, Error, OutlineParams, PassthroughRemover, Pipeline,
    ProcessingParams, api,
};

struct FailingRemover;

impl BackgroundRemover for FailingRemover {
    fn name(&self) -> &str {
        "failing"
    }

    fn remove(&self, _image: &DynamicImage) -> stickerpro::Result<RgbaImage> {
        Err(Error::Model("model crashed".to_string()))
    }
}

fn product_shot(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let in_subject = x > width / 4 && x < width * 3 / 4 && y > height / 3 && y < height * 2 / 3;
        if in_subject {
            Rgb([(x % 200) as u8, 60, (y % 200) as u8])
        } else {
            Rgb([245, 245, 245])
        }
    })
}

fn encode(img: &RgbImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut buf, format)
        .unwrap();
    buf.into_inner()
}

fn pipeline_with(remover: Box<dyn BackgroundRemover>, size: u32) -> Pipeline {
    Pipeline::new(
        remover,
        ProcessingParams {
            canvas_size: size,
            ..ProcessingParams::default()
        },
    )
    .unwrap()
}

#[test]
fn every_supported_format_yields_the_canvas_size() {
    let pipeline = pipeline_with(Box::new(CornerKeyRemover::default()), 128);
    let shots = [(300, 120), (90, 400), (64, 64), (7, 3)];
    for format in [ImageFormat::Png, ImageFormat::Jpeg, ImageFormat::Bmp, ImageFormat::Tiff] {
        for (w, h) in shots {
            let bytes = encode(&product_shot(w, h), format);
            let out = pipeline.process_bytes(&bytes).unwrap();
            assert_eq!(out.dimensions(), (128, 128), "{:?} {}x{}", format, w, h);
        }
    }
}

#[test]
fn failing_model_still_produces_a_sticker() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("shot.jpg");
    let output = dir.path().join("shot_processed.png");
    std::fs::write(&input, encode(&product_shot(200, 100), ImageFormat::Jpeg)).unwrap();

    let pipeline = pipeline_with(Box::new(FailingRemover), 64);
    api::process_file_to_path(&pipeline, &input, &output).unwrap();

    let out = image::open(&output).unwrap();
    assert_eq!((out.width(), out.height()), (64, 64));
    // Fallback keeps the opaque source, so the canvas centre is opaque
    assert!(out.to_rgba8().get_pixel(32, 32)[3] > 250);
}

#[test]
fn processing_is_deterministic() {
    let bytes = encode(&product_shot(240, 160), ImageFormat::Png);
    let pipeline = pipeline_with(Box::new(CornerKeyRemover::default()), 96);

    let first = api::process_bytes_to_png(&pipeline, &bytes).unwrap();
    let second = api::process_bytes_to_png(&pipeline, &bytes).unwrap();
    assert_eq!(first, second);

    let other = pipeline_with(Box::new(CornerKeyRemover::default()), 96);
    assert_eq!(api::process_bytes_to_png(&other, &bytes).unwrap(), first);
}

#[test]
fn background_becomes_transparent_and_outline_is_drawn() {
    let params = ProcessingParams {
        canvas_size: 100,
        crop_to_content: true,
        outline: Some(OutlineParams {
            width: 4,
            color: [235, 225, 215, 255],
        }),
    };
    let pipeline = Pipeline::new(Box::new(CornerKeyRemover::default()), params).unwrap();

    let mut src = RgbaImage::from_pixel(80, 80, Rgba([255, 255, 255, 255]));
    for y in 20..60 {
        for x in 30..50 {
            src.put_pixel(x, y, Rgba([20, 120, 40, 255]));
        }
    }
    let out = pipeline.process(&DynamicImage::ImageRgba8(src));

    // 20x40 subject is scaled to 50x100 and centered horizontally
    assert_eq!(out.get_pixel(0, 50)[3], 0);
    assert!(out.get_pixel(50, 50)[3] > 250);
    let ring = out.get_pixel(23, 50);
    assert!(ring[3] > 0, "outline expected left of the subject, got {:?}", ring);
}

#[test]
fn passthrough_without_crop_letterboxes_the_whole_frame() {
    let params = ProcessingParams {
        canvas_size: 50,
        crop_to_content: false,
        outline: None,
    };
    let pipeline = Pipeline::new(Box::new(PassthroughRemover), params).unwrap();
    let out = pipeline.process(&DynamicImage::ImageRgb8(product_shot(100, 50)));

    assert_eq!(out.dimensions(), (50, 50));
    assert_eq!(out.get_pixel(25, 5)[3], 0);
    assert!(out.get_pixel(25, 25)[3] > 250);
}
