//! End-to-end behaviour of the edit pipeline.

use image::{imageops, Rgb, RgbImage};
use scanroom_core::{
    validate, EditError, EditOps, FilterMode, FilterParams, ImageBuffer, Pipeline,
    PipelineConfig, PixelFormat, Point,
};

/// RGB page whose pixels encode their own coordinates.
fn page_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x * 3 + y * 5) % 256) as u8])
    })
}

fn page(width: u32, height: u32) -> ImageBuffer {
    ImageBuffer::from_rgb_image(page_rgb(width, height)).unwrap()
}

fn rect_crop(left: f64, top: f64, right: f64, bottom: f64) -> [Point; 4] {
    [
        Point::new(left, top),
        Point::new(right, top),
        Point::new(right, bottom),
        Point::new(left, bottom),
    ]
}

/// Mean squared deviation of each pixel from its 3x3 neighbourhood mean.
fn roughness(img: &ImageBuffer) -> f64 {
    let (w, h) = img.dimensions();
    let mut total = 0.0;
    let mut count = 0usize;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut sum = 0.0;
            for dy in 0..3 {
                for dx in 0..3 {
                    sum += img.pixel(x + dx - 1, y + dy - 1)[0] as f64;
                }
            }
            let d = img.pixel(x, y)[0] as f64 - sum / 9.0;
            total += d * d;
            count += 1;
        }
    }
    total / count as f64
}

#[test]
fn neutral_descriptor_is_identity() {
    let source = page(64, 48);
    let out = Pipeline::default()
        .run(source.clone(), &EditOps::new())
        .unwrap();
    assert_eq!(out, source);
}

#[test]
fn neutral_filter_is_idempotent() {
    let source = page(32, 32);
    let ops = EditOps::new().with_filter(FilterParams::default());
    let pipeline = Pipeline::default();

    let once = pipeline.run(source.clone(), &ops).unwrap();
    let twice = pipeline.run(once.clone(), &ops).unwrap();
    assert_eq!(once, source);
    assert_eq!(twice, once);
}

#[test]
fn four_quarter_turns_restore_the_page() {
    let source = page(37, 21);
    let pipeline = Pipeline::default();
    let ops = EditOps::new().with_rotate(90);

    let mut current = source.clone();
    for _ in 0..4 {
        current = pipeline.run(current, &ops).unwrap();
    }
    assert_eq!(current, source);
}

#[test]
fn malformed_crops_are_rejected_before_pixel_work() {
    let cases: Vec<Vec<Point>> = vec![
        // Three points.
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ],
        // Five points.
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(5.0, 12.0),
            Point::new(0.0, 10.0),
        ],
        // Two coincident corners.
        vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ],
    ];

    for points in cases {
        let ops = EditOps {
            crop: Some(points),
            ..EditOps::default()
        };
        let result = Pipeline::default().run(page(20, 20), &ops);
        assert!(
            matches!(result, Err(EditError::InvalidGeometry(_))),
            "unexpected {result:?}"
        );
    }
}

#[test]
fn out_of_range_values_are_clamped() {
    let ops = EditOps::new().with_filter(FilterParams {
        contrast: 5.0,
        brightness: -3.0,
        ..FilterParams::default()
    });
    let validated = validate(&ops).unwrap();
    assert_eq!(validated.filter().contrast, 2.0);
    assert_eq!(validated.filter().brightness, -1.0);

    let normalized = validated.to_edit_ops();
    assert_eq!(normalized.filter.contrast, 2.0);
    assert_eq!(normalized.filter.brightness, -1.0);
}

#[test]
fn gray_card_crop_rotate_gray() {
    let source = ImageBuffer::filled(100, 100, PixelFormat::Rgb8, &[128, 128, 128]).unwrap();
    let ops = EditOps::new()
        .with_crop(rect_crop(10.0, 10.0, 90.0, 90.0))
        .with_rotate(90)
        .with_filter(FilterParams {
            mode: FilterMode::Gray,
            ..FilterParams::default()
        });

    let out = Pipeline::default().run(source, &ops).unwrap();
    assert_eq!(out.dimensions(), (80, 80));
    assert_eq!(out.format(), PixelFormat::Gray8);
    assert!(out.pixels().iter().all(|&v| v.abs_diff(128) <= 1));
}

#[test]
fn rectangle_crop_matches_plain_crop() {
    let rgb = page_rgb(60, 45);
    let expected =
        ImageBuffer::from_rgb_image(imageops::crop_imm(&rgb, 7, 5, 40, 30).to_image()).unwrap();
    let source = ImageBuffer::from_rgb_image(rgb).unwrap();
    let ops = EditOps::new().with_crop(rect_crop(7.0, 5.0, 47.0, 35.0));

    let exported = Pipeline::new(PipelineConfig::export())
        .run(source.clone(), &ops)
        .unwrap();
    assert_eq!(exported, expected);

    // Bilinear previews may land one level off through blend rounding.
    let preview = Pipeline::new(PipelineConfig::preview())
        .run(source, &ops)
        .unwrap();
    assert_eq!(preview.dimensions(), (40, 30));
    assert!(preview
        .pixels()
        .iter()
        .zip(expected.pixels())
        .all(|(a, b)| a.abs_diff(*b) <= 1));
}

#[test]
fn reversed_winding_crop_is_rejected() {
    // The same rectangle listed counter-clockwise on screen would come out
    // transposed, so it is refused rather than silently mirrored.
    let ops = EditOps::new().with_crop([
        Point::new(10.0, 10.0),
        Point::new(10.0, 50.0),
        Point::new(90.0, 50.0),
        Point::new(90.0, 10.0),
    ]);
    let result = Pipeline::default().run(page(100, 60), &ops);
    assert!(
        matches!(result, Err(EditError::InvalidGeometry(_))),
        "unexpected {result:?}"
    );

    let clockwise = EditOps::new().with_crop(rect_crop(10.0, 10.0, 90.0, 50.0));
    let out = Pipeline::default().run(page(100, 60), &clockwise).unwrap();
    assert_eq!(out.dimensions(), (80, 40));
}

#[test]
fn denoise_reduces_noise_monotonically() {
    let mut state: u32 = 987_654_321;
    let pixels: Vec<u8> = (0..48 * 48)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            90 + ((state >> 24) % 71) as u8
        })
        .collect();
    let source = ImageBuffer::new(48, 48, PixelFormat::Gray8, pixels).unwrap();
    let pipeline = Pipeline::default();

    let mut previous = roughness(&source);
    let initial = previous;
    for strength in [0.3, 0.6, 1.0] {
        let out = pipeline
            .run(source.clone(), &EditOps::new().with_denoise(strength))
            .unwrap();
        assert_eq!(out.dimensions(), source.dimensions());

        let current = roughness(&out);
        assert!(
            current < previous,
            "strength {strength}: {current} >= {previous}"
        );
        previous = current;
    }
    assert!(previous < initial / 2.0);
}

#[test]
fn bw_export_is_binary() {
    let ops = EditOps::new()
        .with_crop(rect_crop(2.0, 2.0, 50.0, 40.0))
        .with_deskew(1.5)
        .with_filter(FilterParams {
            mode: FilterMode::Bw,
            ..FilterParams::default()
        });
    let out = Pipeline::new(PipelineConfig::export())
        .run(page(60, 45), &ops)
        .unwrap();

    assert_eq!(out.dimensions(), (48, 38));
    assert_eq!(out.format(), PixelFormat::Gray8);
    assert!(out.pixels().iter().all(|&v| v == 0 || v == 255));
}

#[test]
fn normalized_descriptor_reproduces_output() {
    let ops = EditOps::new()
        .with_crop([
            Point::new(4.0, 6.0),
            Point::new(52.0, 3.0),
            Point::new(55.0, 41.0),
            Point::new(2.0, 38.0),
        ])
        .with_rotate(180)
        .with_filter(FilterParams {
            mode: FilterMode::ColorBoost,
            contrast: 9.0,
            ..FilterParams::default()
        });
    let pipeline = Pipeline::default();

    let normalized = validate(&ops).unwrap().to_edit_ops();
    let a = pipeline.run(page(60, 45), &ops).unwrap();
    let b = pipeline.run(page(60, 45), &normalized).unwrap();
    assert_eq!(a, b);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn image_strategy() -> impl Strategy<Value = ImageBuffer> {
        (1u32..=32, 1u32..=32, prop::bool::ANY).prop_flat_map(|(w, h, gray)| {
            let format = if gray {
                PixelFormat::Gray8
            } else {
                PixelFormat::Rgb8
            };
            let len = (w * h) as usize * format.channels();
            prop::collection::vec(any::<u8>(), len)
                .prop_map(move |pixels| ImageBuffer::new(w, h, format, pixels).unwrap())
        })
    }

    proptest! {
        #[test]
        fn prop_neutral_run_is_identity(img in image_strategy()) {
            let out = Pipeline::default().run(img.clone(), &EditOps::new()).unwrap();
            prop_assert_eq!(out, img);
        }

        #[test]
        fn prop_rotation_closure(
            img in image_strategy(),
            degrees in prop::sample::select(vec![90, 180, 270]),
        ) {
            let pipeline = Pipeline::default();
            let ops = EditOps::new().with_rotate(degrees);
            let mut current = img.clone();
            for _ in 0..4 {
                current = pipeline.run(current, &ops).unwrap();
            }
            prop_assert_eq!(current, img);
        }

        #[test]
        fn prop_photometric_keeps_dimensions(
            img in image_strategy(),
            deskew in -45.0f32..=45.0,
            denoise in 0.0f32..=1.0,
            contrast in 0.0f32..=2.0,
        ) {
            let ops = EditOps::new()
                .with_deskew(deskew)
                .with_denoise(denoise)
                .with_filter(FilterParams { contrast, ..FilterParams::default() });
            let out = Pipeline::default().run(img.clone(), &ops).unwrap();
            prop_assert_eq!(out.dimensions(), img.dimensions());
            prop_assert_eq!(out.format(), img.format());
        }
    }
}
