//! Training curves rendered straight into an RGB image: accuracy on the left,
//! loss on the right, training in blue and validation in orange.

use image::{Rgb, RgbImage};

use crate::train::epoch_stats::TrainingHistory;

const PANEL_W: u32 = 400;
const PANEL_H: u32 = 300;
const MARGIN: u32 = 30;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const TRAIN: Rgb<u8> = Rgb([31, 119, 180]);
const VALIDATION: Rgb<u8> = Rgb([255, 127, 14]);

/// Bresenham line, clipped to the image.
fn draw_line(img: &mut RgbImage, from: (i64, i64), to: (i64, i64), color: Rgb<u8>) {
    let (mut x0, mut y0) = from;
    let (x1, y1) = to;
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    loop {
        if x0 >= 0 && y0 >= 0 && (x0 as u32) < img.width() && (y0 as u32) < img.height() {
            img.put_pixel(x0 as u32, y0 as u32, color);
        }
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// One chart: axes, horizontal grid lines, and a polyline per series.
/// Values are mapped from `[0, y_max]` onto the panel height.
fn draw_panel(img: &mut RgbImage, x_offset: u32, series: &[(&[f64], Rgb<u8>)], y_max: f64) {
    let left = (x_offset + MARGIN) as i64;
    let right = (x_offset + PANEL_W - MARGIN / 2) as i64;
    let top = (MARGIN / 2) as i64;
    let bottom = (PANEL_H - MARGIN) as i64;

    for step in 1..=4 {
        let y = bottom - (bottom - top) * step / 4;
        draw_line(img, (left, y), (right, y), GRID);
    }
    draw_line(img, (left, bottom), (right, bottom), AXIS);
    draw_line(img, (left, top), (left, bottom), AXIS);

    let y_max = if y_max > 0.0 { y_max } else { 1.0 };
    for (values, color) in series {
        let points: Vec<(i64, i64)> = values.iter().enumerate()
            .map(|(i, &v)| {
                let fx = if values.len() > 1 { i as f64 / (values.len() - 1) as f64 } else { 0.5 };
                let fy = (v / y_max).clamp(0.0, 1.0);
                (
                    left + (fx * (right - left) as f64).round() as i64,
                    bottom - (fy * (bottom - top) as f64).round() as i64,
                )
            })
            .collect();
        if let [single] = points.as_slice() {
            draw_line(img, *single, *single, *color);
        }
        for pair in points.windows(2) {
            draw_line(img, pair[0], pair[1], *color);
        }
    }
}

/// Renders accuracy and loss against epoch for both splits.
pub fn render_history(history: &TrainingHistory) -> RgbImage {
    let mut img = RgbImage::from_pixel(PANEL_W * 2, PANEL_H, BACKGROUND);

    let train_acc: Vec<f64> = history.epochs.iter().map(|e| e.train_accuracy).collect();
    let val_acc: Vec<f64> = history.epochs.iter().filter_map(|e| e.val_accuracy).collect();
    let train_loss: Vec<f64> = history.epochs.iter().map(|e| e.train_loss).collect();
    let val_loss: Vec<f64> = history.epochs.iter().filter_map(|e| e.val_loss).collect();

    draw_panel(&mut img, 0, &[(train_acc.as_slice(), TRAIN), (val_acc.as_slice(), VALIDATION)], 1.0);

    let loss_max = train_loss.iter().chain(val_loss.iter()).cloned().fold(0.0, f64::max) * 1.05;
    draw_panel(&mut img, PANEL_W, &[(train_loss.as_slice(), TRAIN), (val_loss.as_slice(), VALIDATION)], loss_max);

    img
}
