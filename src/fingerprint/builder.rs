use std::path::{Path, PathBuf};

use image::{DynamicImage, RgbImage};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::data::files::list_images;
use crate::data::preprocess::{load_image, RESIZE_FILTER};
use crate::error::{Error, Result};
use crate::fingerprint::color::ColorFingerprint;
use crate::fingerprint::fingerprint_config::FingerprintConfig;

/// Resizes to the canonical fingerprint resolution (skipped when already there).
pub fn canonical(img: &DynamicImage, config: &FingerprintConfig) -> RgbImage {
    let (w, h) = (config.canonical_width, config.canonical_height);
    if img.width() == w && img.height() == h {
        img.to_rgb8()
    } else {
        img.resize_exact(w, h, RESIZE_FILTER).to_rgb8()
    }
}

/// Mean (R, G, B) over the top rows of an already-canonical image.
pub fn top_region_average(img: &RgbImage, config: &FingerprintConfig) -> [f64; 3] {
    let rows = config.top_rows(img.height());
    let mut sum = [0.0; 3];
    for y in 0..rows {
        for x in 0..img.width() {
            let p = img.get_pixel(x, y).0;
            for c in 0..3 {
                sum[c] += p[c] as f64;
            }
        }
    }
    let n = (rows * img.width()).max(1) as f64;
    [sum[0] / n, sum[1] / n, sum[2] / n]
}

/// Decode, resize to canonical, and average the top region.
pub fn image_average(path: &Path, config: &FingerprintConfig) -> Result<[f64; 3]> {
    let img = load_image(path)?;
    Ok(top_region_average(&canonical(&img, config), config))
}

/// Averages every readable image, logging and skipping the rest.
/// Output order follows `paths`.
pub fn collect_averages(paths: &[PathBuf], config: &FingerprintConfig) -> Vec<(PathBuf, [f64; 3])> {
    paths
        .par_iter()
        .filter_map(|path| match image_average(path, config) {
            Ok(avg) => {
                debug!(image = %path.display(), r = avg[0], g = avg[1], b = avg[2], "top region average");
                Some((path.clone(), avg))
            }
            Err(e) => {
                warn!(image = %path.display(), error = %e, "skipping image");
                None
            }
        })
        .collect()
}

/// Builds a fingerprint from explicit reference paths.
pub fn build_fingerprint(paths: &[PathBuf], config: &FingerprintConfig) -> Result<ColorFingerprint> {
    config.validate()?;
    let averages: Vec<[f64; 3]> = collect_averages(paths, config).into_iter().map(|(_, a)| a).collect();
    if averages.is_empty() {
        return Err(Error::InsufficientData(format!(
            "none of the {} reference images could be read",
            paths.len()
        )));
    }
    info!(used = averages.len(), skipped = paths.len() - averages.len(), "built colour fingerprint");
    ColorFingerprint::from_averages(&averages)
}

/// Builds a fingerprint from every image in `folder` and saves it there as
/// `config.fingerprint_file`.  Returns the fingerprint and where it went.
pub fn build_folder_fingerprint(folder: &Path, config: &FingerprintConfig) -> Result<(ColorFingerprint, PathBuf)> {
    let paths = list_images(folder)?;
    if paths.is_empty() {
        return Err(Error::InsufficientData(format!("no images found in {}", folder.display())));
    }
    let fingerprint = build_fingerprint(&paths, config)?;
    let out = folder.join(&config.fingerprint_file);
    fingerprint.save(&out)?;
    info!(path = %out.display(), mean = ?fingerprint.mean, std = ?fingerprint.std, "saved fingerprint");
    Ok((fingerprint, out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn small_config() -> FingerprintConfig {
        FingerprintConfig {
            canonical_width: 8,
            canonical_height: 20,
            top_percentage: 10.0,
            ..FingerprintConfig::default()
        }
    }

    #[test]
    fn only_the_top_rows_are_averaged() {
        let cfg = small_config();
        let mut img = RgbImage::from_pixel(8, 20, Rgb([0, 0, 0]));
        for y in 0..2 {
            for x in 0..8 {
                img.put_pixel(x, y, Rgb([200, 100, 50]));
            }
        }
        assert_eq!(top_region_average(&img, &cfg), [200.0, 100.0, 50.0]);
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.png");
        RgbImage::from_pixel(8, 20, Rgb([10, 20, 30])).save(&good).unwrap();
        let bad = dir.path().join("b.png");
        std::fs::write(&bad, b"not an image").unwrap();

        let fp = build_fingerprint(&[good, bad], &small_config()).unwrap();
        assert_eq!(fp.mean, [10.0, 20.0, 30.0]);
        assert_eq!(fp.std, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn folder_without_images_is_insufficient() {
        let dir = tempfile::tempdir().unwrap();
        let err = build_folder_fingerprint(dir.path(), &small_config()).unwrap_err();
        assert!(matches!(err, Error::InsufficientData(_)));
        assert!(!dir.path().join("location_fingerprint.json").exists());
    }
}
