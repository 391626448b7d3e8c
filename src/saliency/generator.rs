use std::path::{Path, PathBuf};

use image::DynamicImage;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::data::files::list_images;
use crate::data::preprocess::{load_image, save_image, to_input_tensor};
use crate::error::{Error, Result};
use crate::math::tensor::Tensor;
use crate::network::artifact::ModelArtifact;
use crate::saliency::map::SaliencyMap;
use crate::saliency::render::{heatmap, overlay};
use crate::saliency::saliency_config::SaliencyConfig;

/// Saliency of class `class_index` for a preprocessed input.
///
/// The scalar explained is the class probability `p_k`; its gradient with
/// respect to the logits is `p_k (e_k - p)`, which is pushed back to the
/// input pixels.
pub fn saliency_map(artifact: &ModelArtifact, input: &Tensor, class_index: usize) -> Result<SaliencyMap> {
    let count = artifact.labels.len();
    if class_index >= count {
        return Err(Error::ClassIndex { index: class_index, count });
    }
    let network = &artifact.network;
    let trace = network.trace(input);
    let p = &trace.output;
    let grad_logits: Vec<f64> = p.iter().enumerate()
        .map(|(j, &pj)| p[class_index] * (if j == class_index { 1.0 } else { 0.0 } - pj))
        .collect();
    let grad = network.input_gradient(&trace, grad_logits);
    Ok(SaliencyMap::from_gradients(&grad))
}

/// Map at model resolution for a decoded image.
pub fn image_saliency(artifact: &ModelArtifact, img: &DynamicImage, class_index: usize) -> Result<SaliencyMap> {
    saliency_map(artifact, &to_input_tensor(img, artifact.input), class_index)
}

/// Files produced by `saliency_folder`.
#[derive(Debug, Clone)]
pub struct SaliencyBatch {
    pub overlays: Vec<PathBuf>,
    pub averaged: PathBuf,
    pub averaged_map: SaliencyMap,
}

/// `saliency_<file name>.png`; the full name keeps `face.png` and `face.bmp`
/// apart.
pub fn overlay_path(output_dir: &Path, image: &Path) -> PathBuf {
    let name = image.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    output_dir.join(format!("saliency_{name}.png"))
}

/// Per-image work of the batch: map, overlay at the original size, save.
fn process_one(
    artifact: &ModelArtifact,
    path: &Path,
    class_index: usize,
    output_dir: &Path,
    config: &SaliencyConfig,
) -> Result<(SaliencyMap, PathBuf)> {
    let img = load_image(path)?;
    let map = image_saliency(artifact, &img, class_index)?;
    let blended = overlay(&img.to_rgb8(), &map, config.overlay_alpha);
    let out = overlay_path(output_dir, path);
    save_image(&DynamicImage::ImageRgb8(blended), &out)?;
    Ok((map, out))
}

/// Writes an overlay for every image in `folder` and the class average of
/// all maps into `output_dir`.  Images that fail are logged and skipped.
pub fn saliency_folder(
    artifact: &ModelArtifact,
    folder: &Path,
    class_index: usize,
    output_dir: &Path,
    config: &SaliencyConfig,
) -> Result<SaliencyBatch> {
    config.validate()?;
    if class_index >= artifact.labels.len() {
        return Err(Error::ClassIndex { index: class_index, count: artifact.labels.len() });
    }
    let paths = list_images(folder)?;
    std::fs::create_dir_all(output_dir)?;

    let done: Vec<(SaliencyMap, PathBuf)> = paths
        .par_iter()
        .filter_map(|path| match process_one(artifact, path, class_index, output_dir, config) {
            Ok(result) => {
                info!(image = %path.display(), output = %result.1.display(), "saliency overlay written");
                Some(result)
            }
            Err(e) => {
                warn!(image = %path.display(), error = %e, "skipping image");
                None
            }
        })
        .collect();

    let (maps, overlays): (Vec<SaliencyMap>, Vec<PathBuf>) = done.into_iter().unzip();
    if maps.is_empty() {
        return Err(Error::InsufficientData(format!(
            "no saliency maps could be generated from {}",
            folder.display()
        )));
    }
    let averaged_map = SaliencyMap::average(
        &maps,
        config.standard_width as usize,
        config.standard_height as usize,
    )?;
    let averaged = output_dir.join(&config.averaged_file);
    save_image(&DynamicImage::ImageRgb8(heatmap(&averaged_map)), &averaged)?;
    info!(
        class = artifact.labels.get(class_index).unwrap_or_default(),
        maps = maps.len(),
        path = %averaged.display(),
        "averaged saliency map written"
    );
    Ok(SaliencyBatch { overlays, averaged, averaged_map })
}
