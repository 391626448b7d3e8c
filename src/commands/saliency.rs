//! `saliency`: overlays for one image or a class folder.

use std::path::PathBuf;

use anyhow::{Context, Result};
use image::DynamicImage;
use mugshot_origin::data::preprocess::{load_image, save_image};
use mugshot_origin::saliency::{image_saliency, overlay, overlay_path, saliency_folder};
use mugshot_origin::{Config, ModelArtifact};

pub fn execute(
    config: Config,
    path: PathBuf,
    model: PathBuf,
    class: String,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let artifact = ModelArtifact::load(&model)
        .with_context(|| format!("Failed to load model: {}", model.display()))?;
    let class_index = artifact.labels.resolve(&class)?;
    let label = artifact.labels.names()[class_index].clone();
    let output_dir = output_dir.unwrap_or_else(|| PathBuf::from("saliency_maps").join(&label));

    if path.is_dir() {
        let batch = saliency_folder(&artifact, &path, class_index, &output_dir, &config.saliency)
            .with_context(|| format!("Failed to generate saliency maps for {}", path.display()))?;
        for written in &batch.overlays {
            println!("Processed: {} for {} class", written.display(), label);
        }
        println!("Generated averaged saliency map: {}", batch.averaged.display());
    } else {
        std::fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;
        let img = load_image(&path)?;
        let map = image_saliency(&artifact, &img, class_index)?;
        let out = overlay_path(&output_dir, &path);
        let blended = overlay(&img.to_rgb8(), &map, config.saliency.overlay_alpha);
        save_image(&DynamicImage::ImageRgb8(blended), &out)?;
        println!("Saliency overlay saved to {}", out.display());
    }
    Ok(())
}
