use std::path::{Path, PathBuf};

use image::DynamicImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::data::augment::AugmentConfig;
use crate::data::dataset::Dataset;
use crate::data::image_folder::{FolderDataset, ImageFolder};
use crate::data::preprocess::save_image;
use crate::error::{Error, Result};
use crate::network::artifact::ModelArtifact;
use crate::network::metadata::InputShape;
use crate::train::epoch_stats::TrainingHistory;
use crate::train::loop_fn::{final_evaluation, train_loop};
use crate::train::plot::render_history;
use crate::train::train_config::TrainConfig;

/// Everything a finished run produced.
#[derive(Debug)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub history: TrainingHistory,
    pub model_path: PathBuf,
    pub history_json: PathBuf,
    pub history_plot: PathBuf,
}

/// `<dir>/<stem><suffix>` next to the model file.
fn sibling(model: &Path, suffix: &str) -> PathBuf {
    let stem = model.file_stem().and_then(|s| s.to_str()).unwrap_or("model");
    model.with_file_name(format!("{stem}{suffix}"))
}

/// Trains a classifier on a directory-per-class root and writes the model
/// artifact to `output`, with `<stem>_history.json` and `<stem>_history.png`
/// beside it.
///
/// Not resumable: any load failure aborts the run before anything is written.
pub fn train_classifier(root: &Path, output: &Path, input: InputShape, config: &TrainConfig) -> Result<TrainingOutcome> {
    config.validate()?;
    let folder = ImageFolder::scan(root)?;
    let (train_samples, val_samples) = folder.split(config.validation_split);
    if train_samples.is_empty() {
        return Err(Error::InsufficientData(format!(
            "validation split of {} leaves no training images under {}",
            config.validation_split,
            root.display()
        )));
    }
    info!(train = train_samples.len(), validation = val_samples.len(), "split dataset");

    let train = FolderDataset::new(train_samples, input, config.augmentation.clone());
    let validation = if val_samples.is_empty() {
        None
    } else {
        Some(FolderDataset::new(val_samples, input, AugmentConfig::none()))
    };

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut network = config.network_spec(input, folder.labels.len()).build(&mut rng)?;
    info!(
        layers = network.layers.len(),
        parameters = network.parameter_count(),
        classes = folder.labels.len(),
        "built classifier"
    );

    let mut optimizer = config.optimizer.build(config.learning_rate);
    let val_dataset = validation.as_ref().map(|v| v as &dyn Dataset);
    let mut history = train_loop(&mut network, &train, val_dataset, optimizer.as_mut(), config, &mut rng)?;
    history.final_evaluation = Some(final_evaluation(&network, &train, val_dataset, config.loss_type)?);

    let name = output.file_stem().and_then(|s| s.to_str()).unwrap_or("model").to_owned();
    let artifact = ModelArtifact::new(name, input, folder.labels.clone(), network)?;
    artifact.save(output)?;

    let history_json = sibling(output, "_history.json");
    history.save_json(&history_json)?;
    let history_plot = sibling(output, "_history.png");
    save_image(&DynamicImage::ImageRgb8(render_history(&history)), &history_plot)?;
    info!(model = %output.display(), plot = %history_plot.display(), "training finished");

    Ok(TrainingOutcome {
        artifact,
        history,
        model_path: output.to_path_buf(),
        history_json,
        history_plot,
    })
}
