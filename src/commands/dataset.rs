use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::{DatasetAction, DatasetArgs};
use crate::commands::load_catalog;
use crate::dataset::{DatasetManager, FileSlot, LoadOutcome, UploadFile};

pub fn run(args: DatasetArgs) -> Result<()> {
    let catalog = load_catalog(&args.cache_root, args.catalog_path.as_deref())?;
    let manager = DatasetManager::open(catalog, &args.cache_root)?;

    match args.action {
        DatasetAction::List => list(&manager),
        DatasetAction::Load { id } => load(&manager, &id),
        DatasetAction::Upload {
            race,
            insights,
            social,
            name,
        } => upload(&manager, race, insights, social, &name),
        DatasetAction::Delete { id } => delete(&manager, &id),
    }
}

fn list(manager: &DatasetManager) -> Result<()> {
    let datasets = manager.get_all_datasets()?;
    info!(count = datasets.len(), "datasets available");
    for dataset in datasets {
        info!(
            id = %dataset.id,
            name = %dataset.metadata.display_name,
            source = ?dataset.metadata.source,
            complete = dataset.is_complete(),
            has_insights = dataset.files.insights.is_some(),
            has_social = dataset.files.social.is_some(),
            "dataset"
        );
    }
    Ok(())
}

fn load(manager: &DatasetManager, id: &str) -> Result<()> {
    let outcome = manager.load_dataset(id);
    log_outcome(id, &outcome);
    if !outcome.success {
        bail!("dataset {id} failed to load");
    }
    Ok(())
}

fn upload(
    manager: &DatasetManager,
    race: Option<PathBuf>,
    insights: Option<PathBuf>,
    social: Option<PathBuf>,
    name: &str,
) -> Result<()> {
    let mut files = Vec::new();
    for (slot, path) in [
        (FileSlot::RaceAnalysis, race),
        (FileSlot::Insights, insights),
        (FileSlot::Social, social),
    ] {
        let Some(path) = path else {
            continue;
        };
        files.push((slot, read_upload(&path)?));
    }

    let outcome = manager.upload_files(name, &files);
    let id = outcome
        .dataset
        .as_ref()
        .map(|dataset| dataset.id.clone())
        .unwrap_or_default();
    log_outcome(&id, &outcome);
    if !outcome.success {
        bail!("upload rejected");
    }
    Ok(())
}

fn delete(manager: &DatasetManager, id: &str) -> Result<()> {
    if manager.delete_dataset(id)? {
        info!(id = %id, "deleted dataset");
    } else {
        warn!(id = %id, "dataset not deleted (preloaded or unknown id)");
    }
    Ok(())
}

fn read_upload(path: &Path) -> Result<UploadFile> {
    let content =
        fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(UploadFile {
        filename: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        content,
    })
}

fn log_outcome(id: &str, outcome: &LoadOutcome) {
    for error in &outcome.errors {
        warn!(id = %id, error = %error, "dataset error");
    }
    for warning in &outcome.warnings {
        warn!(id = %id, warning = %warning, "dataset warning");
    }
    if let Some(dataset) = &outcome.dataset {
        info!(
            id = %dataset.id,
            complete = dataset.is_complete(),
            success = outcome.success,
            "dataset outcome"
        );
    }
}
