//! The `hangar inspect` command: validation and EXIF only, nothing written.

use anyhow::Context;
use clap::Args;
use hangar_core::{Config, FileClass, MetadataExtractor, Validator};
use std::path::PathBuf;

use super::{expand_path, file_name};

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image or RAW file to inspect
    #[arg(required = true)]
    pub file: PathBuf,
}

/// Execute the inspect command.
pub async fn execute(args: InspectArgs, config: Config) -> anyhow::Result<()> {
    let path = expand_path(&args.file);
    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let name = file_name(&path)?;

    let validator = Validator::new(config.limits.clone(), config.formats.clone());
    let class = classify(&validator, &name);
    validator.validate(class, &name, data.len() as u64, &data)?;
    tracing::debug!("{} accepted as {:?}", name, class);

    let metadata = MetadataExtractor::extract(&data);
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

/// RAW when the extension is on the RAW allow-list, otherwise image.
fn classify(validator: &Validator, file_name: &str) -> FileClass {
    match Validator::extension(file_name) {
        Some(ext) if validator.allowed_extensions(FileClass::Raw).contains(&ext) => FileClass::Raw,
        _ => FileClass::Image,
    }
}
