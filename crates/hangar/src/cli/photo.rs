//! The `hangar show` and `hangar remove` commands.

use clap::Args;
use hangar_core::{Config, Hangar};

/// Arguments identifying a stored photo.
#[derive(Args, Debug)]
pub struct PhotoArgs {
    /// Photo id
    #[arg(required = true)]
    pub id: i64,
}

/// Print a stored photo as JSON.
pub async fn show(args: PhotoArgs, config: Config) -> anyhow::Result<()> {
    let hangar = Hangar::new(config).await?;
    let photo = hangar.photo(args.id).await?;
    println!("{}", serde_json::to_string_pretty(&photo)?);
    Ok(())
}

/// Delete a photo record and its files.
pub async fn remove(args: PhotoArgs, config: Config) -> anyhow::Result<()> {
    let hangar = Hangar::new(config).await?;
    let photo = hangar.remove(args.id).await?;
    println!(
        "{}",
        serde_json::json!({ "removed": photo.id, "file_path": photo.photo.file_path })
    );
    Ok(())
}
