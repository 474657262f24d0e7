//! The `hangar ingest` command.

use anyhow::Context;
use clap::Args;
use hangar_core::{Config, Hangar, UploadFile, UploadRequest};
use std::path::{Path, PathBuf};

use super::{expand_path, file_name};

/// Arguments for the `ingest` command.
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Image file to upload
    #[arg(required = true)]
    pub file: PathBuf,

    /// Photo title
    #[arg(short, long)]
    pub title: String,

    /// Camera RAW sidecar
    #[arg(long)]
    pub raw: Option<PathBuf>,

    #[arg(short, long)]
    pub description: Option<String>,

    /// Comma-separated tags
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Uploader id
    #[arg(long, default_value = "1", env = "HANGAR_UPLOADER")]
    pub uploader: i64,

    /// Category id
    #[arg(long)]
    pub category: Option<i64>,

    #[arg(long)]
    pub aircraft_type: Option<String>,

    #[arg(long)]
    pub airline: Option<String>,

    #[arg(long)]
    pub registration: Option<String>,

    #[arg(long)]
    pub airport: Option<String>,
}

async fn read_upload(path: &Path) -> anyhow::Result<UploadFile> {
    let path = expand_path(path);
    let data = tokio::fs::read(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(UploadFile::new(file_name(&path)?, data))
}

/// Build the pipeline request from the command line.
pub async fn build_request(args: IngestArgs) -> anyhow::Result<UploadRequest> {
    let file = read_upload(&args.file).await?;
    let raw_file = match &args.raw {
        Some(raw) => Some(read_upload(raw).await?),
        None => None,
    };

    let mut request = UploadRequest::new(args.uploader, file, args.title);
    request.raw_file = raw_file;
    request.description = args.description;
    request.tags = args.tags;
    request.category_id = args.category;
    request.aircraft_type = args.aircraft_type;
    request.airline = args.airline;
    request.registration = args.registration;
    request.airport = args.airport;
    Ok(request)
}

/// Execute the ingest command.
pub async fn execute(args: IngestArgs, config: Config) -> anyhow::Result<()> {
    let request = build_request(args).await?;
    let hangar = Hangar::new(config).await?;
    let photo = hangar.ingest(request).await?;
    println!("{}", serde_json::to_string_pretty(&photo)?);
    Ok(())
}
