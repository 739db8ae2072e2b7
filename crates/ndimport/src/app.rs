use anyhow::Context;
use ndimport_import::{ImportPipeline, ImportReport, ImportRequest, PrunePatterns};

use crate::cli::Cli;
use crate::config::Config;
use crate::download::Downloader;
use crate::pixeldrain;

/// Resolve, download and import one Pixeldrain archive.
pub async fn run(cli: Cli) -> anyhow::Result<ImportReport> {
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;
    let patterns = PrunePatterns::new(&config.unneeded_patterns)?;
    tracing::debug!(
        music_path = %config.music_path.display(),
        patterns = ?patterns.as_slice(),
        "configuration loaded"
    );

    let pipeline = ImportPipeline::new(&config.music_path)
        .patterns(patterns)
        .keep_temp(cli.keep_temp)
        .dry_run(cli.dry_run)
        .tmp_dir(cli.tmp_dir.clone());

    // Fail on bad input before spending time on the download.
    let destination = pipeline.preflight(&cli.artist)?;
    tracing::info!(
        "importing Pixeldrain archive for artist {:?} into {}",
        cli.artist,
        destination.display()
    );

    let resolved = pixeldrain::resolve(&cli.url)?;
    tracing::info!("resolved Pixeldrain ID: {}", resolved.id);

    let downloader = Downloader::new(config.pixeldrain_token.clone())?;
    let archive = downloader
        .fetch_archive(&resolved, pipeline.staging_base(), cli.keep_temp)
        .await?;
    tracing::debug!(dir = %archive.staging_dir().display(), "download staged");

    let request =
        ImportRequest::new(cli.artist.as_str(), archive.path()).downloaded_bytes(archive.bytes());
    let report = tokio::task::spawn_blocking(move || pipeline.run(&request))
        .await
        .context("import task panicked")??;

    drop(archive);
    Ok(report)
}
