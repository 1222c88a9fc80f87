use std::path::Path;

use anyhow::{Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::commands::summarize::config::SummarizeConfig;
use crate::commands::summarize::metadata::ResultTreeWalker;
use crate::model::{ResultFileEntry, ResultInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_atomic};

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.results_root)?;

    if args.dry_run {
        info!(
            file_count = manifest.file_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.cache_root.join("manifests").join("result_inventory.json"));

    write_json_atomic(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(file_count = manifest.file_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(results_root: &Path) -> Result<ResultInventoryManifest> {
    let walker = ResultTreeWalker::new()?;
    let dataset_aliases = SummarizeConfig::default_dataset_prefix_aliases();
    let discovery = walker.discover(results_root, &dataset_aliases)?;

    if discovery.files.is_empty() {
        bail!("no result files found in {}", results_root.display());
    }

    let mut files = Vec::with_capacity(discovery.files.len());
    for file in &discovery.files {
        let sha256 = sha256_file(&file.path)?;
        files.push(ResultFileEntry {
            relative_path: file.relative_path.clone(),
            hidden_fraction: file.context.hidden_fraction.clone(),
            difficulty: file.context.difficulty.as_str().to_string(),
            race_type: file.context.race_type.as_str().to_string(),
            batch_size: file.context.batch_size,
            dataset: file.context.dataset.clone(),
            sha256,
        });
    }

    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

    Ok(ResultInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: results_root.display().to_string(),
        file_count: files.len(),
        files,
    })
}
