use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::model::{IngestRunManifest, PdfInventoryManifest};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = manifest_dir.join("pdf_inventory.json");
    let structured_dir = args
        .structured_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.join("structured"));

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let raw = fs::read(&inventory_path)
            .with_context(|| format!("failed to read {}", inventory_path.display()))?;
        let inventory: PdfInventoryManifest = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

        info!(
            generated_at = %inventory.generated_at,
            pdf_count = inventory.pdf_count,
            mapped = inventory.pdfs.iter().filter(|pdf| pdf.mapped).count(),
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    match latest_ingest_manifest_path(&manifest_dir)? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: IngestRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                processed = manifest.counts.processed_pdf_count,
                failed = manifest.counts.failed_pdf_count,
                articles = manifest.counts.article_count,
                chunks = manifest.counts.chunk_count,
                "latest ingest run"
            );
            for failure in &manifest.failures {
                warn!(file = %failure.filename, error = %failure.error, "document failed in latest run");
            }
        }
        None => warn!(path = %manifest_dir.display(), "no ingest run manifest found"),
    }

    if structured_dir.exists() {
        let jsonl_count = fs::read_dir(&structured_dir)
            .with_context(|| format!("failed to read {}", structured_dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                name.ends_with(".jsonl") && !name.ends_with(".pages.jsonl")
            })
            .count();

        info!(
            path = %structured_dir.display(),
            files = jsonl_count,
            "structured output"
        );
    } else {
        warn!(path = %structured_dir.display(), "structured output directory missing");
    }

    Ok(())
}

/// Run manifests carry a compact UTC stamp in their name, so the
/// lexicographically last one is the newest.
fn latest_ingest_manifest_path(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?
    {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?;
        let file_name = entry.file_name().to_string_lossy().to_string();
        if file_name.starts_with("ingest_run_") && file_name.ends_with(".json") {
            candidates.push(entry.path());
        }
    }

    candidates.sort();
    Ok(candidates.pop())
}
