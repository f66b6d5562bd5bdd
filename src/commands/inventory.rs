use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::commands::ingest::{CodeMapping, legitext_id_for, load_code_mapping};
use crate::model::{PdfEntry, PdfInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: InventoryArgs) -> Result<()> {
    let mapping_path = args
        .mapping_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join("legifrance_mapping.json"));
    let mapping = load_code_mapping(&mapping_path)?;
    let manifest = build_manifest(&args.cache_root, &mapping)?;
    let mapped_count = manifest.pdfs.iter().filter(|pdf| pdf.mapped).count();

    if args.dry_run {
        info!(
            pdf_count = manifest.pdf_count,
            mapped = mapped_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.cache_root.join("manifests").join("pdf_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(
        pdf_count = manifest.pdf_count,
        mapped = mapped_count,
        unmapped = manifest.pdf_count - mapped_count,
        "inventory completed"
    );

    Ok(())
}

pub fn build_manifest(cache_root: &Path, mapping: &CodeMapping) -> Result<PdfInventoryManifest> {
    let mut pdf_paths = discover_pdfs(cache_root)?;
    pdf_paths.sort();

    if pdf_paths.is_empty() {
        bail!("no PDFs found in {}", cache_root.display());
    }

    let mut pdfs = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let legitext_id = legitext_id_for(&path)?;
        let sha256 = sha256_file(&path)?;

        pdfs.push(PdfEntry {
            mapped: mapping.contains(&legitext_id),
            filename,
            legitext_id,
            sha256,
        });
    }

    info!(codes_in_mapping = mapping.len(), "resolved inventory against mapping");

    Ok(PdfInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: cache_root.display().to_string(),
        pdf_count: pdfs.len(),
        pdfs,
    })
}

fn discover_pdfs(cache_root: &Path) -> Result<Vec<PathBuf>> {
    let mut pdfs = Vec::new();

    let entries = fs::read_dir(cache_root)
        .with_context(|| format!("failed to read {}", cache_root.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", cache_root.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_pdf = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            pdfs.push(path);
        }
    }

    Ok(pdfs)
}
