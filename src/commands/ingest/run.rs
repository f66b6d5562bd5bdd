use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use crate::cli::IngestArgs;
use crate::commands::inventory;
use crate::model::{
    IngestCounts, IngestPaths, IngestRunManifest, IngestSettings, PdfInventoryManifest,
    ToolVersions,
};
use crate::util::{ensure_directory, now_utc_string, utc_compact_string, write_json_pretty};

use super::chunk_enricher::ChunkingConfig;
use super::code_info::{CodeMapping, load_code_mapping};
use super::line_classifier::LineClassifier;
use super::page_extract_and_normalize::PdftotextExtractor;
use super::pipeline::{DocumentOutcome, IngestContext, process_documents};

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let chunking = ChunkingConfig::new(args.max_chars, args.overlap)?;

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| manifest_dir.join("pdf_inventory.json"));
    let ingest_manifest_path = args.ingest_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let mapping_path = args
        .mapping_path
        .clone()
        .unwrap_or_else(|| cache_root.join("legifrance_mapping.json"));
    let markdown_dir = args
        .markdown_dir
        .clone()
        .unwrap_or_else(|| cache_root.join("markdown"));
    let structured_dir = args
        .structured_dir
        .clone()
        .unwrap_or_else(|| cache_root.join("structured"));
    ensure_directory(&markdown_dir)?;
    ensure_directory(&structured_dir)?;

    info!(cache_root = %cache_root.display(), run_id = %run_id, "starting ingest");

    let mapping = load_code_mapping(&mapping_path)?;
    let inventory = load_or_refresh_inventory(
        &cache_root,
        &inventory_manifest_path,
        &mapping,
        args.refresh_inventory,
    )?;

    let classifier = LineClassifier::new()?;
    let extractor = PdftotextExtractor {
        max_pages_per_doc: args.max_pages_per_doc,
    };
    let context = IngestContext {
        cache_root: cache_root.clone(),
        markdown_dir: markdown_dir.clone(),
        structured_dir: structured_dir.clone(),
        mapping: &mapping,
        classifier: &classifier,
        extractor: &extractor,
        chunking,
        strip_repeated_edges: args.strip_repeated_edges,
        seed_page_chunks: args.seed_page_chunks,
    };

    info!(
        pdf_count = inventory.pdf_count,
        workers = args.max_workers,
        "processing documents"
    );
    let outcomes = process_documents(&context, &inventory.pdfs, args.max_workers);

    let mut documents = Vec::new();
    let mut failures = Vec::new();
    for outcome in outcomes {
        match outcome {
            DocumentOutcome::Processed(summary) => documents.push(summary),
            DocumentOutcome::Failed(failure) => failures.push(failure),
        }
    }
    documents.sort_by(|a, b| a.filename.cmp(&b.filename));
    failures.sort_by(|a, b| a.filename.cmp(&b.filename));

    let mut counts = IngestCounts {
        pdf_count: inventory.pdf_count,
        processed_pdf_count: documents.len(),
        failed_pdf_count: failures.len(),
        ..IngestCounts::default()
    };
    for document in &documents {
        counts.page_count += document.page_count;
        counts.empty_page_count += document.empty_page_count;
        counts.article_count += document.article_count;
        counts.split_article_count += document.split_article_count;
        counts.chunk_count += document.chunk_count;
        counts.page_chunk_count += document.page_chunk_count;
        counts.edge_lines_removed += document.edge_lines_removed;
    }

    let mut warnings = Vec::new();
    for document in &documents {
        if document.page_count > 0 && document.empty_page_count == document.page_count {
            warnings.push(format!(
                "{} has no extractable text layer; no articles recovered",
                document.filename
            ));
        } else if document.article_count == 0 {
            warnings.push(format!("{} yielded no articles", document.filename));
        }
    }

    let status = if failures.is_empty() {
        "completed"
    } else {
        "completed_with_failures"
    };

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(&args),
        tool_versions: ToolVersions {
            pdftotext: command_version_optional("pdftotext", &["-v"])
                .unwrap_or_else(|| "unavailable".to_string()),
        },
        paths: IngestPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            mapping_path: mapping_path.display().to_string(),
            markdown_dir: markdown_dir.display().to_string(),
            structured_dir: structured_dir.display().to_string(),
        },
        settings: IngestSettings {
            max_chars: chunking.max_chars,
            overlap: chunking.overlap,
            max_workers: args.max_workers,
            max_pages_per_doc: args.max_pages_per_doc,
            strip_repeated_edges: args.strip_repeated_edges,
            seed_page_chunks: args.seed_page_chunks,
        },
        counts,
        documents,
        failures,
        warnings,
    };

    write_json_pretty(&ingest_manifest_path, &manifest)?;

    info!(path = %ingest_manifest_path.display(), "wrote ingest run manifest");
    info!(
        status = %manifest.status,
        processed = manifest.counts.processed_pdf_count,
        failed = manifest.counts.failed_pdf_count,
        articles = manifest.counts.article_count,
        chunks = manifest.counts.chunk_count,
        "ingest completed"
    );

    Ok(())
}

fn load_or_refresh_inventory(
    cache_root: &Path,
    inventory_manifest_path: &Path,
    mapping: &CodeMapping,
    refresh_inventory: bool,
) -> Result<PdfInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(cache_root, mapping)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            pdf_count = manifest.pdf_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let raw = fs::read(inventory_manifest_path)
        .with_context(|| format!("failed to read {}", inventory_manifest_path.display()))?;
    let manifest: PdfInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", inventory_manifest_path.display()))?;

    info!(
        path = %inventory_manifest_path.display(),
        pdf_count = manifest.pdf_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

pub(crate) fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "legicode".to_string(),
        "ingest".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    let optional_paths = [
        ("--inventory-manifest-path", &args.inventory_manifest_path),
        ("--ingest-manifest-path", &args.ingest_manifest_path),
        ("--mapping-path", &args.mapping_path),
        ("--markdown-dir", &args.markdown_dir),
        ("--structured-dir", &args.structured_dir),
    ];
    for (flag, path) in optional_paths {
        if let Some(path) = path {
            command.push(flag.to_string());
            command.push(path.display().to_string());
        }
    }

    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    if args.seed_page_chunks {
        command.push("--seed-page-chunks".to_string());
    }
    if args.strip_repeated_edges {
        command.push("--strip-repeated-edges".to_string());
    }
    if let Some(max_pages) = args.max_pages_per_doc {
        command.push("--max-pages-per-doc".to_string());
        command.push(max_pages.to_string());
    }
    command.push("--max-chars".to_string());
    command.push(args.max_chars.to_string());
    command.push("--overlap".to_string());
    command.push(args.overlap.to_string());
    command.push("--max-workers".to_string());
    command.push(args.max_workers.to_string());

    command.join(" ")
}
