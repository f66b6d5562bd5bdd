use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::{info, warn};

use crate::cli::ValidateArgs;
use crate::model::{ValidationReport, ValidationStats};
use crate::util::{now_utc_string, write_json_pretty};

const MAX_LOGGED_ISSUES: usize = 10;

pub fn run(args: ValidateArgs) -> Result<()> {
    let structured_dir = args
        .structured_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.join("structured"));

    let files = discover_structured_files(&structured_dir)?;
    info!(
        path = %structured_dir.display(),
        files = files.len(),
        "validating structured output"
    );

    let mut stats = ValidationStats {
        file_count: files.len(),
        ..ValidationStats::default()
    };
    let mut issues = Vec::new();

    for path in &files {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        validate_jsonl(&name, &text, &mut stats, &mut issues);
    }

    info!(
        total_chunks = stats.total_chunks,
        with_source_book = %coverage(stats.chunks_with_book, stats.total_chunks),
        with_article_id = %coverage(stats.chunks_with_article, stats.total_chunks),
        with_hierarchy = %coverage(stats.chunks_with_hierarchy, stats.total_chunks),
        with_source_url = %coverage(stats.chunks_with_url, stats.total_chunks),
        "validation stats"
    );

    for issue in issues.iter().take(MAX_LOGGED_ISSUES) {
        warn!(issue = %issue, "validation issue");
    }
    if issues.len() > MAX_LOGGED_ISSUES {
        warn!(
            remaining = issues.len() - MAX_LOGGED_ISSUES,
            "further validation issues omitted"
        );
    }
    if issues.is_empty() {
        info!("no validation issues found");
    }

    let report = ValidationReport {
        manifest_version: 1,
        generated_at: now_utc_string(),
        structured_dir: structured_dir.display().to_string(),
        stats,
        issue_count: issues.len(),
        issues,
    };

    if let Some(report_path) = &args.report_path {
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote validation report");
    }

    if args.fail_on_issues && report.issue_count > 0 {
        bail!("structured output has {} validation issues", report.issue_count);
    }

    Ok(())
}

/// Article chunk files only; `.pages.jsonl` companions carry no article
/// metadata.
fn discover_structured_files(structured_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let entries = fs::read_dir(structured_dir)
        .with_context(|| format!("failed to read {}", structured_dir.display()))?;

    for entry in entries {
        let entry = entry
            .with_context(|| format!("failed to read entry in {}", structured_dir.display()))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if path.is_file() && name.ends_with(".jsonl") && !name.ends_with(".pages.jsonl") {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

#[derive(Debug, Default)]
struct ChunkRun {
    article_id: String,
    last_index: u64,
}

fn validate_jsonl(
    file_name: &str,
    text: &str,
    stats: &mut ValidationStats,
    issues: &mut Vec<String>,
) {
    let mut run: Option<ChunkRun> = None;

    for (line_index, line) in text.lines().enumerate() {
        let line_number = line_index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let chunk: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(error) => {
                issues.push(format!("{file_name}:{line_number} - JSON error: {error}"));
                continue;
            }
        };
        stats.total_chunks += 1;

        let metadata = chunk.get("metadata");
        let text_field = |key: &str| {
            metadata
                .and_then(|metadata| metadata.get(key))
                .and_then(Value::as_str)
                .filter(|value| !value.is_empty())
        };

        if text_field("source_book").is_some() {
            stats.chunks_with_book += 1;
        } else {
            issues.push(format!("{file_name}:{line_number} - missing source_book"));
        }

        let article_id = text_field("article_id");
        if article_id.is_some() {
            stats.chunks_with_article += 1;
        }

        let has_hierarchy = metadata
            .and_then(|metadata| metadata.get("hierarchy"))
            .and_then(Value::as_array)
            .is_some_and(|hierarchy| !hierarchy.is_empty());
        if has_hierarchy {
            stats.chunks_with_hierarchy += 1;
        }

        if text_field("source_url").is_some() {
            stats.chunks_with_url += 1;
        }

        if chunk.get("page_content").and_then(Value::as_str).is_none() {
            issues.push(format!("{file_name}:{line_number} - missing page_content"));
        }

        let chunk_index = metadata
            .and_then(|metadata| metadata.get("chunk_index"))
            .and_then(Value::as_u64);
        let article_id = article_id.unwrap_or_default();
        match chunk_index {
            None => issues.push(format!("{file_name}:{line_number} - missing chunk_index")),
            Some(0) => {
                run = Some(ChunkRun {
                    article_id: article_id.to_string(),
                    last_index: 0,
                });
            }
            Some(index) => {
                let continues = run.as_ref().is_some_and(|current| {
                    current.article_id == article_id && current.last_index + 1 == index
                });
                if !continues {
                    issues.push(format!(
                        "{file_name}:{line_number} - chunk_index {index} breaks the sequence for article {article_id}"
                    ));
                }
                run = Some(ChunkRun {
                    article_id: article_id.to_string(),
                    last_index: index,
                });
            }
        }
    }
}

fn coverage(count: usize, total: usize) -> String {
    let percent = 100.0 * count as f64 / total.max(1) as f64;
    format!("{count} ({percent:.1}%)")
}
