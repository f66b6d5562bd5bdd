use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Source of per-page text for one PDF.
pub(crate) trait PageExtractor: Sync {
    fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<String>>;
}

/// Shells out to poppler's `pdftotext`, which separates pages with form feeds.
#[derive(Debug, Clone, Default)]
pub(crate) struct PdftotextExtractor {
    pub(crate) max_pages_per_doc: Option<usize>,
}

impl PageExtractor for PdftotextExtractor {
    fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<String>> {
        let mut command = Command::new("pdftotext");
        command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
        if let Some(max_pages) = self.max_pages_per_doc {
            command.arg("-l").arg(max_pages.to_string());
        }
        command.arg(pdf_path).arg("-");

        let output = command
            .output()
            .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftotext returned non-zero exit status for {}: {}",
                pdf_path.display(),
                stderr.trim()
            );
        }

        Ok(split_pdftotext_pages(&String::from_utf8_lossy(&output.stdout)))
    }
}

pub(crate) fn split_pdftotext_pages(raw: &str) -> Vec<String> {
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    pages
}

pub(crate) fn non_whitespace_char_count(text: &str) -> usize {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .count()
}

/// Drops running headers and footers: the first or last non-empty line of a
/// page when the same normalized line sits on that edge of 3 or more pages.
/// Returns the number of lines removed.
pub(crate) fn strip_repeated_edge_lines(pages: &mut [String]) -> usize {
    let header_candidates = detect_repeated_edge_lines(pages, true);
    let footer_candidates = detect_repeated_edge_lines(pages, false);
    let mut removed = 0usize;

    for page in pages.iter_mut() {
        let mut lines = page.lines().map(ToOwned::to_owned).collect::<Vec<String>>();
        let mut changed = false;

        if let Some(index) = lines.iter().position(|line| !line.trim().is_empty()) {
            if header_candidates.contains(&normalize_edge_line(&lines[index])) {
                lines.remove(index);
                removed += 1;
                changed = true;
            }
        }

        if let Some(index) = lines.iter().rposition(|line| !line.trim().is_empty()) {
            if footer_candidates.contains(&normalize_edge_line(&lines[index])) {
                lines.remove(index);
                removed += 1;
                changed = true;
            }
        }

        if changed {
            *page = lines.join("\n");
        }
    }

    removed
}

fn detect_repeated_edge_lines(pages: &[String], header: bool) -> HashSet<String> {
    let mut counts = HashMap::<String, usize>::new();
    for page in pages {
        let mut lines = page.lines().map(str::trim).filter(|line| !line.is_empty());
        let candidate = if header { lines.next() } else { lines.last() };

        let Some(candidate) = candidate else {
            continue;
        };

        let normalized = normalize_edge_line(candidate);
        if normalized.is_empty() || normalized.chars().count() > 160 {
            continue;
        }
        *counts.entry(normalized).or_insert(0) += 1;
    }

    counts
        .into_iter()
        .filter_map(|(candidate, count)| if count >= 3 { Some(candidate) } else { None })
        .collect()
}

/// Page counters ("Page 3 / 120", "- 12 -") are folded to one key so that
/// numbered footers repeat.
fn normalize_edge_line(input: &str) -> String {
    input
        .split_whitespace()
        .map(|word| {
            if word.chars().all(|ch| ch.is_ascii_digit()) {
                "#".to_string()
            } else {
                word.to_lowercase()
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
