use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use crate::model::CodeInfo;

const FALLBACK_URL_PREFIX: &str = "https://www.legifrance.gouv.fr/codes/texte_lc/";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct CodeMappingEntry {
    pub(crate) name: String,
    pub(crate) url: String,
}

/// LEGITEXT identifier -> code name and URL.
#[derive(Debug, Clone, Default)]
pub(crate) struct CodeMapping {
    entries: HashMap<String, CodeMappingEntry>,
}

impl CodeMapping {
    pub(crate) fn from_entries(entries: HashMap<String, CodeMappingEntry>) -> Self {
        Self { entries }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn contains(&self, legitext_id: &str) -> bool {
        self.entries.contains_key(legitext_id)
    }

    /// Never fails: unknown identifiers name themselves and get the generic
    /// Legifrance URL.
    pub(crate) fn resolve(&self, legitext_id: &str) -> CodeInfo {
        match self.entries.get(legitext_id) {
            Some(entry) => CodeInfo {
                source_book: entry.name.clone(),
                source_url: entry.url.clone(),
                legitext_id: legitext_id.to_string(),
            },
            None => CodeInfo {
                source_book: legitext_id.to_string(),
                source_url: format!("{FALLBACK_URL_PREFIX}{legitext_id}"),
                legitext_id: legitext_id.to_string(),
            },
        }
    }
}

/// A missing file means an empty table; a malformed one is an error.
pub(crate) fn load_code_mapping(path: &Path) -> Result<CodeMapping> {
    if !path.exists() {
        warn!(path = %path.display(), "code mapping missing, using filename fallback");
        return Ok(CodeMapping::default());
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let entries: HashMap<String, CodeMappingEntry> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    info!(path = %path.display(), codes = entries.len(), "loaded code mapping");

    Ok(CodeMapping::from_entries(entries))
}

pub(crate) fn legitext_id_for(pdf_path: &Path) -> Result<String> {
    pdf_path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", pdf_path.display()))
}
