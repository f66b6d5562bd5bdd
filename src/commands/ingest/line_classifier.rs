use anyhow::{Context, Result};
use regex::Regex;

use super::hierarchy_tracker::HierarchyLevel;

/// Separators allowed between a heading marker and its inline title.
const TITLE_LEAD: &str = r"[\s:.\-–—]*";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HierarchyMatch {
    pub(crate) level: HierarchyLevel,
    pub(crate) value: String,
    pub(crate) title: Option<String>,
}

/// Ordered pattern tables for outline headings and article markers.
///
/// Both tables are evaluated top to bottom and the first hit wins, so the
/// prefixed article forms must stay ahead of the bare numeric ones.
#[derive(Debug)]
pub(crate) struct LineClassifier {
    hierarchy_patterns: Vec<(HierarchyLevel, Regex)>,
    article_patterns: Vec<Regex>,
    article_keyword: Regex,
}

impl LineClassifier {
    pub(crate) fn new() -> Result<Self> {
        let roman_or_number = r"([IVX]+|PR[ÉE]LIMINAIRE|\d+)(?:ER)?\b";
        let hierarchy_sources = [
            (
                HierarchyLevel::Partie,
                r"(?i)^PARTIE\s+(L[ÉE]GISLATIVE|R[ÉE]GLEMENTAIRE|PR[ÉE]LIMINAIRE)\b".to_string(),
            ),
            (
                HierarchyLevel::Livre,
                format!(r"(?i)^LIVRE\s+{roman_or_number}"),
            ),
            (
                HierarchyLevel::Titre,
                format!(r"(?i)^TITRE\s+{roman_or_number}"),
            ),
            (
                HierarchyLevel::Chapitre,
                format!(r"(?i)^CHAPITRE\s+{roman_or_number}"),
            ),
            (
                HierarchyLevel::Section,
                r"(?i)^SECTION\s+(\d+|[IVX]+)\b".to_string(),
            ),
            (
                HierarchyLevel::SousSection,
                r"(?i)^SOUS[-\s]SECTION\s+(\d+|[IVX]+)\b".to_string(),
            ),
        ];

        let mut hierarchy_patterns = Vec::with_capacity(hierarchy_sources.len());
        for (level, source) in hierarchy_sources {
            let pattern = format!("{source}{TITLE_LEAD}(.*)$");
            let regex = Regex::new(&pattern).with_context(|| {
                format!("failed to compile {} heading regex", level.as_str())
            })?;
            hierarchy_patterns.push((level, regex));
        }

        let number = r"\d+(?:[-–]\d+)*";
        let article_sources = [
            format!(r"(?i)^Article\s+((?:LO|L)\.?\s*{number})"),
            format!(r"(?i)^Article\s+(R\*?\.?\s*{number})"),
            format!(r"(?i)^Article\s+(D\.?\s*{number})"),
            format!(r"(?i)^Article\s+(A\.?\s*{number})"),
            format!(r"(?i)^Article\s+({number})"),
            format!(r"(?i)^Art\.\s*({number})"),
        ];

        let mut article_patterns = Vec::with_capacity(article_sources.len());
        for source in &article_sources {
            let regex = Regex::new(source)
                .with_context(|| format!("failed to compile article regex: {source}"))?;
            article_patterns.push(regex);
        }

        let article_keyword =
            Regex::new(r"(?i)^(?:Article|Art\.)").context("failed to compile article keyword regex")?;

        Ok(Self {
            hierarchy_patterns,
            article_patterns,
            article_keyword,
        })
    }

    pub(crate) fn classify_hierarchy(&self, line: &str) -> Option<HierarchyMatch> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        self.hierarchy_patterns.iter().find_map(|(level, regex)| {
            let captures = regex.captures(line)?;
            let value = captures.get(1)?.as_str().to_uppercase();
            let title = captures
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|title| !title.is_empty())
                .map(ToOwned::to_owned);

            Some(HierarchyMatch {
                level: *level,
                value,
                title,
            })
        })
    }

    pub(crate) fn classify_article(&self, line: &str) -> Option<String> {
        let line = line.trim();
        self.article_patterns.iter().find_map(|regex| {
            let raw = regex.captures(line)?.get(1)?.as_str();
            Some(canonical_article_id(raw))
        })
    }

    /// True for any line opening with the article keyword, numbered or not.
    pub(crate) fn starts_with_article_keyword(&self, line: &str) -> bool {
        self.article_keyword.is_match(line.trim())
    }
}

/// `L. 311–1` -> `L311-1`, `r. 12-1` -> `R12-1`.
fn canonical_article_id(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace() && *ch != '.')
        .map(|ch| if ch == '–' { '-' } else { ch.to_ascii_uppercase() })
        .collect()
}
