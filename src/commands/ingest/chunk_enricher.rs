use anyhow::{Result, bail};

use crate::model::{ArticleRecord, ChunkMetadata, CodeInfo, EnrichedChunk};

/// Break points tried in order before falling back to a hard cut.
const BODY_SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChunkingConfig {
    pub(crate) max_chars: usize,
    pub(crate) overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            overlap: 150,
        }
    }
}

impl ChunkingConfig {
    pub(crate) fn new(max_chars: usize, overlap: usize) -> Result<Self> {
        if max_chars == 0 {
            bail!("max chars must be greater than zero");
        }
        if overlap >= max_chars {
            bail!("overlap ({overlap}) must be smaller than max chars ({max_chars})");
        }

        Ok(Self { max_chars, overlap })
    }
}

/// Wraps article bodies in a provenance header, splitting long bodies so
/// every piece repeats the header.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ChunkEnricher {
    config: ChunkingConfig,
}

impl ChunkEnricher {
    pub(crate) fn new(config: ChunkingConfig) -> Self {
        Self { config }
    }

    pub(crate) fn enrich(
        &self,
        article: &ArticleRecord,
        source: &str,
        code_info: &CodeInfo,
    ) -> EnrichedChunk {
        build_chunk(article, &article.content, 0, source, code_info)
    }

    pub(crate) fn split(
        &self,
        article: &ArticleRecord,
        source: &str,
        code_info: &CodeInfo,
    ) -> Vec<EnrichedChunk> {
        let whole = self.enrich(article, source, code_info);
        if whole.page_content.chars().count() <= self.config.max_chars {
            return vec![whole];
        }

        split_body(&article.content, self.config.max_chars, self.config.overlap)
            .iter()
            .enumerate()
            .map(|(index, body)| build_chunk(article, body, index, source, code_info))
            .collect()
    }
}

pub(crate) fn render_enriched_content(
    article: &ArticleRecord,
    body: &str,
    code_info: &CodeInfo,
) -> String {
    let mut parts = vec![format!("Source: {}", code_info.source_book)];
    if !article.hierarchy.is_empty() {
        parts.push(article.hierarchy.join(" > "));
    }
    parts.push(format!("Article {}", article.article_id));
    parts.push(format!("URL: {}", code_info.source_url));
    parts.push(String::new());
    parts.push(body.to_string());

    parts.join("\n")
}

fn build_chunk(
    article: &ArticleRecord,
    body: &str,
    chunk_index: usize,
    source: &str,
    code_info: &CodeInfo,
) -> EnrichedChunk {
    EnrichedChunk {
        page_content: render_enriched_content(article, body, code_info),
        metadata: ChunkMetadata {
            source: source.to_string(),
            source_book: code_info.source_book.clone(),
            source_url: code_info.source_url.clone(),
            legitext_id: code_info.legitext_id.clone(),
            article_id: article.article_id.clone(),
            hierarchy: article.hierarchy.clone(),
            page: article.page,
            chunk_index,
        },
    }
}

/// Cuts `text` into contiguous pieces of at most `max_chars` chars.
///
/// Each piece after the first starts with the last `overlap` chars of the
/// previous one, so dropping those prefixes and concatenating gives back the
/// input. Cuts land after the furthest paragraph break in the window, else
/// the furthest line break, else the furthest space, else at the window end.
pub(crate) fn split_body(text: &str, max_chars: usize, overlap: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let overlap = overlap.min(max_chars - 1);

    // Byte offset of every char plus the end of the text.
    let offsets = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect::<Vec<usize>>();
    let char_count = offsets.len() - 1;

    let mut pieces = Vec::new();
    let mut start = 0usize;

    loop {
        if char_count - start <= max_chars {
            pieces.push(text[offsets[start]..].to_string());
            break;
        }

        let window_end = start + max_chars;
        let window_start = offsets[start];
        let window = &text[window_start..offsets[window_end]];
        let earliest_break = offsets[start + overlap + 1] - window_start;
        let end = last_break(window, &BODY_SEPARATORS, earliest_break)
            .map(|byte_end| char_index_of(&offsets, window_start + byte_end))
            .unwrap_or(window_end);

        pieces.push(text[offsets[start]..offsets[end]].to_string());
        start = end - overlap;
    }

    pieces
}

/// Byte position just past the last occurrence of the highest-priority
/// separator that ends at or after `earliest`.
fn last_break(window: &str, separators: &[&str], earliest: usize) -> Option<usize> {
    let (separator, rest) = separators.split_first()?;
    match window.rfind(separator).map(|position| position + separator.len()) {
        Some(end) if end >= earliest => Some(end),
        _ => last_break(window, rest, earliest),
    }
}

fn char_index_of(offsets: &[usize], byte: usize) -> usize {
    offsets.partition_point(|offset| *offset < byte)
}
