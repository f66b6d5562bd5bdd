use crate::model::{ArticleRecord, CodeInfo, PageChunk, PageChunkMetadata};

use super::chunk_enricher::{ChunkingConfig, split_body};

/// Human-readable rendering of one code: a title block, then each article
/// under a `##` breadcrumb that is repeated only when the outline moves.
pub(crate) fn render_markdown(code_info: &CodeInfo, articles: &[ArticleRecord]) -> String {
    let mut md_lines = vec![
        format!("# {}\n", code_info.source_book),
        format!("Source: {}\n", code_info.source_url),
        format!("LEGITEXT ID: {}\n", code_info.legitext_id),
        "---\n".to_string(),
    ];

    let mut current_hierarchy: &[String] = &[];
    for article in articles {
        if article.hierarchy.as_slice() != current_hierarchy {
            current_hierarchy = &article.hierarchy;
            md_lines.push(format!("\n## {}\n", current_hierarchy.join(" > ")));
        }

        md_lines.push(format!("\n### Article {}\n", article.article_id));
        md_lines.push(format!("*Page {}*\n", article.page));
        md_lines.push(format!("\n{}\n", article.content));
    }

    md_lines.join("\n")
}

/// Structure-blind chunks cut straight from page text, one run per non-empty
/// page.
pub(crate) fn build_page_chunks(
    pages: &[String],
    source: &str,
    config: ChunkingConfig,
) -> Vec<PageChunk> {
    let mut chunks = Vec::new();

    for (page_index, page_text) in pages.iter().enumerate() {
        let text = page_text.trim();
        if text.is_empty() {
            continue;
        }

        for piece in split_body(text, config.max_chars, config.overlap) {
            chunks.push(PageChunk {
                page_content: piece,
                metadata: PageChunkMetadata {
                    source: source.to_string(),
                    page: page_index + 1,
                },
            });
        }
    }

    chunks
}
