use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfEntry {
    pub filename: String,
    pub legitext_id: String,
    pub sha256: String,
    pub mapped: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdfInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub pdf_count: usize,
    pub pdfs: Vec<PdfEntry>,
}

/// Provenance of one legal code, resolved from its LEGITEXT identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInfo {
    pub source_book: String,
    pub source_url: String,
    pub legitext_id: String,
}

/// One article recovered from the page text.
///
/// `hierarchy` is a copy of the breadcrumb taken when the article marker was
/// seen; later outline changes never reach back into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub article_id: String,
    pub content: String,
    pub page: usize,
    pub hierarchy: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub source: String,
    pub source_book: String,
    pub source_url: String,
    pub legitext_id: String,
    pub article_id: String,
    pub hierarchy: Vec<String>,
    pub page: usize,
    pub chunk_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedChunk {
    pub page_content: String,
    pub metadata: ChunkMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageChunkMetadata {
    pub source: String,
    pub page: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageChunk {
    pub page_content: String,
    pub metadata: PageChunkMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolVersions {
    pub pdftotext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub mapping_path: String,
    pub markdown_dir: String,
    pub structured_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    pub max_chars: usize,
    pub overlap: usize,
    pub max_workers: usize,
    pub max_pages_per_doc: Option<usize>,
    pub strip_repeated_edges: bool,
    pub seed_page_chunks: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestCounts {
    pub pdf_count: usize,
    pub processed_pdf_count: usize,
    pub failed_pdf_count: usize,
    pub page_count: usize,
    pub empty_page_count: usize,
    pub article_count: usize,
    pub split_article_count: usize,
    pub chunk_count: usize,
    pub page_chunk_count: usize,
    pub edge_lines_removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub filename: String,
    pub legitext_id: String,
    pub source_book: String,
    pub page_count: usize,
    pub empty_page_count: usize,
    pub article_count: usize,
    pub split_article_count: usize,
    pub chunk_count: usize,
    pub page_chunk_count: usize,
    pub edge_lines_removed: usize,
    pub markdown_path: String,
    pub structured_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub tool_versions: ToolVersions,
    pub paths: IngestPaths,
    pub settings: IngestSettings,
    pub counts: IngestCounts,
    pub documents: Vec<DocumentSummary>,
    pub failures: Vec<DocumentFailure>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationStats {
    pub file_count: usize,
    pub total_chunks: usize,
    pub chunks_with_book: usize,
    pub chunks_with_article: usize,
    pub chunks_with_hierarchy: usize,
    pub chunks_with_url: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub manifest_version: u32,
    pub generated_at: String,
    pub structured_dir: String,
    pub stats: ValidationStats,
    pub issue_count: usize,
    pub issues: Vec<String>,
}
