use std::path::{Path, PathBuf};
use std::thread;

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use tracing::{info, warn};

use crate::model::{
    ArticleRecord, CodeInfo, DocumentFailure, DocumentSummary, EnrichedChunk, PdfEntry,
};
use crate::util::{write_jsonl, write_text};

use super::chunk_enricher::{ChunkEnricher, ChunkingConfig};
use super::code_info::CodeMapping;
use super::document_walker::DocumentWalker;
use super::line_classifier::LineClassifier;
use super::markdown_and_page_chunks::{build_page_chunks, render_markdown};
use super::page_extract_and_normalize::{
    PageExtractor, non_whitespace_char_count, strip_repeated_edge_lines,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct DocumentOutput {
    pub(crate) articles: Vec<ArticleRecord>,
    pub(crate) chunks: Vec<EnrichedChunk>,
    pub(crate) split_article_count: usize,
}

/// Pages -> articles -> chunks for one document. No I/O.
pub(crate) fn process_pages<S: AsRef<str>>(
    pages: &[S],
    classifier: &LineClassifier,
    enricher: &ChunkEnricher,
    source: &str,
    code_info: &CodeInfo,
) -> DocumentOutput {
    let articles = DocumentWalker::new(classifier).walk(pages);
    let mut chunks = Vec::with_capacity(articles.len());
    let mut split_article_count = 0usize;

    for article in &articles {
        let pieces = enricher.split(article, source, code_info);
        if pieces.len() > 1 {
            split_article_count += 1;
        }
        chunks.extend(pieces);
    }

    DocumentOutput {
        articles,
        chunks,
        split_article_count,
    }
}

/// Everything a worker needs to turn one PDF into output files.
pub(crate) struct IngestContext<'a> {
    pub(crate) cache_root: PathBuf,
    pub(crate) markdown_dir: PathBuf,
    pub(crate) structured_dir: PathBuf,
    pub(crate) mapping: &'a CodeMapping,
    pub(crate) classifier: &'a LineClassifier,
    pub(crate) extractor: &'a dyn PageExtractor,
    pub(crate) chunking: ChunkingConfig,
    pub(crate) strip_repeated_edges: bool,
    pub(crate) seed_page_chunks: bool,
}

#[derive(Debug)]
pub(crate) enum DocumentOutcome {
    Processed(DocumentSummary),
    Failed(DocumentFailure),
}

pub(crate) fn process_single_pdf(
    context: &IngestContext<'_>,
    pdf: &PdfEntry,
) -> Result<DocumentSummary> {
    let pdf_path = context.cache_root.join(&pdf.filename);
    let code_info = context.mapping.resolve(&pdf.legitext_id);

    let mut pages = context.extractor.extract_pages(&pdf_path)?;
    let edge_lines_removed = if context.strip_repeated_edges {
        strip_repeated_edge_lines(&mut pages)
    } else {
        0
    };
    let empty_page_count = pages
        .iter()
        .filter(|page| non_whitespace_char_count(page) == 0)
        .count();

    let enricher = ChunkEnricher::new(context.chunking);
    let output = process_pages(
        &pages,
        context.classifier,
        &enricher,
        &pdf.filename,
        &code_info,
    );

    let markdown_path = output_path(&context.markdown_dir, &pdf.legitext_id, "md");
    write_text(
        &markdown_path,
        &render_markdown(&code_info, &output.articles),
    )?;

    let structured_path = output_path(&context.structured_dir, &pdf.legitext_id, "jsonl");
    write_jsonl(&structured_path, &output.chunks)?;

    let page_chunk_count = if context.seed_page_chunks {
        let page_chunks = build_page_chunks(&pages, &pdf.filename, context.chunking);
        let page_chunks_path =
            output_path(&context.structured_dir, &pdf.legitext_id, "pages.jsonl");
        write_jsonl(&page_chunks_path, &page_chunks)?;
        page_chunks.len()
    } else {
        0
    };

    Ok(DocumentSummary {
        filename: pdf.filename.clone(),
        legitext_id: pdf.legitext_id.clone(),
        source_book: code_info.source_book,
        page_count: pages.len(),
        empty_page_count,
        article_count: output.articles.len(),
        split_article_count: output.split_article_count,
        chunk_count: output.chunks.len(),
        page_chunk_count,
        edge_lines_removed,
        markdown_path: markdown_path.display().to_string(),
        structured_path: structured_path.display().to_string(),
    })
}

/// Fans documents out over `max_workers` scoped threads. A failing document
/// is reported in its outcome and never stops the others. Outcomes arrive in
/// completion order.
pub(crate) fn process_documents(
    context: &IngestContext<'_>,
    pdfs: &[PdfEntry],
    max_workers: usize,
) -> Vec<DocumentOutcome> {
    let worker_count = max_workers.clamp(1, pdfs.len().max(1));
    let (task_tx, task_rx) = bounded::<&PdfEntry>(worker_count * 2);
    let (result_tx, result_rx) = unbounded::<DocumentOutcome>();

    thread::scope(|scope| {
        for worker_id in 0..worker_count {
            let receiver = task_rx.clone();
            let sender = result_tx.clone();
            scope.spawn(move || worker_loop(worker_id, context, receiver, sender));
        }
        drop(task_rx);
        drop(result_tx);

        for pdf in pdfs {
            if task_tx.send(pdf).is_err() {
                break;
            }
        }
        drop(task_tx);

        result_rx.iter().collect()
    })
}

fn worker_loop(
    worker_id: usize,
    context: &IngestContext<'_>,
    receiver: Receiver<&PdfEntry>,
    sender: Sender<DocumentOutcome>,
) {
    for pdf in receiver.iter() {
        let outcome = match process_single_pdf(context, pdf) {
            Ok(summary) => {
                info!(
                    worker = worker_id,
                    file = %summary.filename,
                    pages = summary.page_count,
                    articles = summary.article_count,
                    chunks = summary.chunk_count,
                    "processed document"
                );
                DocumentOutcome::Processed(summary)
            }
            Err(error) => {
                warn!(
                    worker = worker_id,
                    file = %pdf.filename,
                    error = %format!("{error:#}"),
                    "document failed"
                );
                DocumentOutcome::Failed(DocumentFailure {
                    filename: pdf.filename.clone(),
                    error: format!("{error:#}"),
                })
            }
        };

        if sender.send(outcome).is_err() {
            break;
        }
    }
}

fn output_path(directory: &Path, stem: &str, extension: &str) -> PathBuf {
    directory.join(format!("{stem}.{extension}"))
}
