use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use super::chunk_enricher::{ChunkEnricher, ChunkingConfig, render_enriched_content, split_body};
use super::code_info::{CodeMapping, CodeMappingEntry, load_code_mapping};
use super::document_walker::DocumentWalker;
use super::line_classifier::LineClassifier;
use super::markdown_and_page_chunks::{build_page_chunks, render_markdown};
use super::page_extract_and_normalize::{
    PageExtractor, split_pdftotext_pages, strip_repeated_edge_lines,
};
use super::pipeline::{
    DocumentOutcome, IngestContext, process_documents, process_pages, process_single_pdf,
};
use super::run::render_ingest_command;
use crate::cli::IngestArgs;
use crate::model::{ArticleRecord, CodeInfo, PdfEntry};

fn classifier() -> LineClassifier {
    LineClassifier::new().expect("patterns compile")
}

fn walk(pages: &[&str]) -> Vec<ArticleRecord> {
    let classifier = classifier();
    DocumentWalker::new(&classifier).walk(pages)
}

fn code_info() -> CodeInfo {
    CodeInfo {
        source_book: "Code civil".to_string(),
        source_url: "https://www.legifrance.gouv.fr/codes/texte_lc/LEGITEXT000006070721"
            .to_string(),
        legitext_id: "LEGITEXT000006070721".to_string(),
    }
}

fn article(article_id: &str, content: &str, hierarchy: &[&str]) -> ArticleRecord {
    ArticleRecord {
        article_id: article_id.to_string(),
        content: content.to_string(),
        page: 4,
        hierarchy: hierarchy.iter().map(|entry| entry.to_string()).collect(),
    }
}

fn body_of(page_content: &str, record: &ArticleRecord) -> String {
    let header = render_enriched_content(record, "", &code_info());
    page_content
        .strip_prefix(header.as_str())
        .expect("chunk starts with header")
        .to_string()
}

#[test]
fn walk_attaches_inline_heading_title_to_following_article() {
    let articles = walk(&["TITRE II : Des obligations\nArticle L.121-3\nLe contrat est formé."]);

    assert_eq!(articles.len(), 1);
    assert_eq!(articles[0].article_id, "L121-3");
    assert_eq!(articles[0].hierarchy, vec!["Titre II - Des obligations".to_string()]);
    assert_eq!(articles[0].content, "Article L.121-3\nLe contrat est formé.");
    assert_eq!(articles[0].page, 1);
}

#[test]
fn walk_closes_article_on_next_marker_even_without_body() {
    let articles = walk(&["Art. 5\nArt. 6\nTexte de l'article six."]);

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].article_id, "5");
    assert_eq!(articles[0].content, "Art. 5");
    assert_eq!(articles[1].article_id, "6");
    assert_eq!(articles[1].content, "Art. 6\nTexte de l'article six.");
}

#[test]
fn walk_drops_text_before_first_article_and_numbers_pages_from_one() {
    let pages = [
        "Code civil\nDernière modification : 2024\n",
        "",
        "Livre Ier : Des personnes\nArticle 7\nL'exercice des droits civils\n",
        "est indépendant de la qualité de citoyen.\nArticle 8\nTout Français jouit des droits civils.",
    ];
    let articles = walk(&pages);

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].page, 3);
    assert_eq!(
        articles[0].content,
        "Article 7\nL'exercice des droits civils\nest indépendant de la qualité de citoyen."
    );
    assert_eq!(articles[1].page, 4);
    assert!(articles
        .iter()
        .all(|record| record.hierarchy == vec!["Livre I - Des personnes".to_string()]));
}

#[test]
fn walk_snapshots_are_not_rewritten_by_later_headings() {
    let articles = walk(&[
        "Chapitre Ier : Du mariage\nArticle 144\nTexte.\nChapitre II : Du divorce\nSection 1 : Des cas de divorce\nArticle 229\nTexte.",
    ]);

    assert_eq!(articles[0].hierarchy, vec!["Chapitre I - Du mariage".to_string()]);
    assert_eq!(
        articles[1].hierarchy,
        vec![
            "Chapitre II - Du divorce".to_string(),
            "Section 1 - Des cas de divorce".to_string()
        ]
    );
}

#[test]
fn walk_resolves_title_from_following_lines_without_consuming_them() {
    let articles = walk(&["Article 1\nPremier.\nCHAPITRE III\n\nDu divorce\nArticle 229\nSecond."]);

    assert_eq!(articles[1].hierarchy, vec!["Chapitre III - Du divorce".to_string()]);
    assert_eq!(articles[0].content, "Article 1\nPremier.\nDu divorce");
}

#[test]
fn walk_keeps_level_title_when_next_heading_has_none() {
    let articles = walk(&["TITRE I : Dispositions\nArticle 1\nUn.\nTITRE II", "Article 2\nDeux."]);

    assert_eq!(articles[0].hierarchy, vec!["Titre I - Dispositions".to_string()]);
    assert_eq!(articles[1].hierarchy, vec!["Titre II - Dispositions".to_string()]);
}

#[test]
fn walk_opens_article_on_lowercase_keyword_but_not_on_mid_line_reference() {
    let articles = walk(&[
        "Article L. 311-1\nVoir conformément à l'article L. 311-2 ci-après.\narticle L. 311-3\nTrois.",
    ]);
    let ids = articles
        .iter()
        .map(|record| record.article_id.as_str())
        .collect::<Vec<&str>>();

    assert_eq!(ids, vec!["L311-1", "L311-3"]);
    assert_eq!(
        articles[0].content,
        "Article L. 311-1\nVoir conformément à l'article L. 311-2 ci-après."
    );
}

#[test]
fn walk_keeps_repeated_and_out_of_order_ids() {
    let articles = walk(&["Article 12\nA.\nArticle 3\nB.\nArticle 12\nC."]);
    let ids = articles
        .iter()
        .map(|record| record.article_id.as_str())
        .collect::<Vec<&str>>();

    assert_eq!(ids, vec!["12", "3", "12"]);
}

#[test]
fn walk_is_deterministic_and_tolerates_empty_input() {
    let pages = ["Partie législative\nLivre II\nArticle L. 200-1\nTexte.\n\nArticle L. 200-2\nSuite."];
    assert_eq!(walk(&pages), walk(&pages));
    assert!(walk(&[]).is_empty());
    assert!(walk(&["", "   \n\n"]).is_empty());
}

#[test]
fn enriched_header_has_fixed_layout() {
    let record = article("L311-1", "Corps.", &["Livre III", "Titre I - Des biens"]);
    let chunk = ChunkEnricher::default().enrich(&record, "LEGITEXT000006070721.pdf", &code_info());

    assert_eq!(
        chunk.page_content,
        "Source: Code civil\nLivre III > Titre I - Des biens\nArticle L311-1\nURL: https://www.legifrance.gouv.fr/codes/texte_lc/LEGITEXT000006070721\n\nCorps."
    );
    assert_eq!(chunk.metadata.source, "LEGITEXT000006070721.pdf");
    assert_eq!(chunk.metadata.article_id, "L311-1");
    assert_eq!(chunk.metadata.page, 4);
    assert_eq!(chunk.metadata.chunk_index, 0);

    let bare = article("5", "Corps.", &[]);
    let chunk = ChunkEnricher::default().enrich(&bare, "x.pdf", &code_info());
    assert!(chunk.page_content.starts_with("Source: Code civil\nArticle 5\nURL: "));
}

#[test]
fn article_exactly_at_budget_is_not_split() {
    let header_chars = render_enriched_content(&article("1", "", &[]), "", &code_info())
        .chars()
        .count();
    let record = article("1", &"é".repeat(1000 - header_chars), &[]);
    let enricher = ChunkEnricher::default();

    let chunks = enricher.split(&record, "x.pdf", &code_info());
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].page_content.chars().count(), 1000);
    assert_eq!(chunks[0], enricher.enrich(&record, "x.pdf", &code_info()));
}

#[test]
fn article_one_char_over_budget_goes_through_split() {
    let header_chars = render_enriched_content(&article("1", "", &[]), "", &code_info())
        .chars()
        .count();
    let body = "é".repeat(1001 - header_chars);
    let record = article("1", &body, &[]);
    let enricher = ChunkEnricher::default();
    assert_eq!(
        enricher
            .enrich(&record, "x.pdf", &code_info())
            .page_content
            .chars()
            .count(),
        1001
    );

    let chunks = enricher.split(&record, "x.pdf", &code_info());
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].metadata.chunk_index, 0);
    assert_eq!(body_of(&chunks[0].page_content, &record), body);
}

#[test]
fn long_article_splits_into_overlapping_pieces_that_rebuild_the_body() {
    let paragraph = (0..40)
        .map(|index| format!("alinéa{index}"))
        .collect::<Vec<String>>()
        .join(" ");
    let body = (0..12)
        .map(|index| format!("{index}° {paragraph}"))
        .collect::<Vec<String>>()
        .join("\n\n");
    let record = article("L110-1", &body, &["Livre I"]);

    let chunks = ChunkEnricher::default().split(&record, "x.pdf", &code_info());
    assert!(chunks.len() > 1);

    let bodies = chunks
        .iter()
        .map(|chunk| body_of(&chunk.page_content, &record))
        .collect::<Vec<String>>();

    for (index, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.metadata.chunk_index, index);
        assert_eq!(chunk.metadata.article_id, "L110-1");
    }
    assert!(bodies.iter().all(|piece| piece.chars().count() <= 1000));

    let mut rebuilt = bodies[0].clone();
    for pair in bodies.windows(2) {
        let tail = pair[0].chars().skip(pair[0].chars().count() - 150).collect::<String>();
        assert!(pair[1].starts_with(&tail));
        rebuilt.extend(pair[1].chars().skip(150));
    }
    assert_eq!(rebuilt, body);
}

#[test]
fn split_body_prefers_paragraph_then_word_then_char_breaks() {
    let text = format!("{}\n\n{}", "A".repeat(600), "B".repeat(600));
    let pieces = split_body(&text, 1000, 150);
    assert_eq!(pieces.len(), 2);
    assert!(pieces[0].ends_with("\n\n"));
    assert_eq!(pieces[1], format!("{}\n\n{}", "A".repeat(148), "B".repeat(600)));

    let words = "mot ".repeat(400);
    let pieces = split_body(&words, 1000, 150);
    assert!(pieces[0].ends_with(' '));
    assert_eq!(pieces[0].chars().count(), 1000);

    let solid = "x".repeat(2500);
    let lengths = split_body(&solid, 1000, 150)
        .iter()
        .map(|piece| piece.len())
        .collect::<Vec<usize>>();
    assert_eq!(lengths, vec![1000, 1000, 800]);
}

#[test]
fn split_body_counts_chars_not_bytes() {
    let text = "é".repeat(1200);
    let pieces = split_body(&text, 1000, 150);
    assert_eq!(pieces.len(), 2);
    assert_eq!(pieces[0].chars().count(), 1000);
    assert_eq!(pieces[1].chars().count(), 350);
    assert_eq!(split_body("", 1000, 150), vec![String::new()]);
}

#[test]
fn chunking_config_rejects_overlap_not_below_max() {
    assert!(ChunkingConfig::new(100, 100).is_err());
    assert!(ChunkingConfig::new(0, 0).is_err());
    assert_eq!(
        ChunkingConfig::new(1000, 150).expect("valid"),
        ChunkingConfig::default()
    );
}

#[test]
fn unmapped_identifier_falls_back_to_filename() {
    let info = CodeMapping::default().resolve("LEGITEXT999999999");
    assert_eq!(info.source_book, "LEGITEXT999999999");
    assert_eq!(
        info.source_url,
        "https://www.legifrance.gouv.fr/codes/texte_lc/LEGITEXT999999999"
    );
    assert_eq!(info.legitext_id, "LEGITEXT999999999");

    let mapping = CodeMapping::from_entries(HashMap::from([(
        "LEGITEXT000006070721".to_string(),
        CodeMappingEntry {
            name: "Code civil".to_string(),
            url: "https://example.test/civil".to_string(),
        },
    )]));
    assert_eq!(
        mapping.resolve("LEGITEXT000006070721").source_book,
        "Code civil"
    );
}

#[test]
fn load_code_mapping_handles_missing_and_malformed_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = load_code_mapping(&dir.path().join("absent.json")).expect("empty mapping");
    assert_eq!(missing.len(), 0);

    let bad_path = dir.path().join("bad.json");
    fs::write(&bad_path, "[1, 2]").expect("write");
    assert!(load_code_mapping(&bad_path).is_err());

    let good_path = dir.path().join("good.json");
    fs::write(
        &good_path,
        r#"{"LEGITEXT000006070721": {"name": "Code civil", "url": "https://example.test/civil"}}"#,
    )
    .expect("write");
    let mapping = load_code_mapping(&good_path).expect("mapping");
    assert!(mapping.contains("LEGITEXT000006070721"));
}

#[test]
fn render_markdown_groups_articles_under_breadcrumbs() {
    let articles = vec![
        article("1", "Article 1\nUn.", &[]),
        article("2", "Article 2\nDeux.", &["Livre I"]),
        article("3", "Article 3\nTrois.", &["Livre I"]),
    ];
    let markdown = render_markdown(&code_info(), &articles);

    let expected = [
        "# Code civil\n",
        "Source: https://www.legifrance.gouv.fr/codes/texte_lc/LEGITEXT000006070721\n",
        "LEGITEXT ID: LEGITEXT000006070721\n",
        "---\n",
        "\n### Article 1\n",
        "*Page 4*\n",
        "\nArticle 1\nUn.\n",
        "\n## Livre I\n",
        "\n### Article 2\n",
        "*Page 4*\n",
        "\nArticle 2\nDeux.\n",
        "\n### Article 3\n",
        "*Page 4*\n",
        "\nArticle 3\nTrois.\n",
    ]
    .join("\n");
    assert_eq!(markdown, expected);
}

#[test]
fn page_chunks_skip_blank_pages() {
    let pages = vec!["Page un".to_string(), "  ".to_string(), "x".repeat(1200)];
    let chunks = build_page_chunks(&pages, "code.pdf", ChunkingConfig::default());

    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].metadata.page, 1);
    assert_eq!(chunks[1].metadata.page, 3);
    assert_eq!(chunks[2].metadata.page, 3);
}

#[test]
fn split_pdftotext_pages_drops_trailing_blank_pages_only() {
    let pages = split_pdftotext_pages("un\u{000C}\u{000C}trois\u{0000}\u{000C}  \n\u{000C}");
    assert_eq!(pages, vec!["un".to_string(), String::new(), "trois".to_string()]);
}

#[test]
fn strip_repeated_edge_lines_removes_running_headers_and_numbered_footers() {
    let mut pages = (1..=3)
        .map(|page| {
            format!(
                "Code civil - Dernière modification le 01 janvier 2024\nArticle {page}\nTexte {page}.\nPage {page} / 3"
            )
        })
        .collect::<Vec<String>>();

    let removed = strip_repeated_edge_lines(&mut pages);
    assert_eq!(removed, 6);
    assert_eq!(pages[0], "Article 1\nTexte 1.");
    assert_eq!(pages[2], "Article 3\nTexte 3.");
}

#[test]
fn process_pages_counts_split_articles() {
    let long_body = "phrase ".repeat(300);
    let page = format!("Titre Ier\nArticle 1\n{long_body}\nArticle 2\nCourt.");
    let output = process_pages(
        &[page],
        &classifier(),
        &ChunkEnricher::default(),
        "code.pdf",
        &code_info(),
    );

    assert_eq!(output.articles.len(), 2);
    assert_eq!(output.split_article_count, 1);
    assert!(output.chunks.len() >= 3);
    assert_eq!(output.chunks.last().map(|chunk| chunk.metadata.chunk_index), Some(0));
    assert!(output
        .chunks
        .iter()
        .all(|chunk| chunk.metadata.hierarchy == vec!["Titre I".to_string()]));
}

struct StaticPages {
    pages: HashMap<String, Vec<String>>,
}

impl PageExtractor for StaticPages {
    fn extract_pages(&self, pdf_path: &Path) -> Result<Vec<String>> {
        let name = pdf_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        self.pages
            .get(name)
            .cloned()
            .with_context(|| format!("unreadable PDF: {name}"))
    }
}

fn pdf_entry(legitext_id: &str) -> PdfEntry {
    PdfEntry {
        filename: format!("{legitext_id}.pdf"),
        legitext_id: legitext_id.to_string(),
        sha256: "0".repeat(64),
        mapped: false,
    }
}

#[test]
fn process_single_pdf_writes_markdown_and_jsonl() {
    let dir = tempfile::tempdir().expect("tempdir");
    let extractor = StaticPages {
        pages: HashMap::from([(
            "LEGITEXT999999999.pdf".to_string(),
            vec!["Chapitre Ier : Généralités\nArticle R. 12-1\nLe délai est d'un an.".to_string()],
        )]),
    };
    let mapping = CodeMapping::default();
    let classifier = classifier();
    let context = IngestContext {
        cache_root: dir.path().to_path_buf(),
        markdown_dir: dir.path().join("markdown"),
        structured_dir: dir.path().join("structured"),
        mapping: &mapping,
        classifier: &classifier,
        extractor: &extractor,
        chunking: ChunkingConfig::default(),
        strip_repeated_edges: false,
        seed_page_chunks: true,
    };

    let summary = process_single_pdf(&context, &pdf_entry("LEGITEXT999999999")).expect("summary");
    assert_eq!(summary.article_count, 1);
    assert_eq!(summary.chunk_count, 1);
    assert_eq!(summary.page_chunk_count, 1);
    assert_eq!(summary.source_book, "LEGITEXT999999999");

    let jsonl = fs::read_to_string(dir.path().join("structured/LEGITEXT999999999.jsonl"))
        .expect("jsonl");
    assert!(jsonl.contains("Généralités"));
    let record: serde_json::Value =
        serde_json::from_str(jsonl.lines().next().expect("one line")).expect("json");
    assert_eq!(record["metadata"]["source"], "LEGITEXT999999999.pdf");
    assert_eq!(record["metadata"]["article_id"], "R12-1");
    assert_eq!(record["metadata"]["hierarchy"][0], "Chapitre I - Généralités");
    assert_eq!(record["metadata"]["page"], 1);
    assert_eq!(record["metadata"]["chunk_index"], 0);
    assert_eq!(
        record["metadata"]["source_url"],
        "https://www.legifrance.gouv.fr/codes/texte_lc/LEGITEXT999999999"
    );

    let markdown = fs::read_to_string(dir.path().join("markdown/LEGITEXT999999999.md"))
        .expect("markdown");
    assert!(markdown.starts_with("# LEGITEXT999999999\n"));
    assert!(markdown.contains("### Article R12-1"));
    assert!(dir
        .path()
        .join("structured/LEGITEXT999999999.pages.jsonl")
        .exists());
}

#[test]
fn process_documents_isolates_failing_documents() {
    let dir = tempfile::tempdir().expect("tempdir");
    let extractor = StaticPages {
        pages: HashMap::from([
            ("A.pdf".to_string(), vec!["Article 1\nUn.".to_string()]),
            ("C.pdf".to_string(), vec![String::new()]),
        ]),
    };
    let mapping = CodeMapping::default();
    let classifier = classifier();
    let context = IngestContext {
        cache_root: PathBuf::from("/nonexistent"),
        markdown_dir: dir.path().join("markdown"),
        structured_dir: dir.path().join("structured"),
        mapping: &mapping,
        classifier: &classifier,
        extractor: &extractor,
        chunking: ChunkingConfig::default(),
        strip_repeated_edges: true,
        seed_page_chunks: false,
    };
    let pdfs = vec![pdf_entry("A"), pdf_entry("B"), pdf_entry("C")];

    let outcomes = process_documents(&context, &pdfs, 2);
    assert_eq!(outcomes.len(), 3);

    let mut processed = Vec::new();
    let mut failed = Vec::new();
    for outcome in outcomes {
        match outcome {
            DocumentOutcome::Processed(summary) => processed.push(summary),
            DocumentOutcome::Failed(failure) => failed.push(failure),
        }
    }
    processed.sort_by(|a, b| a.filename.cmp(&b.filename));

    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].filename, "B.pdf");
    assert!(failed[0].error.contains("unreadable PDF"));
    assert_eq!(processed.len(), 2);
    assert_eq!(processed[0].article_count, 1);
    assert_eq!(processed[1].article_count, 0);
    assert_eq!(processed[1].empty_page_count, 1);
}

#[test]
fn render_ingest_command_lists_effective_settings() {
    let args = IngestArgs {
        cache_root: PathBuf::from(".cache/legicode"),
        inventory_manifest_path: None,
        ingest_manifest_path: None,
        mapping_path: Some(PathBuf::from("mapping.json")),
        markdown_dir: None,
        structured_dir: None,
        refresh_inventory: true,
        seed_page_chunks: false,
        strip_repeated_edges: true,
        max_pages_per_doc: Some(5),
        max_chars: 1000,
        overlap: 150,
        max_workers: 4,
    };

    let command = render_ingest_command(&args);
    assert!(command.starts_with("legicode ingest --cache-root .cache/legicode"));
    assert!(command.contains("--mapping-path mapping.json"));
    assert!(command.contains("--refresh-inventory"));
    assert!(command.contains("--strip-repeated-edges"));
    assert!(command.contains("--max-pages-per-doc 5"));
    assert!(command.contains("--max-chars 1000 --overlap 150 --max-workers 4"));
    assert!(!command.contains("--seed-page-chunks"));
}
