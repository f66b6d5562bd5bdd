use tracing::debug;

use crate::model::ArticleRecord;

use super::hierarchy_tracker::HierarchyTracker;
use super::line_classifier::LineClassifier;
use super::title_resolver::resolve_title;

#[derive(Debug)]
struct OpenArticle {
    article_id: String,
    page: usize,
    hierarchy: Vec<String>,
    lines: Vec<String>,
}

impl OpenArticle {
    fn finalize(self) -> ArticleRecord {
        ArticleRecord {
            article_id: self.article_id,
            content: self.lines.join("\n").trim().to_string(),
            page: self.page,
            hierarchy: self.hierarchy,
        }
    }
}

/// Walks page text in reading order and cuts it into articles.
///
/// Each call owns a fresh [`HierarchyTracker`], so walking the same pages
/// twice yields identical records.
#[derive(Debug)]
pub(crate) struct DocumentWalker<'a> {
    classifier: &'a LineClassifier,
}

impl<'a> DocumentWalker<'a> {
    pub(crate) fn new(classifier: &'a LineClassifier) -> Self {
        Self { classifier }
    }

    pub(crate) fn walk<S: AsRef<str>>(&self, pages: &[S]) -> Vec<ArticleRecord> {
        let mut tracker = HierarchyTracker::new();
        let mut articles = Vec::new();
        let mut current: Option<OpenArticle> = None;

        for (page_index, page_text) in pages.iter().enumerate() {
            let page_number = page_index + 1;
            let lines = page_text.as_ref().lines().collect::<Vec<&str>>();

            for (line_index, raw_line) in lines.iter().enumerate() {
                let line = raw_line.trim();
                if line.is_empty() {
                    continue;
                }

                if self.apply_heading(&mut tracker, line, &lines, line_index + 1) {
                    continue;
                }

                if let Some(article_id) = self.classifier.classify_article(line) {
                    if let Some(open) = current.take() {
                        articles.push(open.finalize());
                    }

                    current = Some(OpenArticle {
                        article_id,
                        page: page_number,
                        hierarchy: tracker.snapshot(),
                        lines: vec![line.to_string()],
                    });
                    continue;
                }

                // Text ahead of the first article (cover pages, tables of
                // contents) has nowhere to go.
                if let Some(open) = current.as_mut() {
                    open.lines.push(line.to_string());
                }
            }
        }

        if let Some(open) = current.take() {
            articles.push(open.finalize());
        }

        articles
    }

    fn apply_heading(
        &self,
        tracker: &mut HierarchyTracker,
        line: &str,
        lines: &[&str],
        next_index: usize,
    ) -> bool {
        let Some(heading) = self.classifier.classify_hierarchy(line) else {
            return false;
        };

        let title = heading
            .title
            .or_else(|| resolve_title(self.classifier, lines, next_index));
        tracker.apply(heading.level, &heading.value, title.as_deref());

        debug!(
            level = heading.level.as_str(),
            value = %heading.value,
            breadcrumb = %tracker.snapshot_string(),
            "hierarchy changed"
        );

        true
    }
}
