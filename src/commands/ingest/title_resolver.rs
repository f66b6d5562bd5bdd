use super::line_classifier::LineClassifier;

const TITLE_WINDOW_LINES: usize = 3;
const TITLE_MAX_CHARS: usize = 200;

/// Guesses the title of a heading printed on its own line by looking at the
/// next few lines of the same page.
pub(crate) fn resolve_title(
    classifier: &LineClassifier,
    lines: &[&str],
    start_index: usize,
) -> Option<String> {
    lines
        .iter()
        .skip(start_index)
        .take(TITLE_WINDOW_LINES)
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .find(|line| {
            line.chars().count() <= TITLE_MAX_CHARS
                && !classifier.starts_with_article_keyword(line)
                && classifier.classify_article(line).is_none()
        })
        .map(ToOwned::to_owned)
}
