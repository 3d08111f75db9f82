//! Best-fragment extraction with term markup

use crate::config::SearchConfig;
use crate::index::{DocId, Document, IndexReader};
use crate::search::query::Query;

/// Configuration for fragment highlighting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HighlightConfig {
    /// Window length in characters of source text
    pub fragment_size: usize,
    /// Maximum number of windows joined into one fragment
    pub max_fragments: usize,
    /// Text placed between windows
    pub separator: String,
    /// Markup opening a matched term
    pub pre_tag: String,
    /// Markup closing a matched term
    pub post_tag: String,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl From<&SearchConfig> for HighlightConfig {
    fn from(config: &SearchConfig) -> Self {
        Self {
            fragment_size: config.fragment_size,
            max_fragments: config.max_fragments,
            separator: config.fragment_separator.clone(),
            pre_tag: config.pre_tag.clone(),
            post_tag: config.post_tag.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    start: usize,
    end: usize,
    score: usize,
}

impl Window {
    fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Extracts the best-scoring fragments of a document for a query
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    config: HighlightConfig,
}

impl Highlighter {
    pub fn new(config: HighlightConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HighlightConfig {
        &self.config
    }

    /// Fragment for document `doc_id`, or an empty string if the document
    /// is unknown or carries no term data
    pub fn fragment(&self, reader: &IndexReader, doc_id: DocId, query: &Query) -> String {
        reader
            .document(doc_id)
            .map(|document| self.fragment_document(document, query))
            .unwrap_or_default()
    }

    /// Builds the fragment for one document
    ///
    /// Every query-term occurrence opens a candidate window of at most
    /// `fragment_size` characters, stretched to the end of that occurrence
    /// when the term alone is longer. Windows are scored by the occurrences
    /// they contain, the best non-overlapping ones are kept, and they are
    /// emitted in document order with each occurrence wrapped in markup.
    pub fn fragment_document(&self, document: &Document, query: &Query) -> String {
        if !document.has_term_data() || self.config.fragment_size == 0 {
            return String::new();
        }

        let text = document.contents.as_str();
        let mut matches: Vec<(usize, usize)> = query
            .terms()
            .iter()
            .filter_map(|term| document.term_positions.get(*term))
            .flatten()
            .map(|offset| (offset.start, offset.end))
            .collect();
        matches.sort_unstable();
        matches.dedup();

        if matches.is_empty() {
            return String::new();
        }

        let windows: Vec<Window> = matches
            .iter()
            .map(|&(start, match_end)| {
                let end = window_end(text, start, self.config.fragment_size).max(match_end);
                let score = matches
                    .iter()
                    .filter(|&&(s, e)| s >= start && e <= end)
                    .count();
                Window { start, end, score }
            })
            .collect();

        let mut ranked: Vec<&Window> = windows.iter().filter(|w| w.score > 0).collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score).then(a.start.cmp(&b.start)));

        let mut chosen: Vec<Window> = Vec::new();
        for window in ranked {
            if chosen.len() >= self.config.max_fragments {
                break;
            }
            if chosen.iter().all(|c| !c.overlaps(window)) {
                chosen.push(*window);
            }
        }
        chosen.sort_by_key(|w| w.start);

        chosen
            .iter()
            .map(|w| self.render(text, w, &matches))
            .collect::<Vec<_>>()
            .join(&self.config.separator)
    }

    fn render(&self, text: &str, window: &Window, matches: &[(usize, usize)]) -> String {
        let mut out = String::with_capacity(window.end - window.start + 32);
        let mut cursor = window.start;

        for &(start, end) in matches
            .iter()
            .filter(|&&(s, e)| s >= window.start && e <= window.end)
        {
            out.push_str(&text[cursor..start]);
            out.push_str(&self.config.pre_tag);
            out.push_str(&text[start..end]);
            out.push_str(&self.config.post_tag);
            cursor = end;
        }
        out.push_str(&text[cursor..window.end]);
        out
    }
}

/// End of a window of at most `size` characters starting at byte `start`.
/// Backs off to the last whitespace rather than cutting a word in half.
fn window_end(text: &str, start: usize, size: usize) -> usize {
    let rest = &text[start..];
    let hard_end = rest
        .char_indices()
        .nth(size)
        .map(|(i, _)| start + i)
        .unwrap_or(text.len());

    let cuts_word = hard_end < text.len()
        && !text[hard_end..].starts_with(char::is_whitespace)
        && !text[..hard_end].ends_with(char::is_whitespace);

    let end = if cuts_word {
        match text[start..hard_end].rfind(char::is_whitespace) {
            Some(i) if i > 0 => start + i,
            _ => hard_end,
        }
    } else {
        hard_end
    };

    start + text[start..end].trim_end().len()
}
