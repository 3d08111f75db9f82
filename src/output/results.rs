//! Plain-text rendering of search pages and index reports

use crate::orchestrator::{IndexReport, SearchPage};

/// Formats one page of search results for a terminal
///
/// # Arguments
///
/// * `page` - The page to render
///
/// # Returns
///
/// A multi-line string, ending with a newline
pub fn format_search_page(page: &SearchPage) -> String {
    let mut out = String::new();

    if page.results.is_empty() {
        out.push_str(&format!(
            "No results for '{}' on page {} ({} matches, {} seconds)\n",
            page.query,
            page.page + 1,
            page.total_hits,
            page.elapsed_seconds()
        ));
        return out;
    }

    let first = page.page * page.page_size + 1;
    let last = first + page.results.len() - 1;
    out.push_str(&format!(
        "Results {}-{} of {} for '{}' ({} seconds)\n\n",
        first,
        last,
        page.total_hits,
        page.query,
        page.elapsed_seconds()
    ));

    for (offset, result) in page.results.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", first + offset, result.title));
        out.push_str(&format!("   {}\n", result.path));
        if !result.fragment.is_empty() {
            out.push_str(&format!("   {}\n", result.fragment));
        }
        out.push('\n');
    }

    if page.has_next() {
        out.push_str(&format!(
            "Page {} of {}; use --page {} for more\n",
            page.page + 1,
            page.total_pages(),
            page.page + 1
        ));
    }
    out
}

/// One-line summary of an indexing run
pub fn format_index_report(report: &IndexReport) -> String {
    let mut line = format!(
        "Indexed {} documents from {} in {} seconds",
        report.documents,
        report.seed,
        report.elapsed_seconds()
    );
    if report.summary.pages_failed > 0 {
        line.push_str(&format!(" ({} pages failed)", report.summary.pages_failed));
    }
    if report.summary.cancelled {
        line.push_str(" [cancelled]");
    }
    line
}
