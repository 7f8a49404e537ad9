use std::fmt::Write;

use newswatch_core::pagination::{has_next, has_previous};
use newswatch_core::{
    highlight, page_window, Article, ArticleDetail, FeedView, HealthSummary, ProbeOutcome,
    Segment, SyncPhase,
};

const BOLD_YELLOW: &str = "\x1b[1;33m";
const RESET: &str = "\x1b[0m";

pub fn article_line(article: &Article, visited: bool) -> String {
    let status = if visited { "read" } else { "new " };
    let mut line = format!("[{status}] {:>6}  {}", article.id, article.title);
    if !article.source_url.is_empty() {
        let _ = write!(line, "  ({})", article.source_label());
    }
    let date = article.created_at.format("%b %e, %H:%M UTC");
    let _ = write!(line, "\n              {date}");
    for keyword in &article.matched_keywords {
        let _ = write!(line, "  #{keyword}");
    }
    line
}

/// Page selector, only shown when there is more than one page.
pub fn page_footer(current: u32, total: u32) -> Option<String> {
    if total <= 1 {
        return None;
    }
    let mut footer = format!("Page {current} of {total}  ");
    footer.push_str(if has_previous(current) { "< p " } else { "    " });
    for page in page_window(current, total) {
        if page == current {
            let _ = write!(footer, " [{page}]");
        } else {
            let _ = write!(footer, " {page}");
        }
    }
    footer.push_str(if has_next(current, total) { "  n >" } else { "" });
    Some(footer)
}

pub fn feed(view: &FeedView) -> String {
    let mut out = String::new();
    if let SyncPhase::Loading(page) = view.phase {
        let _ = writeln!(out, "Loading page {page}...");
        return out;
    }

    if let Some(error) = &view.error {
        let _ = writeln!(out, "Could not fetch news: {error}");
        let _ = writeln!(out, "Type `r` to try again.");
    }

    if view.articles.is_empty() {
        if view.error.is_none() {
            let _ = writeln!(
                out,
                "No news available. Waiting for the scraper to find relevant articles..."
            );
        }
    } else {
        let live = if view.polling { "  (live)" } else { "" };
        let _ = writeln!(out, "Latest news{live}");
        for article in &view.articles {
            let _ = writeln!(out, "{}", article_line(article, view.is_visited(article.id)));
        }
    }

    if let Some(footer) = page_footer(view.current_page, view.total_pages) {
        let _ = writeln!(out, "{footer}");
    }
    out
}

pub fn highlighted(text: &str, keywords: &[String]) -> String {
    highlight(text, keywords)
        .into_iter()
        .map(|segment| match segment {
            Segment::Plain(text) => text.to_string(),
            Segment::Match(text) => format!("{BOLD_YELLOW}{text}{RESET}"),
        })
        .collect()
}

pub fn detail(article: &ArticleDetail) -> String {
    let keywords = &article.matched_keywords;
    let mut out = String::new();
    let _ = writeln!(out, "{}", highlighted(&article.title, keywords));
    let _ = writeln!(out, "{}", article.created_at.format("%B %e, %Y %H:%M UTC"));
    let _ = writeln!(out);
    let _ = writeln!(out, "{}", highlighted(&article.content, keywords));
    if !keywords.is_empty() {
        let _ = writeln!(out);
        let tags: Vec<String> = keywords
            .iter()
            .map(|keyword| format!("#{keyword}"))
            .collect();
        let _ = writeln!(out, "Matched keywords: {}", tags.join(" "));
    }
    let _ = writeln!(out, "Original: {}", article.link);
    out
}

pub fn health(base_url: &str, summary: &HealthSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Health check for {base_url}");
    for report in &summary.reports {
        match &report.outcome {
            ProbeOutcome::Healthy { status, elapsed, items } => {
                let _ = write!(
                    out,
                    "  ok    {:<16} {status} in {}ms",
                    report.name,
                    elapsed.as_millis()
                );
                if let Some(items) = items {
                    let _ = write!(out, " ({items} items)");
                }
                let _ = writeln!(out);
            }
            ProbeOutcome::BadStatus { status, .. } => {
                let _ = writeln!(out, "  warn  {:<16} returned status {status}", report.name);
            }
            ProbeOutcome::Unreachable { error } => {
                let _ = writeln!(out, "  fail  {:<16} {error}", report.name);
            }
        }
    }
    let _ = write!(
        out,
        "{:.1}% healthy ({}/{})",
        summary.success_rate(),
        summary.healthy_count(),
        summary.reports.len()
    );
    if let Some(latency) = summary.average_latency() {
        let _ = write!(out, ", average response {}ms", latency.as_millis());
    }
    let _ = writeln!(out);
    out
}
