// src/utils/html_debug.rs
use std::fs::File;
use std::io::Write;
use std::path::Path;

use regex::Regex;

use crate::corpus::Page;
use crate::utils::error::AppError;

/// Writes the given pages as HTML with the highlighted byte ranges marked.
/// `highlights` holds `(page index, start, end, kind)`.
pub fn save_debug_html(
    pages: &[Page],
    path: &Path,
    highlights: &[(usize, usize, usize, &str)],
) -> Result<(), AppError> {
    let mut file = File::create(path)?;

    let mut debug_html = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<style>\n");
    debug_html.push_str(".page { border-top: 2px solid #888; white-space: pre-wrap; font-family: monospace; }\n");
    debug_html.push_str(".highlight-header { background-color: #90EE90; }\n");
    debug_html.push_str(".highlight-code { background-color: #ADD8E6; }\n");
    debug_html.push_str(".highlight-custom { background-color: #FFC0CB; }\n");
    debug_html.push_str("</style>\n</head>\n<body>\n");

    for page in pages {
        debug_html.push_str(&format!("<h3>Page {}</h3>\n<div class=\"page\">", page.number()));

        let mut page_highlights: Vec<(usize, usize, &str)> = highlights
            .iter()
            .filter(|h| h.0 == page.index())
            .map(|h| (h.1, h.2, h.3))
            .collect();
        page_highlights.sort_by_key(|h| h.0);

        let text = page.text();
        let mut last_pos = 0;
        for (start, end, kind) in page_highlights {
            // overlapping matches: keep the first
            if start < last_pos || end > text.len() {
                continue;
            }
            debug_html.push_str(&escape_html(&text[last_pos..start]));

            let css_class = match kind {
                "header" => "highlight-header",
                "code" => "highlight-code",
                _ => "highlight-custom",
            };
            debug_html.push_str(&format!(
                "<span class=\"{}\" title=\"Position: {}-{}, Type: {}\">",
                css_class, start, end, kind
            ));
            debug_html.push_str(&escape_html(&text[start..end]));
            debug_html.push_str("</span>");
            last_pos = end;
        }
        debug_html.push_str(&escape_html(&text[last_pos..]));
        debug_html.push_str("</div>\n");
    }

    debug_html.push_str("\n</body>\n</html>");
    file.write_all(debug_html.as_bytes())?;

    tracing::info!("Saved debug HTML to {}", path.display());
    Ok(())
}

/// Highlights every match of the given patterns on the given pages.
pub fn create_debug_html(pages: &[Page], path: &Path, patterns: &[(&Regex, &str)]) -> Result<(), AppError> {
    let mut highlights = Vec::new();
    for page in pages {
        for (re, kind) in patterns {
            for mat in re.find_iter(page.text()) {
                highlights.push((page.index(), mat.start(), mat.end(), *kind));
            }
        }
    }
    save_debug_html(pages, path, &highlights)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
