// src/corpus/ingest.rs
//
// Turns the output of an external PDF-to-text tool into a PageCorpus.
// Supported: pdftotext (form-feed separated), JSON page lists,
// pdftohtml -xml, and HTML page exports.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::corpus::PageCorpus;
use crate::utils::error::IngestError;

const PAGE_SEPARATOR: char = '\x0c';

// --- CSS Selectors (Lazy Static) ---
// pdf2htmlEX emits div.pf, pdftohtml -s emits div#pageN-div, hand-made exports div.page
static PAGE_CONTAINER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("div.page, div.pf, div[id$='-div']")
        .expect("Failed to compile PAGE_CONTAINER_SELECTOR")
});

static BODY_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("body").expect("Failed to compile BODY_SELECTOR")
});

// --- Regex Patterns for Cleaning (Lazy Static) ---
// A word broken across lines with a hyphen. Letters only, so codes like "417-\n2" survive.
static BROKEN_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\p{Ll})-[ \t]*\n[ \t]*(\p{Ll})").expect("Failed to compile BROKEN_WORD_RE")
});

static INLINE_SPACE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ \t\u{a0}\u{2009}\u{202f}]+").expect("Failed to compile INLINE_SPACE_RE")
});

static BLANK_LINES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n{3,}").expect("Failed to compile BLANK_LINES_RE")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    FormFeedText,
    JsonPages,
    PdfToHtmlXml,
    HtmlPages,
}

impl InputFormat {
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "txt" => Ok(Self::FormFeedText),
            "json" => Ok(Self::JsonPages),
            "xml" => Ok(Self::PdfToHtmlXml),
            "html" | "htm" => Ok(Self::HtmlPages),
            other => Err(IngestError::UnsupportedFormat(format!(
                "'{}' (expected .txt, .json, .xml, .html)",
                other
            ))),
        }
    }
}

/// Reads a document from disk. Any failure here is fatal for the run.
pub fn load_corpus(path: &Path) -> Result<PageCorpus, IngestError> {
    let format = InputFormat::from_path(path)?;
    let raw = std::fs::read_to_string(path)?;
    tracing::info!("Read {} bytes from {} as {:?}", raw.len(), path.display(), format);

    let corpus = parse_corpus(&raw, format)?;
    tracing::info!("Ingested {} pages", corpus.len());
    Ok(corpus)
}

pub fn parse_corpus(raw: &str, format: InputFormat) -> Result<PageCorpus, IngestError> {
    match format {
        InputFormat::FormFeedText => Ok(parse_form_feed_text(raw)),
        InputFormat::JsonPages => parse_json_pages(raw),
        InputFormat::PdfToHtmlXml => parse_pdftohtml_xml(raw),
        InputFormat::HtmlPages => Ok(parse_html_pages(raw)),
    }
}

/// `pdftotext` ends every page with a form feed; the trailing one does not open a new page.
pub fn parse_form_feed_text(raw: &str) -> PageCorpus {
    if raw.is_empty() {
        return PageCorpus::default();
    }
    let body = raw.strip_suffix(PAGE_SEPARATOR).unwrap_or(raw);
    PageCorpus::from_texts(body.split(PAGE_SEPARATOR).map(clean_page_text))
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonPage {
    Text(String),
    Entry {
        #[serde(default)]
        index: Option<usize>,
        text: String,
    },
}

pub fn parse_json_pages(raw: &str) -> Result<PageCorpus, IngestError> {
    let entries: Vec<JsonPage> = serde_json::from_str(raw)?;

    let mut texts = Vec::with_capacity(entries.len());
    for (position, entry) in entries.into_iter().enumerate() {
        let text = match entry {
            JsonPage::Text(text) => text,
            JsonPage::Entry { index, text } => {
                if let Some(found) = index {
                    if found != position {
                        return Err(IngestError::NonContiguousIndex { position, found });
                    }
                }
                text
            }
        };
        texts.push(clean_page_text(&text));
    }
    Ok(PageCorpus::from_texts(texts))
}

/// `pdftohtml -xml`: one `<page>` per physical page, text runs in `<text>` children.
pub fn parse_pdftohtml_xml(raw: &str) -> Result<PageCorpus, IngestError> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true, // pdftohtml writes a DOCTYPE line
        ..roxmltree::ParsingOptions::default()
    };
    let document = roxmltree::Document::parse_with_options(raw, options)
        .map_err(|e| IngestError::Xml(e.to_string()))?;

    let texts: Vec<String> = document
        .descendants()
        .filter(|node| node.has_tag_name("page"))
        .map(|page| {
            let lines: Vec<String> = page
                .children()
                .filter(|node| node.has_tag_name("text"))
                .map(|run| {
                    run.descendants()
                        .filter(|node| node.is_text())
                        .filter_map(|node| node.text())
                        .collect::<String>()
                })
                .collect();
            clean_page_text(&lines.join("\n"))
        })
        .collect();

    if texts.is_empty() {
        return Err(IngestError::Xml("no <page> elements found".to_string()));
    }
    Ok(PageCorpus::from_texts(texts))
}

pub fn parse_html_pages(raw: &str) -> PageCorpus {
    let document = Html::parse_document(raw);

    let texts: Vec<String> = document
        .select(&PAGE_CONTAINER_SELECTOR)
        .map(|page| clean_page_text(&page.text().collect::<Vec<_>>().join("\n")))
        .collect();

    if !texts.is_empty() {
        return PageCorpus::from_texts(texts);
    }

    tracing::warn!("No page containers found in HTML, treating the document as a single page");
    let body_text = document
        .select(&BODY_SELECTOR)
        .next()
        .map(|body| body.text().collect::<Vec<_>>().join("\n"))
        .unwrap_or_default();
    PageCorpus::from_texts([clean_page_text(&body_text)])
}

/// Normalizes extracted page text: re-joins hyphenated line breaks, collapses
/// inline whitespace, trims lines and squeezes runs of blank lines.
pub fn clean_page_text(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let text = BROKEN_WORD_RE.replace_all(&text, "$1$2");

    let lines: Vec<String> = text
        .lines()
        .map(|line| INLINE_SPACE_RE.replace_all(line, " ").trim().to_string())
        .collect();

    BLANK_LINES_RE
        .replace_all(lines.join("\n").trim(), "\n\n")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Page;

    #[test]
    fn form_feed_text_splits_pages_and_keeps_empty_ones() {
        let corpus = parse_form_feed_text("Cover\x0c\x0cGRI Content Index\x0c");
        let texts: Vec<&str> = corpus.pages().iter().map(Page::text).collect();
        assert_eq!(texts, vec!["Cover", "", "GRI Content Index"]);
    }

    #[test]
    fn empty_text_has_no_pages() {
        assert!(parse_form_feed_text("").is_empty());
    }

    #[test]
    fn json_accepts_strings_and_entries() {
        let corpus = parse_json_pages(r#"["first", {"index": 1, "text": "second"}, {"text": ""}]"#)
            .expect("valid page list");
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.pages().get(1).map(Page::text), Some("second"));
        assert_eq!(corpus.pages().get(2).map(Page::text), Some(""));
    }

    #[test]
    fn json_rejects_gaps_in_indices() {
        let err = parse_json_pages(r#"[{"index": 0, "text": "a"}, {"index": 2, "text": "b"}]"#)
            .unwrap_err();
        assert!(matches!(err, IngestError::NonContiguousIndex { position: 1, found: 2 }));
    }

    #[test]
    fn json_rejects_garbage() {
        assert!(matches!(parse_json_pages("{not json"), Err(IngestError::Json(_))));
    }

    #[test]
    fn pdftohtml_xml_pages_are_read_in_order() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE pdf2xml SYSTEM "pdf2xml.dtd">
<pdf2xml producer="poppler" version="22.02.0">
<page number="1" position="absolute" top="0" left="0" height="842" width="595">
    <text top="10" left="10" width="100" height="12" font="0">Annual   Report</text>
</page>
<page number="2" position="absolute" top="0" left="0" height="842" width="595">
</page>
<page number="3" position="absolute" top="0" left="0" height="842" width="595">
    <text top="10" left="10" width="100" height="12" font="1"><b>GRI Content Index</b></text>
    <text top="30" left="10" width="100" height="12" font="0">2-1 Organizational details</text>
</page>
</pdf2xml>"#;
        let corpus = parse_pdftohtml_xml(xml).expect("valid xml");
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.pages().get(0).map(Page::text), Some("Annual Report"));
        assert_eq!(corpus.pages().get(1).map(Page::text), Some(""));
        assert_eq!(
            corpus.pages().get(2).map(Page::text),
            Some("GRI Content Index\n2-1 Organizational details")
        );
    }

    #[test]
    fn malformed_xml_is_an_ingest_error() {
        assert!(matches!(parse_pdftohtml_xml("<pdf2xml><page>"), Err(IngestError::Xml(_))));
    }

    #[test]
    fn html_page_containers_become_pages() {
        let html = r#"<html><body>
            <div class="page"><p>Introduction</p></div>
            <div class="page"><p>GRI Content Index</p><p>2-1&#160;Organizational details</p></div>
        </body></html>"#;
        let corpus = parse_html_pages(html);
        assert_eq!(corpus.len(), 2);
        let second = corpus.pages().get(1).map(Page::text).unwrap_or_default();
        assert!(second.contains("GRI Content Index"));
        assert!(second.contains("2-1 Organizational details"));
    }

    #[test]
    fn html_without_pages_is_one_page() {
        let corpus = parse_html_pages("<html><body><p>Just text</p></body></html>");
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.pages().get(0).map(Page::text), Some("Just text"));
    }

    #[test]
    fn cleaning_rejoins_words_but_not_codes() {
        let cleaned = clean_page_text("sustain-\n  ability   report\n417-\n2");
        assert_eq!(cleaned, "sustainability report\n417-\n2");
    }

    #[test]
    fn format_is_chosen_by_extension() {
        assert_eq!(InputFormat::from_path(Path::new("r.TXT")).ok(), Some(InputFormat::FormFeedText));
        assert_eq!(InputFormat::from_path(Path::new("r.htm")).ok(), Some(InputFormat::HtmlPages));
        assert!(matches!(
            InputFormat::from_path(Path::new("r.pdf")),
            Err(IngestError::UnsupportedFormat(_))
        ));
    }
}
