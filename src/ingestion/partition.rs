use super::{Element, ElementKind, Partitioner};
use crate::errors::IngestError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static BULLET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*(?:[-*+•‣◦]|\d+[.)])\s+").unwrap());

static MD_HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#{1,6}\s+(.*?)(?:\s+#+)?$").unwrap());
static MD_RULE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:-{3,}|\*{3,}|_{3,})$").unwrap());
static MD_IMAGE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[([^\]]*)\]\([^)]*\)").unwrap());
static MD_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
// Only paired delimiters hugging non-space text; a lone `*` is arithmetic
static MD_STRONG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(\S(?:.*?\S)?)\*\*|__(\S(?:.*?\S)?)__").unwrap());
static MD_EMPHASIS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(\S(?:[^*]*?\S)?)\*").unwrap());
static MD_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`]+)`").unwrap());

static HTML_SKIPPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>|<![^>]*>")
        .unwrap()
});
static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<(/?)([a-zA-Z][a-zA-Z0-9]*)\b[^>]*>").unwrap());
static HTML_NUMERIC_ENTITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#(\d+);").unwrap());

/// Document formats the automatic partitioner understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Markdown,
    Html,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "text" | "log" => Some(Self::PlainText),
            "md" | "markdown" => Some(Self::Markdown),
            "html" | "htm" | "xhtml" => Some(Self::Html),
            _ => None,
        }
    }

    /// Guess the format from file contents. Binary data yields `None`.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(bytes).ok()?;
        if text.contains('\0') {
            return None;
        }

        let head: String = text.trim_start().chars().take(512).collect();
        let head = head.to_ascii_lowercase();
        if head.starts_with("<!doctype html") || head.contains("<html") {
            Some(Self::Html)
        } else {
            Some(Self::PlainText)
        }
    }
}

/// Partitioner that picks a format from the extension, falling back to content sniffing
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoPartitioner;

impl AutoPartitioner {
    pub fn detect(path: &Path, bytes: &[u8]) -> Option<DocumentFormat> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(DocumentFormat::from_extension)
            .or_else(|| DocumentFormat::sniff(bytes))
    }

    /// Partition already-loaded text in the given format
    pub fn partition_str(format: DocumentFormat, source: &str) -> Vec<Element> {
        let source = source.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        match format {
            DocumentFormat::PlainText => partition_plain_text(&source),
            DocumentFormat::Markdown => partition_markdown(&source),
            DocumentFormat::Html => partition_html(&source),
        }
    }
}

impl Partitioner for AutoPartitioner {
    fn partition(&self, path: &Path) -> Result<Vec<Element>, IngestError> {
        let bytes = std::fs::read(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let format = Self::detect(path, &bytes)
            .ok_or_else(|| IngestError::UnsupportedFormat(path.to_path_buf()))?;
        log::debug!("Detected {:?} for {}", format, path.display());

        let source = String::from_utf8_lossy(&bytes);
        Ok(Self::partition_str(format, &source))
    }
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}

fn strip_bullet(line: &str) -> String {
    collapse_whitespace(&BULLET.replace(line, ""))
}

fn looks_like_title(text: &str) -> bool {
    let ends_with_punctuation = text.ends_with(['.', '!', '?', ':', ';', ',']);
    let words = text.split_whitespace().count();
    !ends_with_punctuation && words <= 12 && text.chars().any(char::is_alphabetic)
}

fn partition_plain_text(source: &str) -> Vec<Element> {
    let mut elements = Vec::new();

    for (page_index, page) in source.split('\u{c}').enumerate() {
        if page_index > 0 {
            elements.push(Element::page_break());
        }

        for block in BLANK_LINES.split(page) {
            let lines: Vec<&str> = block
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();
            if lines.is_empty() {
                continue;
            }

            if lines.iter().all(|line| BULLET.is_match(line)) {
                elements.extend(
                    lines
                        .iter()
                        .map(|line| Element::new(ElementKind::ListItem, strip_bullet(line))),
                );
                continue;
            }

            let text = collapse_whitespace(block);
            let kind = if lines.len() == 1 && looks_like_title(&text) {
                ElementKind::Title
            } else {
                ElementKind::NarrativeText
            };
            elements.push(Element::new(kind, text));
        }
    }

    elements
}

fn clean_markdown_inline(text: &str) -> String {
    let text = MD_IMAGE.replace_all(text, "$1");
    let text = MD_LINK.replace_all(&text, "$1");
    let text = MD_CODE.replace_all(&text, "$1");
    let text = MD_STRONG.replace_all(&text, "$1$2");
    let text = MD_EMPHASIS.replace_all(&text, "$1");
    collapse_whitespace(&text)
}

fn flush_paragraph(paragraph: &mut Vec<&str>, elements: &mut Vec<Element>) {
    if paragraph.is_empty() {
        return;
    }
    let text = clean_markdown_inline(&paragraph.join(" "));
    if !text.is_empty() {
        elements.push(Element::new(ElementKind::NarrativeText, text));
    }
    paragraph.clear();
}

fn partition_markdown(source: &str) -> Vec<Element> {
    let mut elements = Vec::new();
    let mut paragraph: Vec<&str> = Vec::new();
    let mut code_block: Option<Vec<&str>> = None;

    for line in source.lines() {
        let trimmed = line.trim();

        if let Some(code) = code_block.as_mut() {
            if trimmed.starts_with("```") {
                elements.push(Element::new(ElementKind::CodeSnippet, code.join("\n")));
                code_block = None;
            } else {
                code.push(line);
            }
            continue;
        }

        if trimmed.starts_with("```") {
            flush_paragraph(&mut paragraph, &mut elements);
            code_block = Some(Vec::new());
        } else if trimmed.is_empty() || MD_RULE.is_match(trimmed) {
            flush_paragraph(&mut paragraph, &mut elements);
        } else if let Some(caps) = MD_HEADING.captures(trimmed) {
            flush_paragraph(&mut paragraph, &mut elements);
            elements.push(Element::new(
                ElementKind::Title,
                clean_markdown_inline(&caps[1]),
            ));
        } else if BULLET.is_match(trimmed) {
            flush_paragraph(&mut paragraph, &mut elements);
            let item = clean_markdown_inline(&BULLET.replace(trimmed, ""));
            elements.push(Element::new(ElementKind::ListItem, item));
        } else {
            paragraph.push(trimmed);
        }
    }

    // Unterminated fence: keep what we have
    if let Some(code) = code_block {
        elements.push(Element::new(ElementKind::CodeSnippet, code.join("\n")));
    }
    flush_paragraph(&mut paragraph, &mut elements);

    elements
}

fn decode_entities(text: &str) -> String {
    let text = HTML_NUMERIC_ENTITY.replace_all(text, |caps: &regex::Captures| {
        caps[1]
            .parse::<u32>()
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_default()
    });

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

struct HtmlSegmenter {
    elements: Vec<Element>,
    buffer: String,
    kind: ElementKind,
}

impl HtmlSegmenter {
    fn flush(&mut self) {
        let decoded = decode_entities(&self.buffer);
        let text = if self.kind == ElementKind::CodeSnippet {
            decoded.trim_matches('\n').to_string()
        } else {
            collapse_whitespace(&decoded)
        };
        if !text.trim().is_empty() {
            self.elements.push(Element::new(self.kind, text));
        }
        self.buffer.clear();
    }

    fn enter(&mut self, kind: ElementKind, closing: bool) {
        self.flush();
        self.kind = if closing {
            ElementKind::NarrativeText
        } else {
            kind
        };
    }
}

fn partition_html(source: &str) -> Vec<Element> {
    let source = HTML_SKIPPED.replace_all(source, "");
    let mut segmenter = HtmlSegmenter {
        elements: Vec::new(),
        buffer: String::new(),
        kind: ElementKind::NarrativeText,
    };
    let mut last = 0;

    for caps in HTML_TAG.captures_iter(&source) {
        let Some(tag) = caps.get(0) else {
            continue;
        };
        segmenter.buffer.push_str(&source[last..tag.start()]);
        last = tag.end();

        let closing = &caps[1] == "/";
        match caps[2].to_ascii_lowercase().as_str() {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "title" => {
                segmenter.enter(ElementKind::Title, closing)
            }
            "li" | "dt" | "dd" => segmenter.enter(ElementKind::ListItem, closing),
            "pre" => segmenter.enter(ElementKind::CodeSnippet, closing),
            "hr" => {
                segmenter.flush();
                segmenter.elements.push(Element::page_break());
            }
            "br" if segmenter.kind == ElementKind::CodeSnippet => segmenter.buffer.push('\n'),
            "br" | "p" | "div" | "tr" | "td" | "th" | "table" | "ul" | "ol" | "dl"
            | "section" | "article" | "header" | "footer" | "blockquote" | "body" | "main"
            | "nav" | "aside" | "figure" | "figcaption" => {
                segmenter.flush();
            }
            _ => {}
        }
    }
    segmenter.buffer.push_str(&source[last..]);
    segmenter.flush();

    segmenter.elements
}
