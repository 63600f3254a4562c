//! Keyword emphasis for rendered assistant text.
//!
//! A line is tokenised into spans before any markup is produced: `**bold**`
//! runs become [`SpanStyle::Strong`], and whole-word, case-insensitive matches
//! of [`EMPHASIS_KEYWORDS`] in the remaining plain text become
//! [`SpanStyle::Keyword`]. HTML is generated from the spans afterwards, so a
//! keyword can never match inside markup.

use regex::Regex;
use std::sync::LazyLock;

/// ECCU destinations and travel terms highlighted in assistant replies.
pub const EMPHASIS_KEYWORDS: &[&str] = &[
    "Antigua and Barbuda",
    "Antigua",
    "Barbuda",
    "Dominica",
    "Grenada",
    "St. Kitts and Nevis",
    "St. Kitts",
    "Nevis",
    "Saint Lucia",
    "St. Lucia",
    "St. Vincent and the Grenadines",
    "St. Vincent",
    "Grenadines",
    "Montserrat",
    "Anguilla",
    "Caribbean",
    "ECCU",
    "itinerary",
    "beach",
    "beaches",
    "rainforest",
    "waterfall",
    "waterfalls",
    "hiking",
    "snorkeling",
    "diving",
    "culture",
    "cuisine",
];

static KEYWORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    let mut words = EMPHASIS_KEYWORDS.to_vec();
    // Longest first so "St. Kitts and Nevis" wins over "St. Kitts"
    words.sort_by_key(|w| std::cmp::Reverse(w.len()));
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("keyword pattern is valid")
});

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SpanStyle {
    Plain,
    Strong,
    Keyword,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
}

impl Span {
    pub fn new(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

pub fn emphasize(line: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let parts: Vec<&str> = line.split("**").collect();
    let unpaired_tail = parts.len() % 2 == 0;

    for (i, part) in parts.iter().enumerate() {
        let is_last = i + 1 == parts.len();
        if i % 2 == 1 && !(is_last && unpaired_tail) {
            push(&mut spans, part, SpanStyle::Strong);
        } else if i % 2 == 1 {
            // A dangling "**" stays literal
            push_keywords(&mut spans, &format!("**{part}"));
        } else {
            push_keywords(&mut spans, part);
        }
    }

    spans
}

fn push_keywords(spans: &mut Vec<Span>, text: &str) {
    let mut last = 0;
    for m in KEYWORD_PATTERN.find_iter(text) {
        push(spans, &text[last..m.start()], SpanStyle::Plain);
        push(spans, m.as_str(), SpanStyle::Keyword);
        last = m.end();
    }
    push(spans, &text[last..], SpanStyle::Plain);
}

fn push(spans: &mut Vec<Span>, text: &str, style: SpanStyle) {
    if text.is_empty() {
        return;
    }
    match spans.last_mut() {
        Some(prev) if prev.style == style => prev.text.push_str(text),
        _ => spans.push(Span::new(text, style)),
    }
}

pub fn spans_to_html(spans: &[Span]) -> String {
    let mut html = String::new();
    for span in spans {
        let text = escape_html(&span.text);
        match span.style {
            SpanStyle::Plain => html.push_str(&text),
            SpanStyle::Strong => {
                html.push_str("<strong>");
                html.push_str(&text);
                html.push_str("</strong>");
            }
            SpanStyle::Keyword => {
                html.push_str("<strong class=\"keyword\">");
                html.push_str(&text);
                html.push_str("</strong>");
            }
        }
    }
    html
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
