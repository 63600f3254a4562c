//! Message rendering: split one turn's text into display blocks.
//!
//! Blocks always come out in the order images, PDF cards, videos, text. The
//! source position of a URL does not move its block; only the order among
//! blocks of the same kind follows the text.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::emphasis::{Span, emphasize, spans_to_html};

// Characters that end a bare URL inside prose or markdown
const URL_TAIL: &str = r#"[^\s)\]"'<>]"#;

static IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?:!\[([^\]]*)\]\()?(https?://(?:images|plus)\.unsplash\.com/{URL_TAIL}+)"
    ))
    .expect("image pattern is valid")
});

static PDF_LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"https?://{URL_TAIL}+?/download-pdf/([^\s)\]'<>/]+\.pdf)"
    ))
    .expect("pdf link pattern is valid")
});

static VIDEO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"https?://(?:www\.|m\.)?(?:youtube\.com/(?:embed/|watch\?v=)|youtu\.be/)([A-Za-z0-9_-]{{11}}){URL_TAIL}*"
    ))
    .expect("video pattern is valid")
});

static MARKDOWN_IMAGE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^!\[[^\]]*\]\([^)]*\)$").expect("markdown image pattern is valid")
});

static MARKDOWN_LINK_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[[^\]]*\]\((\S+)\)$").expect("markdown link pattern is valid")
});

// Image captions come as "**1. Sunset over Roseau**"
static NUMBERED_BOLD_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\*\d+\.\s.*\*\*$").expect("bold heading pattern is valid")
});

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageEntry {
    pub url: String,
    pub alt: Option<String>,
}

impl ImageEntry {
    /// Caption shown for the image, or the placeholder when it failed to load.
    pub fn display_label(&self, failed: bool) -> String {
        if failed {
            return "Image unavailable".to_string();
        }
        match &self.alt {
            Some(alt) if !alt.trim().is_empty() => alt.trim().to_string(),
            _ => "Destination photo".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PdfLink {
    pub url: String,
    pub file_name: String,
    pub label: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoEmbed {
    pub source_url: String,
    pub video_id: String,
}

impl VideoEmbed {
    pub fn embed_url(&self) -> String {
        format!("https://www.youtube.com/embed/{}", self.video_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TextLine {
    Blank,
    Text(Vec<Span>),
}

impl TextLine {
    pub fn to_html(&self) -> String {
        match self {
            TextLine::Blank => "&nbsp;".to_string(),
            TextLine::Text(spans) => spans_to_html(spans),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DisplayBlock {
    Images(Vec<ImageEntry>),
    PdfLink(PdfLink),
    Video(VideoEmbed),
    Text(TextLine),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderedTurn {
    pub blocks: Vec<DisplayBlock>,
}

impl RenderedTurn {
    pub fn images(&self) -> &[ImageEntry] {
        self.blocks
            .iter()
            .find_map(|b| match b {
                DisplayBlock::Images(images) => Some(images.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }

    pub fn pdf_links(&self) -> impl Iterator<Item = &PdfLink> {
        self.blocks.iter().filter_map(|b| match b {
            DisplayBlock::PdfLink(link) => Some(link),
            _ => None,
        })
    }

    pub fn videos(&self) -> impl Iterator<Item = &VideoEmbed> {
        self.blocks.iter().filter_map(|b| match b {
            DisplayBlock::Video(video) => Some(video),
            _ => None,
        })
    }

    pub fn text_lines(&self) -> impl Iterator<Item = &TextLine> {
        self.blocks.iter().filter_map(|b| match b {
            DisplayBlock::Text(line) => Some(line),
            _ => None,
        })
    }
}

// Sentence punctuation right after a bare URL belongs to the prose
fn trim_url(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?'])
}

pub fn extract_images(text: &str) -> Vec<ImageEntry> {
    IMAGE_PATTERN
        .captures_iter(text)
        .map(|caps| ImageEntry {
            url: trim_url(&caps[2]).to_string(),
            alt: caps.get(1).map(|m| m.as_str().to_string()),
        })
        .collect()
}

pub fn extract_pdf_links(text: &str) -> Vec<PdfLink> {
    PDF_LINK_PATTERN
        .captures_iter(text)
        .map(|caps| {
            let file_name = caps[1].to_string();
            let label = file_name
                .trim_end_matches(".pdf")
                .replace(['_', '-'], " ")
                .trim()
                .to_string();
            PdfLink {
                url: caps[0].to_string(),
                file_name,
                label,
            }
        })
        .collect()
}

pub fn extract_videos(text: &str) -> Vec<VideoEmbed> {
    VIDEO_PATTERN
        .captures_iter(text)
        .map(|caps| VideoEmbed {
            source_url: trim_url(&caps[0]).to_string(),
            video_id: caps[1].to_string(),
        })
        .collect()
}

/// Render one turn's text. The text is only read, never modified.
pub fn render_turn(text: &str) -> RenderedTurn {
    let images = extract_images(text);
    let pdf_links = extract_pdf_links(text);
    let videos = extract_videos(text);

    let extracted: HashSet<&str> = images
        .iter()
        .map(|i| i.url.as_str())
        .chain(pdf_links.iter().map(|p| p.url.as_str()))
        .chain(videos.iter().map(|v| v.source_url.as_str()))
        .collect();

    let mut blocks = Vec::new();
    if !images.is_empty() {
        blocks.push(DisplayBlock::Images(images.clone()));
    }
    blocks.extend(pdf_links.iter().cloned().map(DisplayBlock::PdfLink));
    blocks.extend(videos.iter().cloned().map(DisplayBlock::Video));

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            blocks.push(DisplayBlock::Text(TextLine::Blank));
            continue;
        }
        if is_duplicate_line(trimmed, &extracted) {
            continue;
        }
        blocks.push(DisplayBlock::Text(TextLine::Text(emphasize(line))));
    }

    RenderedTurn { blocks }
}

fn is_duplicate_line(trimmed: &str, extracted: &HashSet<&str>) -> bool {
    if extracted.contains(trimmed) {
        return true;
    }
    if MARKDOWN_IMAGE_LINE.is_match(trimmed) || NUMBERED_BOLD_HEADING.is_match(trimmed) {
        return true;
    }
    MARKDOWN_LINK_LINE
        .captures(trimmed)
        .is_some_and(|caps| extracted.contains(&caps[1]))
}
