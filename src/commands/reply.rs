use crate::error::OcrError;
use crate::gateway::{OcrResult, Recognition};
use serde::Serialize;

pub const NO_IMAGES: &str = "No images or direct image links were detected. 😢";
pub const NO_TEXT: &str = "No text detected.";

/// Opening and closing fence around one page, newlines included
const FENCE_OVERHEAD: usize = "```\n\n```".len();
const JSON_FENCE_OVERHEAD: usize = "```json\n\n```".len();

/// What the host should send back to the channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reply {
    /// A single message
    Message { content: String },
    /// Messages to be sent (or paged through) in order
    Pages { pages: Vec<String> },
}

impl Reply {
    pub fn message(content: impl Into<String>) -> Self {
        Self::Message {
            content: content.into(),
        }
    }

    /// All message bodies in send order
    pub fn contents(&self) -> Vec<&str> {
        match self {
            Self::Message { content } => vec![content.as_str()],
            Self::Pages { pages } => pages.iter().map(String::as_str).collect(),
        }
    }
}

/// Turn a gateway result into exactly one reply
pub fn render(result: OcrResult, page_length: usize) -> Reply {
    match result {
        Ok(Recognition::Text(text)) if text.trim().is_empty() => Reply::message(NO_TEXT),
        Ok(Recognition::Text(text)) => Reply::Pages {
            pages: pagify(&text, page_length.saturating_sub(FENCE_OVERHEAD))
                .into_iter()
                .map(|page| format!("```\n{}\n```", page))
                .collect(),
        },
        Ok(Recognition::NoText) => Reply::message(NO_TEXT),
        Ok(Recognition::Unrecognized(raw)) => Reply::Pages {
            pages: split_chars(&raw, page_length.saturating_sub(JSON_FENCE_OVERHEAD))
                .into_iter()
                .map(|page| format!("```json\n{}\n```", page))
                .collect(),
        },
        Err(e) => Reply::message(error_message(&e)),
    }
}

/// User-facing text for a failed request
pub fn error_message(error: &OcrError) -> String {
    match error {
        OcrError::NoImageFound => NO_IMAGES.to_string(),
        OcrError::HttpStatus { status } => format!("https://http.cat/{}", status),
        other => other.to_string(),
    }
}

/// Split `text` into pages of at most `page_length` characters.
///
/// Pages break at the last newline inside the window, then the last space,
/// and only cut mid-word when neither exists. Whitespace-only pages are
/// dropped.
pub fn pagify(text: &str, page_length: usize) -> Vec<String> {
    let limit = page_length.max(1);
    let mut pages = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let cut = match rest.char_indices().nth(limit) {
            Some((index, _)) => index,
            None => {
                push_page(&mut pages, rest);
                break;
            }
        };

        // A delimiter right after the limit still yields a full page
        let window_end = cut + rest[cut..].chars().next().map_or(0, char::len_utf8);
        let window = &rest[..window_end];
        let split = window
            .rfind('\n')
            .or_else(|| window.rfind(' '))
            .filter(|&index| index > 0)
            .unwrap_or(cut);

        let (page, tail) = rest.split_at(split);
        push_page(&mut pages, page);
        rest = tail
            .strip_prefix(|c: char| c == '\n' || c == ' ')
            .unwrap_or(tail);
    }

    pages
}

/// Split `text` into chunks of at most `page_length` characters without
/// dropping anything, so the chunks concatenate back to `text`.
pub fn split_chars(text: &str, page_length: usize) -> Vec<String> {
    let limit = page_length.max(1);
    let mut pages = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(limit)
            .map_or(rest.len(), |(index, _)| index);
        let (page, tail) = rest.split_at(cut);
        pages.push(page.to_string());
        rest = tail;
    }

    pages
}

fn push_page(pages: &mut Vec<String>, page: &str) {
    if !page.trim().is_empty() {
        pages.push(page.to_string());
    }
}
