//! Free-text link entries, one per line, parsed into (label, url) pairs.
//!
//! Three input shapes are accepted: Markdown `[label](url)`, `label: url`,
//! and a bare url optionally trailed by `(label)` or free text. Formatting
//! back always emits the canonical `label: url` shape (bare url when the
//! label is empty), so a round trip through parse/format is lossy by
//! design.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"https?://[^\s()<>]+").expect("url pattern compiles"));

static MARKDOWN_LINK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\]]+)\]\((https?://[^)]+)\)").expect("markdown pattern compiles"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub label: String,
    pub url: String,
}

impl Link {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Link {
            label: label.into(),
            url: url.into(),
        }
    }
}

pub fn parse_links(text: &str) -> Vec<Link> {
    let mut links = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = MARKDOWN_LINK_RE.captures(line) {
            links.push(Link::new(caps[1].trim(), caps[2].trim()));
            continue;
        }

        let Some(m) = URL_RE.find(line) else {
            continue;
        };
        let url = m.as_str();
        let remaining = line.replacen(url, "", 1);
        let remaining = remaining.trim();

        let label = if let Some(head) = remaining.split_once(':').map(|(head, _)| head) {
            head.trim().to_string()
        } else if remaining.starts_with('(') && remaining.ends_with(')') {
            remaining[1..remaining.len() - 1].trim().to_string()
        } else {
            remaining.to_string()
        };

        links.push(Link::new(label, url));
    }
    links
}

pub fn format_links(links: &[Link]) -> String {
    let mut lines = Vec::new();
    for link in links {
        let url = link.url.trim();
        if url.is_empty() {
            continue;
        }
        let label = link.label.trim();
        if label.is_empty() {
            lines.push(url.to_string());
        } else {
            lines.push(format!("{label}: {url}"));
        }
    }
    lines.join("\n")
}
