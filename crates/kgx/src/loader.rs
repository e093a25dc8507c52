//! Fetch a web page and reduce it to its readable text.
//!
//! Text extraction is a [`TextExtractor`] strategy. [`ExtractorStrategy`] picks the chain once,
//! when the [`WebLoader`] is built; the loader then tries each extractor in order until one
//! returns text.

use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use strum_macros::{Display, EnumString};
use tracing::{debug, info};
use url::Url;

use crate::errors::{KgError, KgResult};

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (compatible; kgx/0.1)";

/// Elements that never carry article text
const BOILERPLATE_TAGS: [&str; 7] = ["script", "style", "noscript", "header", "footer", "nav", "aside"];

lazy_static! {
    static ref BLANK_RUNS: Regex = Regex::new(r"\n\s*\n+").unwrap();
    static ref MAIN_CONTENT: Vec<Selector> = ["article", "main", "[role='main']"]
        .iter()
        .map(|s| Selector::parse(s).unwrap())
        .collect();
}

/// A way of turning an HTML document into plain text
pub trait TextExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// The page text, or `None` when this extractor found nothing usable
    fn extract(&self, html: &str) -> Option<String>;
}

/// Reads only the page's main content container (`article`, `main` or `role="main"`)
pub struct MainContentExtractor;

impl TextExtractor for MainContentExtractor {
    fn name(&self) -> &'static str {
        "main-content"
    }

    fn extract(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        MAIN_CONTENT.iter().find_map(|selector| {
            document
                .select(selector)
                .map(visible_text)
                .max_by_key(|text| text.chars().count())
                .filter(|text| !text.is_empty())
        })
    }
}

/// Reads the whole document after dropping scripts, styles and navigation chrome
pub struct MarkupStripExtractor;

impl TextExtractor for MarkupStripExtractor {
    fn name(&self) -> &'static str {
        "markup-strip"
    }

    fn extract(&self, html: &str) -> Option<String> {
        let document = Html::parse_document(html);
        let text = visible_text(document.root_element());
        (!text.is_empty()).then_some(text)
    }
}

/// Collect the text under `element`, skipping boilerplate subtrees, one text node per line
fn visible_text(element: ElementRef) -> String {
    let mut lines = Vec::new();
    for node in element.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let in_boilerplate = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| BOILERPLATE_TAGS.contains(&el.name()))
        });
        if !in_boilerplate {
            lines.push(text.trim());
        }
    }
    collapse_blank_lines(&lines.join("\n"))
}

fn collapse_blank_lines(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n").trim().to_string()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ExtractorStrategy {
    /// Main content first, whole-page stripping when that finds nothing
    #[default]
    Auto,
    MainContent,
    MarkupStrip,
}

impl ExtractorStrategy {
    pub fn extractors(self) -> Vec<Box<dyn TextExtractor>> {
        match self {
            ExtractorStrategy::Auto => {
                vec![Box::new(MainContentExtractor), Box::new(MarkupStripExtractor)]
            }
            ExtractorStrategy::MainContent => vec![Box::new(MainContentExtractor)],
            ExtractorStrategy::MarkupStrip => vec![Box::new(MarkupStripExtractor)],
        }
    }
}

pub struct WebLoader {
    client: Client,
    extractors: Vec<Box<dyn TextExtractor>>,
}

impl WebLoader {
    pub fn new(strategy: ExtractorStrategy, timeout: Duration) -> KgResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| KgError::Fetch(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            extractors: strategy.extractors(),
        })
    }

    /// Download `url` and extract its main text. The text is empty when nothing readable was found.
    pub async fn fetch_main_text(&self, url: &str) -> KgResult<String> {
        let parsed = Url::parse(url).map_err(|e| KgError::Fetch(format!("Invalid URL {}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(KgError::Fetch(format!("Unsupported URL scheme: {}", parsed.scheme())));
        }

        info!(%url, "fetching page");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, BROWSER_USER_AGENT)
            .send()
            .await
            .map_err(|e| KgError::Fetch(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KgError::Fetch(format!("{} returned {}", url, status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| KgError::Fetch(format!("{}: {}", url, e)))?;
        Ok(self.extract_text(&html))
    }

    /// Run the extractor chain over an HTML document
    pub fn extract_text(&self, html: &str) -> String {
        for extractor in &self.extractors {
            if let Some(text) = extractor.extract(html) {
                debug!(extractor = extractor.name(), chars = text.chars().count(), "extracted page text");
                return text;
            }
        }
        String::new()
    }
}

/// Keep at most `max_chars` characters of `text`, never splitting a character
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}
