// file: src/parser/html.rs
// description: HTML parser for web page content ingestion
// reference: https://docs.rs/scraper

use super::SourceParser;
use crate::config::HtmlConfig;
use crate::error::{IngestError, Result};
use crate::models::ParsedDocument;
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use url::Url;

/// Elements whose text never contributes to extracted content.
const EXCLUDED_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// Block-level tags that carry the meaningful text of a page.
const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "blockquote", "pre",
];

/// Parser for HTML web pages: fetches pages over HTTP, extracts readable
/// text and metadata, and discovers outbound links for the crawler.
pub struct HtmlParser {
    client: reqwest::Client,
    selectors: DocSelectors,
}

struct DocSelectors {
    title: Selector,
    main: Selector,
    article: Selector,
    body: Selector,
    anchors: Selector,
    meta_description: Selector,
    meta_keywords: Selector,
    og_title: Selector,
}

impl DocSelectors {
    fn new() -> Self {
        // Selector strings are static and known-valid.
        Self {
            title: Selector::parse("title").expect("title selector"),
            main: Selector::parse("main").expect("main selector"),
            article: Selector::parse("article").expect("article selector"),
            body: Selector::parse("body").expect("body selector"),
            anchors: Selector::parse("a[href]").expect("anchor selector"),
            meta_description: Selector::parse(r#"meta[name="description"]"#)
                .expect("description selector"),
            meta_keywords: Selector::parse(r#"meta[name="keywords"]"#)
                .expect("keywords selector"),
            og_title: Selector::parse(r#"meta[property="og:title"]"#).expect("og:title selector"),
        }
    }
}

impl HtmlParser {
    pub fn new(config: &HtmlConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| IngestError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            selectors: DocSelectors::new(),
        })
    }

    fn extract_title(&self, document: &Html) -> String {
        if let Some(title) = document.select(&self.selectors.title).next() {
            let text = collapse_whitespace(&title.text().collect::<String>());
            if !text.is_empty() {
                return text;
            }
        }
        for element in document.root_element().descendent_elements() {
            if element.value().name() == "h1" {
                let text = collapse_whitespace(&element.text().collect::<String>());
                if !text.is_empty() {
                    return text;
                }
            }
        }
        String::new()
    }

    /// Extracts readable text from the main content area, preferring
    /// `<main>` and `<article>` over the full body. Malformed markup
    /// degrades to whatever text scraper can recover.
    fn extract_content(&self, document: &Html) -> String {
        let root = document
            .select(&self.selectors.main)
            .next()
            .or_else(|| document.select(&self.selectors.article).next())
            .or_else(|| document.select(&self.selectors.body).next())
            .unwrap_or_else(|| document.root_element());

        let mut lines: Vec<String> = Vec::new();
        for element in root.descendent_elements() {
            let tag = element.value().name();
            if !BLOCK_TAGS.contains(&tag) || has_excluded_ancestor(element) {
                continue;
            }
            let text = collapse_whitespace(&element.text().collect::<String>());
            if !text.is_empty() {
                lines.push(text);
            }
        }

        if lines.is_empty() {
            // No recognizable block structure; fall back to the raw text,
            // still skipping script/style and friends.
            let mut raw = String::new();
            for node in root.descendants() {
                if let Some(text) = node.value().as_text() {
                    let excluded = node.ancestors().any(|ancestor| {
                        ancestor
                            .value()
                            .as_element()
                            .map(|el| EXCLUDED_TAGS.contains(&el.name()))
                            .unwrap_or(false)
                    });
                    if !excluded {
                        raw.push_str(text);
                        raw.push(' ');
                    }
                }
            }
            return collapse_whitespace(&raw);
        }
        lines.join("\n")
    }

    fn extract_metadata(&self, document: &Html, source: &str) -> BTreeMap<String, Value> {
        let mut metadata = BTreeMap::new();

        if let Ok(url) = Url::parse(source) {
            if let Some(host) = url.host_str() {
                metadata.insert("domain".to_string(), Value::String(host.to_string()));
            }
            metadata.insert("path".to_string(), Value::String(url.path().to_string()));
        }

        let meta_content = |selector: &Selector| -> Option<String> {
            document
                .select(selector)
                .next()
                .and_then(|el| el.value().attr("content"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(description) = meta_content(&self.selectors.meta_description) {
            metadata.insert("description".to_string(), Value::String(description));
        }
        if let Some(keywords) = meta_content(&self.selectors.meta_keywords) {
            metadata.insert("keywords".to_string(), Value::String(keywords));
        }
        if let Some(og_title) = meta_content(&self.selectors.og_title) {
            metadata.insert("og_title".to_string(), Value::String(og_title));
        }

        metadata
    }
}

#[async_trait]
impl SourceParser for HtmlParser {
    fn source_type(&self) -> &str {
        "html"
    }

    async fn fetch(&self, locator: &str) -> Result<String> {
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(|e| IngestError::Fetch {
                locator: locator.to_string(),
                message: e.to_string(),
            })?;

        let response = response.error_for_status().map_err(|e| IngestError::Fetch {
            locator: locator.to_string(),
            message: e.to_string(),
        })?;

        response.text().await.map_err(|e| IngestError::Fetch {
            locator: locator.to_string(),
            message: format!("Failed to read response body: {}", e),
        })
    }

    fn parse(&self, content: &str, locator: &str) -> Result<ParsedDocument> {
        let document = Html::parse_document(content);

        let title = self.extract_title(&document);
        let text = self.extract_content(&document);
        let metadata = self.extract_metadata(&document, locator);

        if text.trim().is_empty() {
            return Err(IngestError::Parse {
                locator: locator.to_string(),
                message: "no extractable text content".to_string(),
            });
        }

        Ok(ParsedDocument::new(
            locator.to_string(),
            title,
            text,
            metadata,
            self.source_type().to_string(),
        ))
    }

    /// Resolves every `<a href>` against the base URL, strips fragments,
    /// and returns deduplicated absolute http(s) links in discovery order.
    fn extract_links(&self, content: &str, base: &str) -> Vec<String> {
        let Ok(base_url) = Url::parse(base) else {
            return Vec::new();
        };

        let document = Html::parse_document(content);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in document.select(&self.selectors.anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let Ok(mut resolved) = base_url.join(href) else {
                continue;
            };
            resolved.set_fragment(None);
            if !matches!(resolved.scheme(), "http" | "https") {
                continue;
            }
            let url = resolved.to_string();
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }

        links
    }
}

fn has_excluded_ancestor(element: ElementRef<'_>) -> bool {
    element.ancestors().any(|node| {
        node.value()
            .as_element()
            .map(|el| EXCLUDED_TAGS.contains(&el.name()))
            .unwrap_or(false)
    })
}

fn collapse_whitespace(input: &str) -> String {
    let mut buf = String::with_capacity(input.len());
    let mut last_space = false;
    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_space && !buf.is_empty() {
                buf.push(' ');
            }
            last_space = true;
        } else {
            buf.push(ch);
            last_space = false;
        }
    }
    buf.trim().to_string()
}
