//! Corpus acquisition.
//!
//! Produces the single raw text blob the pipeline ingests, either by
//! fetching the configured URL and extracting the visible text from
//! content-bearing tags, or by reading a local plain-text file.

use anyhow::{bail, Context, Result};
use scraper::{Html, Selector};
use std::time::Duration;

use crate::config::CorpusConfig;

/// Tags whose text is worth indexing. Container tags like `div` and `span`
/// are skipped: their text is the concatenation of their children's and
/// would put every sentence into the corpus several times over.
const CONTENT_TAGS: &str = "p, h1, h2, h3, h4, h5, h6, li, blockquote, td, figcaption";

/// Load the raw corpus text from the configured source.
pub async fn load_corpus(config: &CorpusConfig) -> Result<String> {
    if let Some(path) = &config.file {
        return std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read corpus file: {}", path.display()));
    }

    let url = config
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("corpus source is unset"))?;
    let html = fetch_html(url, config.timeout_secs).await?;
    Ok(extract_text(&html))
}

/// Fetch the target page body.
async fn fetch_html(url: &str, timeout_secs: u64) -> Result<String> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to fetch corpus from {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("Corpus fetch failed: {} returned {}", url, status);
    }

    Ok(response.text().await?)
}

/// Extract visible text from an HTML document.
///
/// Collects the text of each content tag, collapses runs of whitespace,
/// drops empty tags, and joins everything with newlines.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = Selector::parse(CONTENT_TAGS).expect("content tag selector");

    let mut lines = Vec::new();
    for element in document.select(&selector) {
        let text = element
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ");
        if !text.is_empty() {
            lines.push(text);
        }
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_text_from_content_tags() {
        let html = r#"
            <html><body>
                <h1>Acme Widgets</h1>
                <p>The Pro plan costs ₹4999.</p>
                <ul><li>Free forever tier</li></ul>
            </body></html>
        "#;
        let text = extract_text(html);
        assert!(text.contains("Acme Widgets"));
        assert!(text.contains("The Pro plan costs ₹4999."));
        assert!(text.contains("Free forever tier"));
    }

    #[test]
    fn test_extract_text_ignores_script_and_style() {
        let html = r#"
            <html><head><style>p { color: red; }</style></head>
            <body><script>var tracking = true;</script>
            <p>Visible copy.</p></body></html>
        "#;
        let text = extract_text(html);
        assert_eq!(text, "Visible copy.");
    }

    #[test]
    fn test_extract_text_collapses_whitespace() {
        let html = "<p>spread \n\t  out   text</p>";
        assert_eq!(extract_text(html), "spread out text");
    }

    #[test]
    fn test_extract_text_empty_document() {
        assert_eq!(extract_text("<html><body></body></html>"), "");
    }

    #[tokio::test]
    async fn test_load_corpus_from_file() {
        use std::io::Write;
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"Plain corpus text.").unwrap();

        let config = CorpusConfig {
            url: None,
            file: Some(f.path().to_path_buf()),
            timeout_secs: 5,
        };
        let text = load_corpus(&config).await.unwrap();
        assert_eq!(text, "Plain corpus text.");
    }
}
