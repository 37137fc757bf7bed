//! Paper discovery
//!
//! Searches the arXiv Atom API and downloads paper PDFs into the local
//! documents directory.

use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use chrono::{DateTime, Utc};
use paperdigest_common::config::DiscoveryConfig;
use paperdigest_common::errors::{AppError, Result};
use paperdigest_common::models::Paper;
use regex_lite::Regex;
use reqwest::StatusCode;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// A searchable source of papers
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Up to `max_results` papers matching `query`, most relevant first
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>>;

    /// Make the paper's PDF available under `docs_dir` and return its path
    async fn fetch_pdf(&self, paper: &Paper, docs_dir: &Path) -> Result<PathBuf>;
}

/// Client for the arXiv export API
pub struct ArxivClient {
    client: reqwest::Client,
    api_base: String,
    parser: AtomParser,
}

impl ArxivClient {
    pub fn new(config: &DiscoveryConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            parser: AtomParser::new()?,
        })
    }

    /// One feed request. Transport failures, 429 and 5xx responses are
    /// transient; any other error status is permanent.
    async fn fetch_feed(
        &self,
        query: &str,
        max_results: usize,
    ) -> std::result::Result<String, backoff::Error<AppError>> {
        let response = self
            .client
            .get(&self.api_base)
            .query(&[
                ("search_query", format!("all:{}", query)),
                ("start", "0".to_string()),
                ("max_results", max_results.to_string()),
                ("sortBy", "relevance".to_string()),
                ("sortOrder", "descending".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                backoff::Error::transient(AppError::Discovery {
                    message: format!("arXiv request failed: {}", e),
                })
            })?;

        let status = response.status();
        if !status.is_success() {
            let err = AppError::Discovery {
                message: format!("arXiv returned {}", status),
            };
            return Err(if is_retryable_status(status) {
                backoff::Error::transient(err)
            } else {
                backoff::Error::permanent(err)
            });
        }

        response.text().await.map_err(|e| {
            backoff::Error::transient(AppError::Discovery {
                message: format!("Failed to read arXiv response: {}", e),
            })
        })
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

#[async_trait]
impl PaperSource for ArxivClient {
    #[instrument(skip(self))]
    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>> {
        if query.trim().is_empty() {
            return Err(AppError::empty_input("paper search"));
        }
        if max_results == 0 {
            return Ok(Vec::new());
        }

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(Duration::from_millis(500))
            .with_max_elapsed_time(Some(Duration::from_secs(20)))
            .build();

        let feed = backoff::future::retry(policy, || async move {
            self.fetch_feed(query, max_results).await.map_err(|e| {
                if let backoff::Error::Transient { err, .. } = &e {
                    warn!(error = %err, "arXiv search failed, retrying");
                }
                e
            })
        })
        .await?;

        let mut papers = self.parser.parse(&feed);
        papers.truncate(max_results);

        info!(result_count = papers.len(), "arXiv search completed");
        Ok(papers)
    }

    #[instrument(skip(self, paper, docs_dir), fields(paper_id = %paper.id))]
    async fn fetch_pdf(&self, paper: &Paper, docs_dir: &Path) -> Result<PathBuf> {
        let path = docs_dir.join(format!("{}.pdf", paper.id));
        if tokio::fs::try_exists(&path).await? {
            debug!(path = %path.display(), "PDF already downloaded");
            return Ok(path);
        }

        let url = paper.pdf_url.as_deref().ok_or_else(|| AppError::Discovery {
            message: format!("paper {} has no PDF link", paper.id),
        })?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Discovery {
                message: format!("PDF download failed for {}: {}", paper.id, e),
            })?;
        let bytes = response.bytes().await?;

        tokio::fs::create_dir_all(docs_dir).await?;
        tokio::fs::write(&path, &bytes).await?;

        info!(bytes = bytes.len(), path = %path.display(), "PDF downloaded");
        Ok(path)
    }
}

/// Minimal Atom feed reader for arXiv query responses
struct AtomParser {
    entry: Regex,
    id: Regex,
    title: Regex,
    summary: Regex,
    author: Regex,
    published: Regex,
    pdf_link: Regex,
}

impl AtomParser {
    fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| AppError::Configuration {
                message: format!("invalid feed pattern: {}", e),
            })
        };

        Ok(Self {
            entry: compile(r"(?s)<entry>(.*?)</entry>")?,
            id: compile(r"(?s)<id>(.*?)</id>")?,
            title: compile(r"(?s)<title[^>]*>(.*?)</title>")?,
            summary: compile(r"(?s)<summary[^>]*>(.*?)</summary>")?,
            author: compile(r"(?s)<author>.*?<name>(.*?)</name>.*?</author>")?,
            published: compile(r"<published>([^<]*)</published>")?,
            pdf_link: compile(r#"<link[^>]*title="pdf"[^>]*href="([^"]*)"|<link[^>]*href="([^"]*)"[^>]*title="pdf""#)?,
        })
    }

    fn parse(&self, feed: &str) -> Vec<Paper> {
        self.entry
            .captures_iter(feed)
            .filter_map(|entry| entry.get(1).and_then(|body| self.parse_entry(body.as_str())))
            .collect()
    }

    fn parse_entry(&self, body: &str) -> Option<Paper> {
        let entry_id = capture(&self.id, body)?;
        let id = entry_id.trim().rsplit('/').next()?.to_string();
        if id.is_empty() {
            return None;
        }

        let title = capture(&self.title, body)
            .map(|t| collapse_whitespace(&unescape(t)))
            .unwrap_or_default();
        let summary = capture(&self.summary, body)
            .map(|s| unescape(s).trim().to_string())
            .unwrap_or_default();
        let authors = self
            .author
            .captures_iter(body)
            .filter_map(|c| c.get(1).map(|m| collapse_whitespace(&unescape(m.as_str()))))
            .collect();
        let published = capture(&self.published, body)
            .and_then(|p| DateTime::parse_from_rfc3339(p.trim()).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let pdf_url = self.pdf_link.captures(body).and_then(|c| {
            c.get(1)
                .or_else(|| c.get(2))
                .map(|m| unescape(m.as_str()))
        });

        Some(Paper {
            id,
            title,
            authors,
            summary,
            pdf_url,
            published,
            local_path: None,
        })
    }
}

fn capture<'a>(regex: &Regex, text: &'a str) -> Option<&'a str> {
    regex.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str())
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
