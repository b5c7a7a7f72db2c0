use crate::config::FetchConfig;
use crate::receipt::document::FetchedDocument;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::{redirect, Client, StatusCode};
use std::time::Duration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_PT_BR: &str = "pt-BR,pt;q=0.9,en;q=0.8";
const MAX_REDIRECTS: usize = 10;

/// 小票页面抓取器
///
/// 单次 GET, 浏览器 UA + pt-BR 语言偏好, 跟随重定向, 整体超时。
/// 网络错误 / 超时 / 非 200 都视为"没有数据", 返回 None 而不是错误。
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_PT_BR));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client })
    }

    pub async fn fetch_page(&self, url: &str) -> Option<FetchedDocument> {
        let body = self.fetch_html(url).await?;
        Some(FetchedDocument::parse(&body))
    }

    async fn fetch_html(&self, url: &str) -> Option<String> {
        let start = std::time::Instant::now();

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("receipt fetch failed for {}: {}", url, e);
                return None;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("receipt fetch for {} returned {}", url, status);
            return None;
        }

        match response.text().await {
            Ok(body) => {
                tracing::info!(
                    "fetched receipt page {} ({} bytes, {:?})",
                    url,
                    body.len(),
                    start.elapsed()
                );
                Some(body)
            }
            Err(e) => {
                tracing::warn!("reading receipt body from {} failed: {}", url, e);
                None
            }
        }
    }
}
