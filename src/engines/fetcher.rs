// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScanSettings;
use crate::domain::models::result_bundle::DowngradeCheck;
use crate::utils::url_utils;
use crate::utils::validators::{self, ValidationError};
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::debug;
use url::Url;

/// 抓取错误类型
#[derive(Error, Debug)]
pub enum FetchError {
    /// 请求失败
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// 重定向次数过多
    #[error("Too many redirects (more than {0})")]
    TooManyRedirects(usize),
    /// URL无效
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// 目标被 SSRF 校验拒绝
    #[error("Blocked target: {0}")]
    Blocked(#[from] ValidationError),
}

/// 抓取到的页面
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub requested_url: Url,
    pub final_url: Url,
    pub status: u16,
    /// 小写响应头，多值以 `, ` 连接
    pub headers: HashMap<String, String>,
    pub body: String,
    /// 依次访问的URL，首项为请求地址
    pub redirect_chain: Vec<String>,
    pub response_time_ms: u64,
}

impl FetchedPage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    pub fn redirect_hops(&self) -> usize {
        self.redirect_chain.len().saturating_sub(1)
    }

    pub fn is_success(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// 页面抓取器
///
/// 所有请求都手动跟随重定向：记录完整的跳转链，并在每一跳做 SSRF 校验
pub struct PageFetcher {
    client: reqwest::Client,
    allow_private: bool,
    max_redirects: usize,
}

/// 跟随重定向后的最终响应
struct Followed {
    final_url: Url,
    chain: Vec<String>,
    response: reqwest::Response,
}

impl PageFetcher {
    /// 创建新的页面抓取器
    ///
    /// # 参数
    ///
    /// * `settings` - 扫描配置（User-Agent 与私有地址开关）
    pub fn new(settings: &ScanSettings) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .redirect(Policy::none())
            .cookie_store(true)
            .build()?;

        Ok(Self {
            client,
            allow_private: settings.allow_private_targets,
            max_redirects: 10,
        })
    }

    /// 发送请求并逐跳跟随重定向，每一跳都重新校验目标
    async fn send_following(
        &self,
        method: Method,
        url: &Url,
        timeout: Duration,
    ) -> Result<Followed, FetchError> {
        let mut current = url.clone();
        let mut chain = vec![current.to_string()];

        loop {
            validators::validate_target(&current, self.allow_private).await?;

            let response = self
                .client
                .request(method.clone(), current.clone())
                .timeout(timeout)
                .send()
                .await?;

            if response.status().is_redirection() {
                let location = response
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                if let Some(location) = location {
                    if chain.len() > self.max_redirects {
                        return Err(FetchError::TooManyRedirects(self.max_redirects));
                    }
                    let next = url_utils::resolve_url(&current, &location)
                        .map_err(|_| FetchError::InvalidUrl(location.clone()))?;
                    debug!("Redirect {} -> {}", current, next);
                    chain.push(next.to_string());
                    current = next;
                    continue;
                }
            }

            return Ok(Followed {
                final_url: current,
                chain,
                response,
            });
        }
    }

    /// 抓取HTML文档并记录重定向链
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `timeout` - 单跳请求超时
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchedPage)` - 最终响应（状态码可能 ≥400）
    /// * `Err(FetchError)` - 传输失败、跳转过多或目标被拒绝
    pub async fn fetch_document(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> Result<FetchedPage, FetchError> {
        let start = Instant::now();
        let followed = self.send_following(Method::GET, url, timeout).await?;
        let status = followed.response.status().as_u16();
        let headers = collect_headers(followed.response.headers());
        let body = followed.response.text().await?;

        Ok(FetchedPage {
            requested_url: url.clone(),
            final_url: followed.final_url,
            status,
            headers,
            body,
            redirect_chain: followed.chain,
            response_time_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// 轻量探测链接状态
    ///
    /// 先发送 HEAD，服务器返回 405 时回退为 GET
    pub async fn probe(&self, url: &str, timeout: Duration) -> Result<u16, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        let head = self.send_following(Method::HEAD, &parsed, timeout).await?;
        if head.response.status() != StatusCode::METHOD_NOT_ALLOWED {
            return Ok(head.response.status().as_u16());
        }
        let get = self.send_following(Method::GET, &parsed, timeout).await?;
        Ok(get.response.status().as_u16())
    }

    /// GET 文本资源
    ///
    /// 用于 robots.txt、sitemap 等小文件
    pub async fn get_text(&self, url: &str, timeout: Duration) -> Result<(u16, String), FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;

        let followed = self.send_following(Method::GET, &parsed, timeout).await?;
        let status = followed.response.status().as_u16();
        let body = followed.response.text().await?;
        Ok((status, body))
    }

    /// HTTPS 降级检查
    ///
    /// 请求 http:// 孪生地址，判断其是否重定向回 HTTPS
    pub async fn downgrade_check(&self, https_url: &Url, timeout: Duration) -> Option<DowngradeCheck> {
        let twin = url_utils::http_twin(https_url)?;
        let http_url = twin.to_string();

        let result = self.client.get(twin.clone()).timeout(timeout).send().await;
        let check = match result {
            Ok(response) => {
                let redirects_to_https = response.status().is_redirection()
                    && response
                        .headers()
                        .get(LOCATION)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|loc| url_utils::resolve_url(&twin, loc).ok())
                        .map(|next| next.scheme() == "https")
                        .unwrap_or(false);
                DowngradeCheck {
                    http_url,
                    redirects_to_https,
                    error: None,
                }
            }
            Err(e) => DowngradeCheck {
                http_url,
                redirects_to_https: false,
                error: Some(e.to_string()),
            },
        };
        Some(check)
    }
}

fn collect_headers(map: &reqwest::header::HeaderMap) -> HashMap<String, String> {
    let mut headers: HashMap<String, String> = HashMap::new();
    for (name, value) in map {
        if let Ok(value) = value.to_str() {
            headers
                .entry(name.as_str().to_string())
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(value);
                })
                .or_insert_with(|| value.to_string());
        }
    }
    headers
}
