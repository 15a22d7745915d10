// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::ScanSettings;
use crate::domain::models::result_bundle::{BrokenLinks, ContentAnalysis};
use crate::domain::services::homepage_analyzer;
use crate::engines::fetcher::{FetchError, FetchedPage, PageFetcher};
use crate::utils::{text_stats, url_utils};
use futures::stream::{self, StreamExt};
use metrics::counter;
use scraper::Html;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// 同一批次内并发抓取的上限
const FETCH_CONCURRENCY: usize = 10;

/// 免于薄内容判定的工具类路径
const UTILITY_PATHS: &[&str] = &["/contact", "/about", "/tag/", "/category/", "/author/", "/search"];

/// 爬取参数
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub max_pages: usize,
    pub batch_size: usize,
    pub thin_content_words: usize,
    pub link_sample: usize,
    pub page_timeout: Duration,
    pub probe_timeout: Duration,
}

impl From<&ScanSettings> for CrawlConfig {
    fn from(settings: &ScanSettings) -> Self {
        Self {
            max_pages: settings.max_pages,
            batch_size: settings.batch_size.max(1),
            thin_content_words: settings.thin_content_words,
            link_sample: settings.link_sample,
            page_timeout: settings.page_timeout(),
            probe_timeout: settings.probe_timeout(),
        }
    }
}

/// 爬取边界
///
/// 待抓取队列加访问集合；入队即视为已访问，因此同一URL最多抓取一次
#[derive(Debug)]
pub struct CrawlFrontier {
    queue: VecDeque<Url>,
    visited: HashSet<String>,
}

impl CrawlFrontier {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
        }
    }

    /// 标记为已访问但不入队（首页、重定向目标）
    pub fn mark_visited(&mut self, url: &Url) {
        self.visited.insert(url_utils::strip_fragment(url.clone()).to_string());
    }

    /// 入队新发现的URL
    ///
    /// # 返回值
    ///
    /// 首次出现时返回 `true`
    pub fn push(&mut self, url: Url) -> bool {
        let url = url_utils::strip_fragment(url);
        if self.visited.insert(url.to_string()) {
            self.queue.push_back(url);
            true
        } else {
            false
        }
    }

    /// 按先进先出取出至多 `limit` 个URL
    pub fn next_batch(&mut self, limit: usize) -> Vec<Url> {
        let take = limit.min(self.queue.len());
        self.queue.drain(..take).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }
}

impl Default for CrawlFrontier {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个页面的内容信号
#[derive(Debug, Clone, Default)]
pub struct PageRecord {
    pub url: String,
    pub status: u16,
    pub word_count: usize,
    pub thin: bool,
    pub keyword_stuffed: bool,
    pub title_missing: bool,
    pub description_missing: bool,
    pub mixed_content: bool,
    pub email_found: bool,
    pub phone_found: bool,
}

/// 路径是否属于免于薄内容判定的工具页
pub fn is_utility_path(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    UTILITY_PATHS.iter().any(|p| path.starts_with(p))
}

/// 解析页面并提取内容信号与链接
///
/// 同步执行，文档不会跨越 `.await`
pub fn record_page(page: &FetchedPage, thin_words: usize) -> (PageRecord, Vec<Url>) {
    let document = Html::parse_document(&page.body);
    let text = text_stats::visible_text(&document);
    let word_count = text_stats::word_count(&text);

    let record = PageRecord {
        url: page.final_url.to_string(),
        status: page.status,
        word_count,
        thin: word_count < thin_words && !is_utility_path(&page.final_url),
        keyword_stuffed: text_stats::is_keyword_stuffed(&text),
        title_missing: homepage_analyzer::page_title(&document).is_none(),
        description_missing: homepage_analyzer::meta_description(&document).is_none(),
        mixed_content: !homepage_analyzer::mixed_content(&document, &page.final_url).is_empty(),
        email_found: text_stats::contains_email(&text),
        phone_found: text_stats::contains_phone(&text),
    };
    let links = homepage_analyzer::extract_anchors(&document, &page.final_url)
        .into_iter()
        .map(|a| a.url)
        .collect();

    (record, links)
}

fn is_html(page: &FetchedPage) -> bool {
    page.header("content-type")
        .map(|ct| ct.to_ascii_lowercase().contains("html"))
        .unwrap_or(true)
}

/// 爬取结果
#[derive(Debug, Clone, Default)]
pub struct CrawlOutcome {
    pub content: ContentAnalysis,
    pub broken_links: BrokenLinks,
    /// 实际发出请求的URL（按完成顺序）
    pub fetched: Vec<String>,
}

#[derive(Default)]
struct Accumulator {
    content: ContentAnalysis,
    crawl_broken: usize,
    broken_urls: Vec<String>,
    fetched: Vec<String>,
    /// 所有出现过的链接（内部与外部），按首次出现顺序
    seen_links: Vec<String>,
    seen_set: HashSet<String>,
}

impl Accumulator {
    fn add(&mut self, record: PageRecord) {
        let content = &mut self.content;
        content.pages_scanned += 1;
        content.total_words += record.word_count;
        if record.thin {
            content.thin_content_pages.push(record.url.clone());
        }
        if record.keyword_stuffed {
            content.keyword_stuffed_pages.push(record.url.clone());
        }
        if record.title_missing {
            content.pages_missing_title.push(record.url.clone());
        }
        if record.description_missing {
            content.pages_missing_description.push(record.url.clone());
        }
        if record.mixed_content {
            content.mixed_content_pages.push(record.url.clone());
        }
        content.email_found |= record.email_found;
        content.phone_found |= record.phone_found;
        content.has_thin_content = !content.thin_content_pages.is_empty();
        content.keyword_stuffed = !content.keyword_stuffed_pages.is_empty();
    }

    fn broken(&mut self, url: String) {
        self.crawl_broken += 1;
        self.broken_urls.push(url);
    }

    fn see_links(&mut self, links: &[Url]) {
        for link in links {
            let link = link.to_string();
            if self.seen_set.insert(link.clone()) {
                self.seen_links.push(link);
            }
        }
    }
}

/// 爬取编排服务
///
/// 从首页出发做广度优先、有上限的同源遍历；批次之间顺序执行，批次内部并发抓取
pub struct CrawlService {
    fetcher: Arc<PageFetcher>,
    config: CrawlConfig,
}

impl CrawlService {
    pub fn new(fetcher: Arc<PageFetcher>, config: CrawlConfig) -> Self {
        Self { fetcher, config }
    }

    /// 执行爬取
    ///
    /// # 参数
    ///
    /// * `homepage` - 已抓取的首页（计为第一个已扫描页面）
    ///
    /// # 返回值
    ///
    /// 内容分析汇总与断链普查；单个页面失败只计入断链，不会中断爬取
    pub async fn crawl(&self, homepage: &FetchedPage) -> CrawlOutcome {
        let origin = homepage.final_url.clone();
        let mut frontier = CrawlFrontier::new();
        let mut acc = Accumulator::default();

        frontier.mark_visited(&homepage.requested_url);
        frontier.mark_visited(&origin);

        let (record, links) = record_page(homepage, self.config.thin_content_words);
        acc.add(record);
        acc.fetched.push(homepage.final_url.to_string());
        acc.see_links(&links);
        self.extend(&mut frontier, &origin, links);

        let mut scanned = 1usize;
        while scanned < self.config.max_pages && !frontier.is_empty() {
            let take = self.config.batch_size.min(self.config.max_pages - scanned);
            let batch = frontier.next_batch(take);
            debug!(
                "Crawl batch of {} ({} scanned, {} queued)",
                batch.len(),
                scanned,
                frontier.queued()
            );

            let timeout = self.config.page_timeout;
            let fetcher = self.fetcher.clone();
            let results: Vec<(Url, Result<FetchedPage, FetchError>)> = stream::iter(batch)
                .map(|url| {
                    let fetcher = fetcher.clone();
                    async move {
                        let result = fetcher.fetch_document(&url, timeout).await;
                        (url, result)
                    }
                })
                .buffer_unordered(FETCH_CONCURRENCY)
                .collect()
                .await;

            for (url, result) in results {
                scanned += 1;
                counter!("crawl_pages_fetched_total").increment(1);
                acc.fetched.push(url.to_string());

                match result {
                    Ok(page) if page.status < 400 => {
                        frontier.mark_visited(&page.final_url);
                        if !url_utils::same_origin(&page.final_url, &origin) || !is_html(&page) {
                            continue;
                        }
                        let (record, links) = record_page(&page, self.config.thin_content_words);
                        acc.add(record);
                        acc.see_links(&links);
                        self.extend(&mut frontier, &origin, links);
                    }
                    Ok(page) => {
                        debug!("Crawled page {} returned {}", url, page.status);
                        acc.broken(url.to_string());
                    }
                    Err(e) => {
                        warn!("Failed to crawl {}: {}", url, e);
                        acc.broken(url.to_string());
                    }
                }
            }
        }

        let broken_links = self.census(&acc.seen_links, acc.crawl_broken, &acc.broken_urls).await;
        info!(
            "Crawl finished: {} pages scanned, {} broken links",
            acc.content.pages_scanned,
            broken_links.total()
        );

        CrawlOutcome {
            content: acc.content,
            broken_links,
            fetched: acc.fetched,
        }
    }

    fn extend(&self, frontier: &mut CrawlFrontier, origin: &Url, links: Vec<Url>) {
        for link in links {
            if url_utils::same_origin(&link, origin) {
                frontier.push(link);
            }
        }
    }

    /// 断链普查
    ///
    /// 对出现过的链接抽样（至多 `link_sample` 个）做 HEAD 探测，405 时回退 GET
    async fn census(
        &self,
        links: &[String],
        crawl_broken: usize,
        crawl_urls: &[String],
    ) -> BrokenLinks {
        let sample: Vec<String> = links.iter().take(self.config.link_sample).cloned().collect();
        let timeout = self.config.probe_timeout;
        let fetcher = self.fetcher.clone();

        let probes: Vec<(String, Result<u16, FetchError>)> = stream::iter(sample)
            .map(|link| {
                let fetcher = fetcher.clone();
                async move {
                    let result = fetcher.probe(&link, timeout).await;
                    (link, result)
                }
            })
            .buffer_unordered(FETCH_CONCURRENCY)
            .collect()
            .await;

        let mut checked = 0;
        let mut broken_urls: Vec<String> = crawl_urls.to_vec();
        let mut broken = 0;
        for (link, result) in probes {
            match result {
                Err(FetchError::Blocked(_)) => continue,
                Ok(status) if status < 400 => checked += 1,
                Ok(_) | Err(_) => {
                    checked += 1;
                    broken += 1;
                    if !broken_urls.contains(&link) {
                        broken_urls.push(link);
                    }
                }
            }
        }

        BrokenLinks {
            checked,
            broken,
            crawl_broken,
            broken_urls,
        }
    }
}

#[cfg(test)]
#[path = "crawl_service_test.rs"]
mod tests;
