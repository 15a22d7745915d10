// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

/// 应用程序配置设置
///
/// 进程启动时构建一次，以 `Arc<Settings>` 形式显式传递给各组件
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 数据存储（REST）配置
    pub datastore: DatastoreSettings,
    /// 扫描流程配置
    pub scan: ScanSettings,
    /// 外部数据提供方配置
    pub providers: ProviderSettings,
    /// 生成式内容（LLM）配置
    pub llm: LlmSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 数据存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatastoreSettings {
    /// REST 接口基础 URL
    pub url: String,
    /// 服务端密钥
    pub service_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

/// 扫描流程配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ScanSettings {
    /// 单次扫描最多抓取的页面数
    pub max_pages: usize,
    /// 每批并发抓取的页面数
    pub batch_size: usize,
    /// 低于该词数视为内容单薄
    pub thin_content_words: usize,
    /// 信任页面的最少词数
    pub trust_min_words: usize,
    /// 断链普查的链接抽样上限
    pub link_sample: usize,
    /// 轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 每次轮询拉取的待处理任务数
    pub pending_batch: usize,
    /// 首页抓取超时（秒）
    pub homepage_timeout_secs: u64,
    /// 普通页面抓取超时（秒）
    pub page_timeout_secs: u64,
    /// 轻量探测超时（秒）
    pub probe_timeout_secs: u64,
    /// 是否允许扫描私有地址（仅用于测试）
    pub allow_private_targets: bool,
    /// 抓取使用的 User-Agent
    pub user_agent: String,
    /// TLS 握手端口
    pub tls_port: u16,
}

/// 外部数据提供方配置设置
///
/// 所有凭据均为可选；缺失时对应的适配器回退到免费来源或返回不可用
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderSettings {
    pub pagespeed_api_key: Option<String>,
    pub pagespeed_url: String,
    /// 两次设备策略调用之间的间隔（毫秒）
    pub pagespeed_delay_ms: u64,
    pub safe_browsing_api_key: Option<String>,
    pub safe_browsing_url: String,
    pub whois_api_key: Option<String>,
    pub whois_url: String,
    pub rdap_url: String,
    pub traffic_api_key: Option<String>,
    pub traffic_url: String,
    pub keyword_api_key: Option<String>,
    pub keyword_url: String,
    pub social_api_key: Option<String>,
    pub social_url: String,
    pub search_console_url: String,
}

/// LLM 配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSettings {
    /// API 密钥
    pub api_key: Option<String>,
    /// 模型名称
    pub model: String,
    /// OpenAI 兼容接口基础 URL
    pub api_base_url: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

/// 指标导出配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub listen: String,
}

impl ScanSettings {
    pub fn homepage_timeout(&self) -> Duration {
        Duration::from_secs(self.homepage_timeout_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加默认值、`config/default`、`config/{APP_ENVIRONMENT}` 与
    /// `ADSCAN__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder_with_defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("ADSCAN").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅包含内置默认值的构建器
    ///
    /// 测试与嵌入场景可在此基础上 `set_override` 后直接反序列化
    pub fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("datastore.timeout_secs", 10)?
            // Scan pipeline
            .set_default("scan.max_pages", 50)?
            .set_default("scan.batch_size", 10)?
            .set_default("scan.thin_content_words", 250)?
            .set_default("scan.trust_min_words", 50)?
            .set_default("scan.link_sample", 50)?
            .set_default("scan.poll_interval_secs", 5)?
            .set_default("scan.pending_batch", 5)?
            .set_default("scan.homepage_timeout_secs", 15)?
            .set_default("scan.page_timeout_secs", 10)?
            .set_default("scan.probe_timeout_secs", 5)?
            .set_default("scan.allow_private_targets", false)?
            .set_default(
                "scan.user_agent",
                "Mozilla/5.0 (compatible; adscan/0.1; +https://adscan.dev/bot)",
            )?
            .set_default("scan.tls_port", 443)?
            // Providers
            .set_default(
                "providers.pagespeed_url",
                "https://www.googleapis.com/pagespeedonline/v5/runPagespeed",
            )?
            .set_default("providers.pagespeed_delay_ms", 1500)?
            .set_default(
                "providers.safe_browsing_url",
                "https://safebrowsing.googleapis.com/v4/threatMatches:find",
            )?
            .set_default(
                "providers.whois_url",
                "https://www.whoisxmlapi.com/whoisserver/WhoisService",
            )?
            .set_default("providers.rdap_url", "https://rdap.org")?
            .set_default(
                "providers.traffic_url",
                "https://openpagerank.com/api/v1.0/getPageRank",
            )?
            .set_default("providers.keyword_url", "https://api.keywordseverywhere.com/v1/get_domain_keywords")?
            .set_default("providers.social_url", "https://api.brandfetch.io/v2/brands")?
            .set_default("providers.search_console_url", "https://www.googleapis.com")?
            // LLM
            .set_default("llm.model", "gemini-1.5-flash")?
            .set_default(
                "llm.api_base_url",
                "https://generativelanguage.googleapis.com/v1beta/openai",
            )?
            .set_default("llm.timeout_secs", 60)?
            // Metrics
            .set_default("metrics.enabled", true)?
            .set_default("metrics.listen", "0.0.0.0:9000")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
