// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::result_bundle::RobotsTxt;
use robotstxt::DefaultMatcher;

/// AdSense 内容抓取器的 User-Agent
pub const ADSENSE_CRAWLER: &str = "Mediapartners-Google";

/// 检查 URL 是否允许指定 User-Agent 访问
pub fn is_allowed(content: &str, user_agent: &str, url: &str) -> bool {
    let mut matcher = DefaultMatcher::default();
    matcher.one_agent_allowed_by_robots(content, user_agent, url)
}

/// 提取 `Sitemap:` 指令，保持出现顺序
pub fn sitemap_directives(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter_map(|line| {
            let (name, value) = line.split_once(':')?;
            if !name.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            let value = value.trim();
            (!value.is_empty()).then(|| value.to_string())
        })
        .collect()
}

/// 通配 User-Agent 组是否包含 `Disallow: /`
pub fn disallows_all(content: &str) -> bool {
    // 逻辑：
    // 1. 连续的 User-agent 行组成一个组
    // 2. 组内出现规则后，下一条 User-agent 开启新组
    let mut wildcard_group = false;
    let mut in_rules = false;

    for line in content.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();

        if name == "user-agent" {
            if in_rules {
                wildcard_group = false;
                in_rules = false;
            }
            wildcard_group |= value == "*";
        } else {
            in_rules = true;
            if wildcard_group && name == "disallow" && value == "/" {
                return true;
            }
        }
    }
    false
}

/// 分析 robots.txt
///
/// # 参数
///
/// * `url` - robots.txt 地址
/// * `content` - 响应正文；不存在时为 `None`
///
/// # 返回值
///
/// 缺失的 robots.txt 视为全部允许
pub fn analyze(url: &str, content: Option<&str>) -> RobotsTxt {
    let Some(content) = content else {
        return RobotsTxt {
            exists: false,
            url: url.to_string(),
            has_disallow_all: false,
            adsense_crawler_allowed: true,
            sitemaps: Vec::new(),
        };
    };

    let site_root = url.trim_end_matches("robots.txt");
    RobotsTxt {
        exists: true,
        url: url.to_string(),
        has_disallow_all: disallows_all(content),
        adsense_crawler_allowed: is_allowed(content, ADSENSE_CRAWLER, site_root),
        sitemaps: sitemap_directives(content),
    }
}
