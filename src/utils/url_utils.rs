// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::{ParseError, Url};

/// 将可能为相对路径的URL转换为绝对路径URL
pub fn resolve_url(base_url: &Url, path: &str) -> Result<Url, ParseError> {
    base_url.join(path)
}

/// 规范化用户提交的站点地址
///
/// 缺少协议时补全为 `https://`
pub fn normalize_site_url(raw: &str) -> Result<Url, ParseError> {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("https://{}", trimmed))
    }
}

/// 两个URL是否同源（协议、主机、端口均相同）
///
/// 主机比较忽略 `www.` 前缀
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.port_or_known_default() == b.port_or_known_default()
        && bare_host(a) == bare_host(b)
}

/// 去掉 `www.` 前缀的主机名
pub fn bare_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| {
        let lower = h.to_ascii_lowercase();
        lower.strip_prefix("www.").map(str::to_string).unwrap_or(lower)
    })
}

/// 去掉片段标识，用于访问集合去重
pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// 站点根地址，如 `https://example.com`
pub fn origin_root(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// HTTPS 站点对应的 http:// 孪生地址
pub fn http_twin(url: &Url) -> Option<Url> {
    if url.scheme() != "https" {
        return None;
    }
    let mut twin = url.clone();
    twin.set_scheme("http").ok()?;
    // Explicit https port would otherwise carry over to the http twin.
    if twin.port().is_some() {
        twin.set_port(None).ok()?;
    }
    Some(twin)
}
