// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::net::IpAddr;
use thiserror::Error;
use tokio::net::lookup_host;
use url::Url;

/// 验证错误类型
#[derive(Error, Debug)]
pub enum ValidationError {
    /// URL无效
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// 不支持的协议
    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),
    /// DNS 解析失败
    #[error("Failed to resolve host {0}")]
    Unresolvable(String),
    /// 检测到SSRF目标
    #[error("SSRF protection: private address {0} is not allowed")]
    PrivateAddress(String),
}

/// 验证扫描目标是否安全 (防止 SSRF)
///
/// 检查解析后的所有 IP 均不是私有、环回或链路本地地址
///
/// # 参数
///
/// * `url` - 目标URL
/// * `allow_private` - 为 true 时跳过地址检查（仅用于测试环境）
pub async fn validate_target(url: &Url, allow_private: bool) -> Result<(), ValidationError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ValidationError::UnsupportedScheme(url.scheme().to_string()));
    }
    let host = url
        .host_str()
        .ok_or_else(|| ValidationError::InvalidUrl(url.to_string()))?;

    if allow_private {
        return Ok(());
    }

    if host.eq_ignore_ascii_case("localhost") {
        return Err(ValidationError::PrivateAddress(host.to_string()));
    }

    // IP literals skip DNS; lookup_host needs host:port
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return if is_private_ip(ip) {
            Err(ValidationError::PrivateAddress(ip.to_string()))
        } else {
            Ok(())
        };
    }

    let port = url.port_or_known_default().unwrap_or(80);
    let addrs = lookup_host((host, port))
        .await
        .map_err(|_| ValidationError::Unresolvable(host.to_string()))?;

    for addr in addrs {
        if is_private_ip(addr.ip()) {
            return Err(ValidationError::PrivateAddress(addr.ip().to_string()));
        }
    }

    Ok(())
}

/// 判断IP是否属于私有或保留网段
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            ipv4.is_private()
                || ipv4.is_loopback()
                || ipv4.is_link_local()
                || ipv4.is_unspecified()
                || ipv4.is_broadcast()
                // 224.0.0.0/4 (Multicast)
                || (224..=239).contains(&octets[0])
                // 100.64.0.0/10 (CGNAT)
                || (octets[0] == 100 && (64..=127).contains(&octets[1]))
        }
        IpAddr::V6(ipv6) => {
            if let Some(mapped) = ipv6.to_ipv4_mapped() {
                return is_private_ip(IpAddr::V4(mapped));
            }
            let first = ipv6.segments()[0];
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                // Unique Local Address (fc00::/7)
                || (first & 0xfe00) == 0xfc00
                // Link-local (fe80::/10)
                || (first & 0xffc0) == 0xfe80
                // Multicast (ff00::/8)
                || (first & 0xff00) == 0xff00
        }
    }
}
