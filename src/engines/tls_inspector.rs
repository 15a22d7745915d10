// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::reports::{CheckStatus, SslCheck};
use crate::engines::providers::ProviderError;
use chrono::{TimeZone, Utc};
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ProtocolVersion, RootCertStore};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, warn};
use url::Url;

/// 证书信息
struct CertificateFacts {
    not_after: i64,
    issuer: Option<String>,
}

/// TLS 证书检查器
///
/// 直接与站点完成 TLS 握手（而非发起 HTTP 请求），读取证书过期时间、签发者与协商的协议版本。
/// 无法在超时内完成握手视为失败，而不是未知。
pub struct TlsInspector {
    connector: TlsConnector,
    default_port: u16,
    timeout: Duration,
}

impl TlsInspector {
    /// 创建新的 TLS 检查器
    ///
    /// 使用系统根证书；加载失败的个别证书会被忽略
    pub fn new(default_port: u16, timeout: Duration) -> Result<Self, rustls::Error> {
        let mut roots = RootCertStore::empty();
        let native = rustls_native_certs::load_native_certs();
        for error in &native.errors {
            debug!("Skipping native certificate: {}", error);
        }
        let (added, ignored) = roots.add_parsable_certificates(native.certs);
        debug!("Loaded {} native root certificates ({} ignored)", added, ignored);

        let config = ClientConfig::builder_with_provider(Arc::new(
            rustls::crypto::ring::default_provider(),
        ))
        .with_safe_default_protocol_versions()?
        .with_root_certificates(roots)
        .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            default_port,
            timeout,
        })
    }

    /// 检查站点证书
    ///
    /// # 参数
    ///
    /// * `final_url` - 重定向后的最终URL
    ///
    /// # 返回值
    ///
    /// 始终返回检查结果；非 HTTPS 地址、超时与握手错误均记为 `Failed`
    pub async fn inspect(&self, final_url: &Url) -> SslCheck {
        let reached = final_url.to_string();
        if final_url.scheme() != "https" {
            return SslCheck::failed(reached, "site is not served over HTTPS");
        }
        let Some(host) = final_url.host_str().map(str::to_string) else {
            return SslCheck::failed(reached, "missing host");
        };
        let port = final_url.port().unwrap_or(self.default_port);

        match tokio::time::timeout(self.timeout, self.handshake(&host, port)).await {
            Ok(Ok(mut check)) => {
                check.url_reached = reached;
                check
            }
            Ok(Err(error)) => {
                warn!("TLS handshake with {}:{} failed: {}", host, port, error);
                SslCheck::failed(reached, error.to_string())
            }
            Err(_) => {
                warn!("TLS handshake with {}:{} timed out", host, port);
                SslCheck::failed(reached, format!("handshake timed out after {:?}", self.timeout))
            }
        }
    }

    async fn handshake(&self, host: &str, port: u16) -> Result<SslCheck, ProviderError> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| ProviderError::Handshake(e.to_string()))?;
        let tcp = TcpStream::connect((host, port))
            .await
            .map_err(|e| ProviderError::Handshake(format!("connect failed: {}", e)))?;
        let tls = self
            .connector
            .connect(server_name, tcp)
            .await
            .map_err(|e| ProviderError::Handshake(format!("handshake failed: {}", e)))?;

        let (_, connection) = tls.get_ref();
        let protocol = connection.protocol_version().map(protocol_label);
        let facts = connection
            .peer_certificates()
            .and_then(|certs| certs.first())
            .and_then(|leaf| parse_certificate(leaf.as_ref()));

        let Some(facts) = facts else {
            return Err(ProviderError::Handshake(
                "peer presented no parsable certificate".to_string(),
            ));
        };

        let now = Utc::now().timestamp();
        let days_remaining = (facts.not_after - now).div_euclid(86_400);
        let valid = facts.not_after > now;

        Ok(SslCheck {
            status: if valid {
                CheckStatus::Passed
            } else {
                CheckStatus::Failed
            },
            valid,
            protocol,
            issuer: facts.issuer,
            days_remaining: Some(days_remaining),
            expires_at: Utc
                .timestamp_opt(facts.not_after, 0)
                .single()
                .map(|t| t.to_rfc3339()),
            url_reached: String::new(),
            error: None,
        })
    }
}

fn parse_certificate(der: &[u8]) -> Option<CertificateFacts> {
    let (_, cert) = x509_parser::parse_x509_certificate(der).ok()?;
    let issuer = cert
        .issuer()
        .iter_organization()
        .next()
        .and_then(|attr| attr.as_str().ok())
        .map(str::to_string);
    Some(CertificateFacts {
        not_after: cert.validity().not_after.timestamp(),
        issuer,
    })
}

fn protocol_label(version: ProtocolVersion) -> String {
    match version {
        ProtocolVersion::TLSv1_3 => "TLSv1.3".to_string(),
        ProtocolVersion::TLSv1_2 => "TLSv1.2".to_string(),
        other => format!("{:?}", other),
    }
}
