// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::LlmSettings;
use crate::domain::models::reports::PolicyReport;
use crate::domain::models::result_bundle::TrustCategory;
use crate::domain::services::generative_service::{GenerativeContent, Suggestion};
use crate::utils::text_stats;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// 发送给模型的正文上限（字符）
const MAX_PROMPT_TEXT: usize = 4000;

/// LLM服务 - 处理与LLM提供商的交互
///
/// # 功能
///
/// 通过 OpenAI 兼容的 chat/completions 接口生成合规页面草稿、内容与变现建议、
/// 申诉信，并做内容政策分析
///
/// # 配置
///
/// 由 `llm` 配置段提供：
/// - `api_key` - API 密钥（缺失时 `is_configured` 为 false，所有调用返回错误）
/// - `model` - 模型名称
/// - `api_base_url` - 接口基础 URL
pub struct LLMService {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base_url: String,
}

impl LLMService {
    pub fn new(settings: &LlmSettings) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .unwrap_or_default();
        Self {
            client,
            api_key: settings.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: settings.model.clone(),
            api_base_url: settings.api_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// 调用 chat/completions 并返回首条消息内容
    async fn complete(&self, system: &str, prompt: &str, temperature: f32) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("LLM API key not configured"))?;

        let request_body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": prompt }
            ],
            "temperature": temperature
        });

        let url = format!("{}/chat/completions", self.api_base_url);
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request_body)
            .send()
            .await
            .context("Failed to send request to LLM API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "LLM API returned error: {} - {}",
                status,
                error_text
            ));
        }

        let body: Value = response
            .json()
            .await
            .context("Failed to parse LLM API response")?;
        if let Some(usage) = body.get("usage") {
            debug!("LLM usage: {}", usage);
        }

        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("Invalid response format from LLM API"))
    }

    async fn complete_json(&self, prompt: &str) -> Result<Value> {
        let content = self
            .complete(
                "You are an ad-network compliance assistant. You output only valid JSON.",
                prompt,
                0.0,
            )
            .await?;
        serde_json::from_str::<Value>(strip_fences(&content))
            .context("Failed to parse JSON content from LLM")
    }
}

/// 去掉模型常加的 Markdown 代码块标记
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```html"))
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.trim_end_matches("```").trim()
}

/// 解析建议列表，兼容直接数组或包裹在对象中的数组
fn parse_suggestions(value: &Value) -> Vec<Suggestion> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .values()
            .find_map(|v| v.as_array())
            .map(Vec::as_slice)
            .unwrap_or(&[]),
        _ => &[],
    };
    items
        .iter()
        .filter_map(|item| {
            Some(Suggestion {
                title: item["title"].as_str()?.to_string(),
                description: item["description"].as_str().unwrap_or("").to_string(),
                priority: item["priority"].as_str().unwrap_or("medium").to_lowercase(),
            })
        })
        .collect()
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// 解析政策分析结果，风险分截断到 0-100
fn parse_policy(value: &Value) -> Result<PolicyReport> {
    let risk = value["risk_score"]
        .as_f64()
        .ok_or_else(|| anyhow::anyhow!("policy analysis missing risk_score"))?;
    let flags = string_list(&value["flags"]);
    Ok(PolicyReport {
        issues_found: value["issues_found"].as_bool().unwrap_or(!flags.is_empty()),
        risk_score: risk.clamp(0.0, 100.0).round() as u8,
        policy_violations: string_list(&value["policy_violations"]),
        recommendations: string_list(&value["recommendations"]),
        flags,
    })
}

#[async_trait]
impl GenerativeContent for LLMService {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn draft_page(&self, domain: &str, category: TrustCategory) -> Result<String> {
        let prompt = format!(
            "Write a complete, publish-ready {} page for the website {}. \
             It must satisfy Google AdSense publisher requirements. \
             Return an HTML fragment (headings and paragraphs only, no <html> or <body>).",
            category, domain
        );
        let content = self
            .complete("You write clear, compliant website legal and trust pages.", &prompt, 0.3)
            .await?;
        Ok(strip_fences(&content).to_string())
    }

    async fn content_improvements(&self, domain: &str, snapshot: &Value) -> Result<Vec<Suggestion>> {
        let prompt = format!(
            "Given this scan snapshot of {}: {}. \
             Return a JSON array of at most 8 content improvements ranked by impact, \
             each {{\"title\", \"description\", \"priority\": \"high\"|\"medium\"|\"low\"}}.",
            domain, snapshot
        );
        Ok(parse_suggestions(&self.complete_json(&prompt).await?))
    }

    async fn monetization_suggestions(&self, domain: &str, snapshot: &Value) -> Result<Vec<Suggestion>> {
        let prompt = format!(
            "Given this scan snapshot of {}: {}. \
             Return a JSON array of monetization methods suited to the site, ranked by fit, \
             each {{\"title\", \"description\", \"priority\": \"high\"|\"medium\"|\"low\"}}.",
            domain, snapshot
        );
        Ok(parse_suggestions(&self.complete_json(&prompt).await?))
    }

    async fn appeal_letter(&self, domain: &str, violations: &[String]) -> Result<String> {
        let prompt = format!(
            "Draft a concise, professional AdSense reconsideration request for {}. \
             The site was rejected for: {}. Describe the corrective actions taken for each issue.",
            domain,
            violations.join("; ")
        );
        let content = self
            .complete("You write polite, factual appeal letters.", &prompt, 0.4)
            .await?;
        Ok(content.trim().to_string())
    }

    async fn policy_analysis(&self, text: &str) -> Result<PolicyReport> {
        let prompt = format!(
            "Analyze this website text for Google publisher policy risks \
             (adult, gambling, weapons, drugs, piracy, hate, violence, misleading claims). \
             Return JSON {{\"issues_found\": bool, \"risk_score\": 0-100, \"flags\": [string], \
             \"recommendations\": [string], \"policy_violations\": [string]}}. Text: {}",
            text_stats::truncate_chars(text, MAX_PROMPT_TEXT)
        );
        parse_policy(&self.complete_json(&prompt).await?)
    }
}
