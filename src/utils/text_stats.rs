// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node};
use std::collections::HashMap;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex is valid")
});

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:\+|\b)\d{1,3}?[\s.-]?\(?\d{2,4}\)?[\s.-]?\d{3,4}[\s.-]?\d{3,4}\b")
        .expect("phone regex is valid")
});

/// 关键词堆砌阈值：最高频词占比
const STUFFING_RATIO: f64 = 0.05;

const HIDDEN_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

const STOPWORDS: &[&str] = &[
    "this", "that", "with", "from", "your", "have", "will", "what", "when", "they", "their",
    "there", "which", "about", "would", "these", "other", "into", "more", "some", "than",
    "then", "them", "were", "been", "also", "only", "just", "like", "here", "over", "such",
    "each", "very", "most", "much", "make", "many", "does", "well", "where", "while",
];

/// 提取文档中用户可见的文本
///
/// 跳过 script/style/noscript/template 中的文本节点
pub fn visible_text(document: &Html) -> String {
    let mut out = String::new();
    for node in document.tree.root().descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| {
                matches!(ancestor.value(), Node::Element(el) if HIDDEN_ELEMENTS.contains(&el.name()))
            });
            if !hidden {
                out.push_str(text);
                out.push(' ');
            }
        }
    }
    out
}

/// 统计词数（至少包含一个字母或数字的空白分隔片段）
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .count()
}

/// 长度不少于 4 个字母的小写词元
fn long_tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphabetic())
        .filter(|t| t.chars().count() >= 4)
        .map(|t| t.to_lowercase())
}

/// 判断文本是否存在关键词堆砌
///
/// 最高频单词在 4 字母以上词元中的占比超过 5% 即视为堆砌
pub fn is_keyword_stuffed(text: &str) -> bool {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut total = 0usize;
    for token in long_tokens(text) {
        *counts.entry(token).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return false;
    }
    let top = counts.values().copied().max().unwrap_or(0);
    top as f64 / total as f64 > STUFFING_RATIO
}

/// 按出现次数排序的高频词（排除常见停用词）
pub fn top_terms(text: &str, limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in long_tokens(text) {
        if !STOPWORDS.contains(&token.as_str()) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    let mut terms: Vec<(String, usize)> = counts.into_iter().collect();
    terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    terms.truncate(limit);
    terms
}

pub fn contains_email(text: &str) -> bool {
    EMAIL_RE.is_match(text)
}

pub fn contains_phone(text: &str) -> bool {
    PHONE_RE.is_match(text)
}

/// 按字符截断（不会切断多字节字符）
pub fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
