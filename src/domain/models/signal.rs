// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// 信号来源
///
/// 区分付费提供方、免费回退和直接测量，聚合器据此标注置信度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    /// 付费或带凭据的提供方
    Premium,
    /// 免费接口或本地启发式计算
    Fallback,
    /// 直接对站点进行的测量（如 TLS 握手）
    Direct,
}

/// 信号结果
///
/// 适配器边界上的统一返回类型：要么可用（附带来源），要么不可用（附带原因）
#[derive(Debug, Clone, PartialEq)]
pub enum SignalResult<T> {
    Available {
        payload: T,
        source: SignalSource,
        provider: &'static str,
    },
    Unavailable(String),
}

impl<T> SignalResult<T> {
    pub fn available(payload: T, source: SignalSource, provider: &'static str) -> Self {
        SignalResult::Available {
            payload,
            source,
            provider,
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        SignalResult::Unavailable(reason.into())
    }

    pub fn is_available(&self) -> bool {
        matches!(self, SignalResult::Available { .. })
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            SignalResult::Available { payload, .. } => Some(payload),
            SignalResult::Unavailable(_) => None,
        }
    }

    pub fn source(&self) -> Option<SignalSource> {
        match self {
            SignalResult::Available { source, .. } => Some(*source),
            SignalResult::Unavailable(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> SignalResult<U> {
        match self {
            SignalResult::Available {
                payload,
                source,
                provider,
            } => SignalResult::Available {
                payload: f(payload),
                source,
                provider,
            },
            SignalResult::Unavailable(reason) => SignalResult::Unavailable(reason),
        }
    }
}

/// 可用时将负载字段与 `source`/`provider` 平铺输出；
/// 不可用时输出 `{"available": false, "reason": ...}`
impl<T: Serialize> Serialize for SignalResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            SignalResult::Available {
                payload,
                source,
                provider,
            } => {
                #[derive(Serialize)]
                struct Envelope<'a, T> {
                    #[serde(flatten)]
                    payload: &'a T,
                    available: bool,
                    source: SignalSource,
                    provider: &'a str,
                }
                Envelope {
                    payload,
                    available: true,
                    source: *source,
                    provider,
                }
                .serialize(serializer)
            }
            SignalResult::Unavailable(reason) => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("available", &false)?;
                map.serialize_entry("reason", reason)?;
                map.end()
            }
        }
    }
}
