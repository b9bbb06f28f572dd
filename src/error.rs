//! 请求级错误

use serde_json::Value;
use thiserror::Error;

use crate::terabox::client::TransportError;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("缺少分享链接，用法: ?extract=<terabox_url>")]
    MissingUrl,

    #[error("查询参数无效: {0}")]
    InvalidQuery(String),

    #[error("不支持的域名: {}", host.as_deref().unwrap_or("<无法解析>"))]
    UnsupportedDomain { host: Option<String> },

    #[error("cookie 文件缺失或无效")]
    MissingCredentials,

    #[error("无法从分享页提取 uk/shareid")]
    IdentifiersNotFound,

    #[error("TeraBox 列表接口失败: {reason}")]
    ListingFailed { reason: String, raw: Value },

    #[error("上游请求失败: {0}")]
    Transport(#[from] TransportError),

    #[error("内部错误: {0}")]
    Internal(String),
}

/// 错误分类，对应不同的 HTTP 状态码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Input,
    Configuration,
    Extraction,
    Upstream,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Extraction => "extraction",
            ErrorKind::Upstream => "upstream",
            ErrorKind::Internal => "internal",
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::Input => 400,
            ErrorKind::Configuration => 500,
            ErrorKind::Extraction => 422,
            ErrorKind::Upstream => 502,
            ErrorKind::Internal => 500,
        }
    }
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::MissingUrl
            | ResolveError::InvalidQuery(_)
            | ResolveError::UnsupportedDomain { .. } => ErrorKind::Input,
            ResolveError::MissingCredentials => ErrorKind::Configuration,
            ResolveError::IdentifiersNotFound => ErrorKind::Extraction,
            ResolveError::ListingFailed { .. } | ResolveError::Transport(_) => ErrorKind::Upstream,
            ResolveError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// 列表接口的原始响应，便于排查
    pub fn raw(&self) -> Option<&Value> {
        match self {
            ResolveError::ListingFailed { raw, .. } => Some(raw),
            _ => None,
        }
    }
}
