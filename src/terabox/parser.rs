//! 分享链接校验与分享页标识提取

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use url::Url;

use super::types::{IdLookup, ShareIds};
use crate::error::ResolveError;

/// 接受的分享域名（按主机名完全匹配）
pub const SUPPORTED_DOMAINS: &[&str] = &[
    "terabox.com",
    "1024terabox.com",
    "teraboxapp.com",
    "terafileshare.com",
    "teraboxlink.com",
    "terasharelink.com",
    "www.1024tera.com",
    "www.terabox.com",
    "terabox.download",
];

const GLOBAL_DATA_MARKER: &str = "window.globalData =";
const GLOBAL_DATA_END: &str = ";</script>";

/// 校验分享链接：非空，且主机名在白名单内
pub fn validate_share_url(share_url: Option<&str>) -> Result<Url, ResolveError> {
    let raw = share_url
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(ResolveError::MissingUrl)?;

    let parsed =
        Url::parse(raw).map_err(|_| ResolveError::UnsupportedDomain { host: None })?;

    match parsed.host_str() {
        Some(host) if SUPPORTED_DOMAINS.contains(&host) => Ok(parsed),
        host => Err(ResolveError::UnsupportedDomain {
            host: host.map(str::to_string),
        }),
    }
}

/// 从分享页提取 uk 和 shareid
///
/// 先解析 `window.globalData` 里的 JSON，失败再用正则在全文里找数字。
pub fn extract_share_ids(html: &str) -> IdLookup {
    if let Some(ids) = ids_from_global_data(html) {
        return IdLookup::Found(ids);
    }
    match ids_from_patterns(html) {
        Some(ids) => IdLookup::Found(ids),
        None => IdLookup::NotFound,
    }
}

fn ids_from_global_data(html: &str) -> Option<ShareIds> {
    let (_, tail) = html.rsplit_once(GLOBAL_DATA_MARKER)?;
    let json_str = match tail.find(GLOBAL_DATA_END) {
        Some(end) => &tail[..end],
        None => tail,
    };

    let data: Value = serde_json::from_str(json_str.trim()).ok()?;
    let share = data.get("share")?;
    let uk = value_to_text(share.get("uk")?)?;
    let shareid = value_to_text(share.get("shareid")?)?;

    Some(ShareIds { uk, shareid })
}

/// 数字或字符串都转成文本，空值视为缺失
fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn ids_from_patterns(html: &str) -> Option<ShareIds> {
    static UK_RE: OnceLock<Regex> = OnceLock::new();
    static SHAREID_RE: OnceLock<Regex> = OnceLock::new();

    let uk_re = UK_RE.get_or_init(|| Regex::new(r#""uk":\s*(\d+)"#).expect("valid uk regex"));
    let shareid_re = SHAREID_RE
        .get_or_init(|| Regex::new(r#""shareid":\s*(\d+)"#).expect("valid shareid regex"));

    let uk = uk_re.captures(html)?.get(1)?.as_str().to_string();
    let shareid = shareid_re.captures(html)?.get(1)?.as_str().to_string();

    Some(ShareIds { uk, shareid })
}
