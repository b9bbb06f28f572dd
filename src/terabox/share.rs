//! 分享文件列表
//!
//! 调用 share/list 获取分享内容，子文件夹按深度优先展开成一维列表。

use futures::future::BoxFuture;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, info, warn};

use super::client::{preview, ListQuery, ShareApi};
use super::types::{FileEntry, ShareIds};
use crate::error::ResolveError;

#[derive(Debug, Deserialize)]
struct FileItem {
    // 字段可能是 fs_id 或 fsid，值可能是字符串或数字
    #[serde(rename = "fs_id", alias = "fsid", deserialize_with = "string_or_u64")]
    fs_id: u64,
    #[serde(default)]
    server_filename: String,
    #[serde(default)]
    path: String,
    #[serde(default, deserialize_with = "string_or_u64")]
    size: u64,
    #[serde(default, deserialize_with = "flag")]
    isdir: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrU64 {
    Str(String),
    Num(u64),
}

/// 支持字符串或数字类型的数值字段
fn string_or_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match StringOrU64::deserialize(deserializer)? {
        StringOrU64::Str(s) => s.trim().parse().map_err(Error::custom),
        StringOrU64::Num(n) => Ok(n),
    }
}

/// isdir 可能是 0/1 也可能是 "0"/"1"
fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    string_or_u64(deserializer).map(|n| n != 0)
}

impl From<FileItem> for FileEntry {
    fn from(item: FileItem) -> Self {
        FileEntry {
            fs_id: item.fs_id,
            name: item.server_filename,
            path: item.path,
            size: item.size,
            is_dir: item.isdir,
        }
    }
}

/// share/list 表单，字段和顺序与网页端一致
pub fn list_form(ids: &ShareIds, dir: Option<&str>) -> Vec<(&'static str, String)> {
    let mut form = vec![
        ("shorturl", String::new()),
        ("shareid", ids.shareid.clone()),
        ("uk", ids.uk.clone()),
        ("fid_list", "all".to_string()),
        ("primaryid", ids.shareid.clone()),
        ("is_rename", "0".to_string()),
        ("channel", "android_12".to_string()),
        ("web", "1".to_string()),
    ];
    if let Some(dir) = dir {
        form.push(("dir", dir.to_string()));
    }
    form
}

fn errno_hint(errno: i64) -> &'static str {
    match errno {
        -7 => "分享链接已过期或被删除",
        -9 => "提取码错误",
        -6 => "登录态失效，请更新 cookie",
        105 => "分享链接不存在",
        110 => "分享链接已失效",
        _ => "未知错误",
    }
}

/// 解析 share/list 响应
///
/// errno 非 0（或缺失）时整体失败并附带原始响应；无法解析的单个条目跳过。
pub fn parse_list_response(text: &str) -> Result<Vec<FileEntry>, ResolveError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ResolveError::ListingFailed {
        reason: format!("响应不是合法 JSON: {}", e),
        raw: Value::String(text.to_string()),
    })?;

    match value.get("errno").and_then(Value::as_i64) {
        Some(0) => {}
        Some(errno) => {
            warn!("⚠️ list API errno: {}", errno);
            return Err(ResolveError::ListingFailed {
                reason: format!("errno={}, {}", errno, errno_hint(errno)),
                raw: value,
            });
        }
        None => {
            return Err(ResolveError::ListingFailed {
                reason: "响应缺少 errno".to_string(),
                raw: value,
            });
        }
    }

    let items = value
        .get("list")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        match FileItem::deserialize(item) {
            Ok(file) => entries.push(FileEntry::from(file)),
            Err(e) => warn!("⚠️ 跳过无法解析的条目: {} ({})", e, item),
        }
    }
    Ok(entries)
}

/// 获取分享内的全部条目（含目录本身），子目录最多展开 `folder_depth` 层
pub async fn list_files<A>(
    api: &A,
    ids: &ShareIds,
    share_url: &str,
    folder_depth: usize,
) -> Result<Vec<FileEntry>, ResolveError>
where
    A: ShareApi + ?Sized,
{
    info!("📋 获取文件列表: shareid={}, uk={}", ids.shareid, ids.uk);

    let mut entries = Vec::new();
    collect_dir(api, ids, share_url, None, folder_depth, &mut entries).await?;

    info!("✅ 列表共 {} 项", entries.len());
    Ok(entries)
}

fn collect_dir<'a, A>(
    api: &'a A,
    ids: &'a ShareIds,
    share_url: &'a str,
    dir: Option<String>,
    depth_left: usize,
    out: &'a mut Vec<FileEntry>,
) -> BoxFuture<'a, Result<(), ResolveError>>
where
    A: ShareApi + ?Sized,
{
    Box::pin(async move {
        let query = ListQuery {
            ids,
            share_url,
            dir: dir.as_deref(),
        };
        let text = api.list_share(&query).await?;
        debug!("📨 list 响应: {}", preview(&text, 200));

        for entry in parse_list_response(&text)? {
            let subdir = if entry.is_dir && depth_left > 0 {
                if entry.path.is_empty() {
                    warn!("⚠️ 目录 {} 没有路径，无法展开", entry.name);
                    None
                } else {
                    Some(entry.path.clone())
                }
            } else {
                None
            };

            out.push(entry);

            if let Some(path) = subdir {
                debug!("📁 展开子目录: {}", path);
                collect_dir(api, ids, share_url, Some(path), depth_left - 1, out).await?;
            }
        }
        Ok(())
    })
}
