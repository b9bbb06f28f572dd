//! 获取分享文件的下载直链

use futures::stream::{self, StreamExt};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::client::{ShareApi, TransportError};
use super::types::{DownloadLinks, FileEntry, ShareIds};

/// 直链里的 CDN 主机，加速链接把它替换为镜像主机
const CDN_HOST: &str = "d.1024tera.com";
const MIRROR_HOST: &str = "d8.freeterabox.com";

/// 单个文件拿不到直链的原因，不影响其他文件
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LinkGap {
    #[error("请求失败: {0}")]
    Transport(#[from] TransportError),

    #[error("响应无法解析: {0}")]
    MalformedBody(String),

    #[error("响应中没有 dlink")]
    NoLink,
}

/// 单个文件的直链结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkOutcome {
    pub links: DownloadLinks,
    pub gap: Option<LinkGap>,
}

impl LinkOutcome {
    fn from_result(result: Result<String, LinkGap>) -> Self {
        let (direct, gap) = match result {
            Ok(dlink) => (Some(dlink), None),
            Err(gap) => (None, Some(gap)),
        };
        LinkOutcome {
            links: DownloadLinks {
                fast: derive_fast_link(direct.as_deref()),
                direct,
            },
            gap,
        }
    }
}

/// api/sharedownload 表单
pub fn download_form(ids: &ShareIds, fs_id: u64) -> Vec<(&'static str, String)> {
    vec![
        ("product", "share".to_string()),
        ("nozip", "0".to_string()),
        ("fid_list", format!("[{}]", fs_id)),
        ("primaryid", ids.shareid.clone()),
        ("uk", ids.uk.clone()),
        ("channel", "android_12".to_string()),
        ("web", "1".to_string()),
        ("clienttype", "0".to_string()),
    ]
}

/// 把直链中的 CDN 主机换成镜像主机
pub fn fast_link(dlink: &str) -> String {
    dlink.replace(CDN_HOST, MIRROR_HOST)
}

/// 由可能缺失的直链推出加速链接，直链缺失时加速链接也缺失
pub fn derive_fast_link(dlink: Option<&str>) -> Option<String> {
    dlink.map(fast_link)
}

/// 从 sharedownload 响应读取 `list[0].dlink`
pub fn parse_dlink(text: &str) -> Result<String, LinkGap> {
    #[derive(Deserialize)]
    struct DownloadResponse {
        #[serde(default)]
        list: Vec<DownloadItem>,
    }

    #[derive(Deserialize)]
    struct DownloadItem {
        #[serde(default)]
        dlink: Option<String>,
    }

    let resp: DownloadResponse =
        serde_json::from_str(text).map_err(|e| LinkGap::MalformedBody(e.to_string()))?;

    resp.list
        .into_iter()
        .next()
        .and_then(|item| item.dlink)
        .filter(|dlink| !dlink.is_empty())
        .ok_or(LinkGap::NoLink)
}

/// 获取单个文件的直链
pub async fn get_download_link<A>(api: &A, ids: &ShareIds, fs_id: u64) -> LinkOutcome
where
    A: ShareApi + ?Sized,
{
    debug!("📡 sharedownload: fs_id={}", fs_id);

    let result = match api.share_download(ids, fs_id).await {
        Ok(text) => parse_dlink(&text),
        Err(e) => Err(LinkGap::from(e)),
    };

    if let Err(gap) = &result {
        warn!("⚠️ 获取 fs_id={} 的直链失败: {}", fs_id, gap);
    }
    LinkOutcome::from_result(result)
}

/// 批量获取直链，最多同时 `concurrency` 个请求，结果顺序与输入一致
pub async fn get_download_links<A>(
    api: &A,
    ids: &ShareIds,
    files: &[FileEntry],
    concurrency: usize,
) -> Vec<LinkOutcome>
where
    A: ShareApi + ?Sized,
{
    info!(
        "🔗 获取 {} 个文件的下载直链（并发 {}）...",
        files.len(),
        concurrency
    );

    // 只把 fs_id 放进 stream，future 不借用 FileEntry
    let fs_ids: Vec<u64> = files.iter().map(|f| f.fs_id).collect();
    let outcomes: Vec<LinkOutcome> = stream::iter(fs_ids)
        .map(|fs_id| get_download_link(api, ids, fs_id))
        .buffered(concurrency.max(1))
        .collect()
        .await;

    let ok = outcomes.iter().filter(|o| o.gap.is_none()).count();
    info!("✅ 成功获取 {}/{} 个下载链接", ok, outcomes.len());
    outcomes
}
