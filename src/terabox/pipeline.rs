//! 分享链接解析主流程
//!
//! 分享页 → uk/shareid → 文件列表 → 逐个文件获取直链 → 组装结果。
//! 任何一步失败都直接结束本次请求；单个文件拿不到直链只记录在该文件上。

use tracing::{info, warn};

use super::client::{ShareApi, TransportError};
use super::download::{get_download_links, LinkOutcome};
use super::format::{format_size, thumbnails};
use super::parser::{extract_share_ids, validate_share_url};
use super::share::list_files;
use super::types::{FileEntry, ResolvedFile, ShareIds, ShareResult};
use crate::config::TeraboxConfig;
use crate::error::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// 同时进行的直链请求数
    pub concurrency: usize,
    /// 子目录展开层数
    pub folder_depth: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            folder_depth: 3,
        }
    }
}

impl From<&TeraboxConfig> for ResolveOptions {
    fn from(cfg: &TeraboxConfig) -> Self {
        Self {
            concurrency: cfg.resolve_concurrency,
            folder_depth: cfg.folder_depth,
        }
    }
}

/// 校验链接后解析分享
pub async fn resolve_share<A>(
    api: &A,
    share_url: Option<&str>,
    opts: &ResolveOptions,
) -> Result<ShareResult, ResolveError>
where
    A: ShareApi + ?Sized,
{
    validate_share_url(share_url)?;
    let share_url = share_url.map(str::trim).unwrap_or_default();
    resolve_validated(api, share_url, opts).await
}

/// 解析已经通过 `validate_share_url` 的分享链接
pub async fn resolve_validated<A>(
    api: &A,
    share_url: &str,
    opts: &ResolveOptions,
) -> Result<ShareResult, ResolveError>
where
    A: ShareApi + ?Sized,
{
    info!("📥 解析分享链接: {}", share_url);

    let ids = fetch_share_ids(api, share_url).await?;
    info!("✅ 提取到: uk={}, shareid={}", ids.uk, ids.shareid);

    let entries = list_files(api, &ids, share_url, opts.folder_depth).await?;
    let files: Vec<FileEntry> = entries.into_iter().filter(|e| !e.is_dir).collect();
    info!("📦 共 {} 个文件", files.len());

    let outcomes = get_download_links(api, &ids, &files, opts.concurrency).await;

    let resolved: Vec<ResolvedFile> = files
        .into_iter()
        .zip(outcomes)
        .map(|(file, outcome)| assemble_file(file, outcome))
        .collect();

    Ok(ShareResult {
        short_link: share_url.to_string(),
        item_count: resolved.len(),
        files: resolved,
        success: true,
    })
}

async fn fetch_share_ids<A>(api: &A, share_url: &str) -> Result<ShareIds, ResolveError>
where
    A: ShareApi + ?Sized,
{
    let html = match api.fetch_share_page(share_url).await {
        Ok(html) => html,
        Err(TransportError::Timeout) => {
            warn!("⚠️ 分享页请求超时: {}", share_url);
            return Err(ResolveError::IdentifiersNotFound);
        }
        Err(e) => return Err(e.into()),
    };

    extract_share_ids(&html)
        .found()
        .ok_or(ResolveError::IdentifiersNotFound)
}

fn assemble_file(file: FileEntry, outcome: LinkOutcome) -> ResolvedFile {
    ResolvedFile {
        thumbnails: thumbnails(file.fs_id),
        size: format_size(file.size),
        size_bytes: file.size,
        fs_id: file.fs_id,
        title: file.name,
        path: file.path,
        direct_link: outcome.links.direct,
        fast_link: outcome.links.fast,
        link_error: outcome.gap.map(|gap| gap.to_string()),
    }
}
