//! 数据类型

use serde::Serialize;

/// 分享页中提取到的两个会话标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareIds {
    /// 分享者 uk
    pub uk: String,
    pub shareid: String,
}

/// 标识提取结果：找到或找不到，不会出错
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdLookup {
    Found(ShareIds),
    NotFound,
}

impl IdLookup {
    pub fn found(self) -> Option<ShareIds> {
        match self {
            IdLookup::Found(ids) => Some(ids),
            IdLookup::NotFound => None,
        }
    }
}

/// 文件列表中的一项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub fs_id: u64,
    pub name: String,
    /// 网盘内路径，展开子目录时使用
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
}

/// 单个文件的直链；拿不到时两个字段都为空
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadLinks {
    pub direct: Option<String>,
    pub fast: Option<String>,
}

/// 四种固定尺寸的缩略图
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thumbnails {
    #[serde(rename = "140x90")]
    pub small: String,
    #[serde(rename = "360x270")]
    pub medium: String,
    #[serde(rename = "60x60")]
    pub icon: String,
    #[serde(rename = "850x580")]
    pub large: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedFile {
    pub fs_id: u64,
    pub title: String,
    pub path: String,
    pub size: String,
    pub size_bytes: u64,
    pub direct_link: Option<String>,
    pub fast_link: Option<String>,
    pub thumbnails: Thumbnails,
    /// 没拿到直链的原因
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShareResult {
    pub short_link: String,
    pub files: Vec<ResolvedFile>,
    pub success: bool,
    pub item_count: usize,
}
