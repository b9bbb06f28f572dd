//! TeraBox 分享链接解析模块

pub mod client;
pub mod download;
pub mod format;
pub mod parser;
pub mod pipeline;
pub mod share;
pub mod types;

// 导出常用函数
pub use client::{ListQuery, ShareApi, TeraboxClient, TransportError};
pub use download::{derive_fast_link, fast_link, get_download_link, get_download_links, LinkGap};
pub use format::{format_size, thumbnails};
pub use parser::{extract_share_ids, validate_share_url, SUPPORTED_DOMAINS};
pub use pipeline::{resolve_share, resolve_validated, ResolveOptions};
pub use share::list_files;
pub use types::{
    DownloadLinks, FileEntry, IdLookup, ResolvedFile, ShareIds, ShareResult, Thumbnails,
};
