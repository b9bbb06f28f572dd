//! TeraBox 内部接口的 HTTP 调用
//!
//! `ShareApi` 只负责把请求发出去并拿回响应文本，解析放在各业务模块里，
//! 这样测试时可以替换成内存实现。

use async_trait::async_trait;
use reqwest::{header, redirect, Client, Url};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::download::download_form;
use super::share::list_form;
use super::types::ShareIds;
use crate::config::Config;
use crate::cookies::Credentials;

pub const WEB_ORIGIN: &str = "https://www.terabox.com";
pub const WEB_ROOT: &str = "https://www.terabox.com/";
pub const LIST_PATH: &str = "/share/list";
pub const DOWNLOAD_PATH: &str = "/api/sharedownload";

/// 分享页最多跟随的重定向次数
const MAX_REDIRECTS: usize = 10;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("请求超时")]
    Timeout,

    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if let Some(status) = e.status() {
            TransportError::Status(status.as_u16())
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// 列表请求参数
#[derive(Debug, Clone, Copy)]
pub struct ListQuery<'a> {
    pub ids: &'a ShareIds,
    /// 原始分享链接，作为 Referer
    pub share_url: &'a str,
    /// 子目录路径；None 表示分享根目录
    pub dir: Option<&'a str>,
}

#[async_trait]
pub trait ShareApi: Send + Sync {
    /// 获取分享页 HTML
    async fn fetch_share_page(&self, share_url: &str) -> Result<String, TransportError>;

    /// 调用 share/list，返回原始响应文本
    async fn list_share(&self, query: &ListQuery<'_>) -> Result<String, TransportError>;

    /// 调用 api/sharedownload，返回原始响应文本
    async fn share_download(&self, ids: &ShareIds, fs_id: u64) -> Result<String, TransportError>;
}

/// 构建上游请求用的 client
///
/// 关闭自动重定向：reqwest 跨主机重定向时会去掉手动设置的 `Cookie`，
/// 分享页的重定向由 `fetch_share_page` 自己跟随。
pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .redirect(redirect::Policy::none())
        .build()
}

/// 单次请求的会话：HTTP client + 只读 cookie
#[derive(Clone)]
pub struct TeraboxClient {
    client: Client,
    credentials: Arc<Credentials>,
    api_base: String,
}

impl TeraboxClient {
    /// `client` 应由 `build_http_client` 创建
    pub fn new(client: Client, credentials: Arc<Credentials>) -> Self {
        Self::with_base(client, credentials, WEB_ORIGIN)
    }

    /// 指定接口地址前缀；Referer/Origin 仍然是网页端地址
    pub fn with_base(client: Client, credentials: Arc<Credentials>, api_base: &str) -> Self {
        Self {
            client,
            credentials,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&'static str, String)],
        referer: &str,
    ) -> Result<String, TransportError> {
        debug!("📡 POST {} form={:?}", url, form);

        let resp = self
            .client
            .post(url)
            .header(header::USER_AGENT, Config::browser_ua())
            .header(header::REFERER, referer)
            .header(header::ORIGIN, WEB_ORIGIN)
            .header(header::COOKIE, self.credentials.header_value())
            .form(form)
            .send()
            .await?
            .error_for_status()?;

        let text = resp.text().await?;
        debug!("📨 {} 响应: {}", url, preview(&text, 300));
        Ok(text)
    }
}

#[async_trait]
impl ShareApi for TeraboxClient {
    async fn fetch_share_page(&self, share_url: &str) -> Result<String, TransportError> {
        let mut url = Url::parse(share_url).map_err(|e| TransportError::Request(e.to_string()))?;

        for _ in 0..=MAX_REDIRECTS {
            let resp = self
                .client
                .get(url.clone())
                .header(header::USER_AGENT, Config::browser_ua())
                .header(header::COOKIE, self.credentials.header_value())
                .send()
                .await?;

            let location = resp
                .status()
                .is_redirection()
                .then(|| resp.headers().get(header::LOCATION))
                .flatten()
                .and_then(|v| v.to_str().ok());

            if let Some(location) = location {
                let next = url
                    .join(location)
                    .map_err(|e| TransportError::Request(format!("无效的跳转地址 {}: {}", location, e)))?;
                debug!("↪️ 分享页跳转: {} -> {}", url, next);
                url = next;
                continue;
            }

            let html = resp.error_for_status()?.text().await?;
            debug!("📄 页面长度: {} 字节", html.len());
            return Ok(html);
        }

        Err(TransportError::Request(format!(
            "分享页重定向超过 {} 次",
            MAX_REDIRECTS
        )))
    }

    async fn list_share(&self, query: &ListQuery<'_>) -> Result<String, TransportError> {
        let form = list_form(query.ids, query.dir);
        self.post_form(&self.api_url(LIST_PATH), &form, query.share_url)
            .await
    }

    async fn share_download(&self, ids: &ShareIds, fs_id: u64) -> Result<String, TransportError> {
        let form = download_form(ids, fs_id);
        self.post_form(&self.api_url(DOWNLOAD_PATH), &form, WEB_ROOT)
            .await
    }
}

/// 截断过长的响应用于日志，按字符边界截断
pub(crate) fn preview(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
