//! 应用状态：配置 + HTTP client + cookie

use anyhow::Result;
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::cookies::{self, Credentials};
use crate::error::ResolveError;
use crate::terabox::client::build_http_client;
use crate::terabox::{self, ResolveOptions, ShareResult, TeraboxClient};

pub struct AppState {
    pub config: Config,
    pub client: Client,
    credentials: Option<Arc<Credentials>>,
}

impl AppState {
    /// 构建 HTTP client 并读取 cookie 文件
    ///
    /// cookie 缺失不会阻止启动，但之后每个请求都会返回配置错误。
    pub fn new(config: Config) -> Result<Self> {
        let credentials = cookies::load_cookie_file(&config.terabox.cookie_file)?;
        match &credentials {
            Some(creds) => info!(
                "🍪 已加载 {} 个 cookie: {}",
                creds.len(),
                config.terabox.cookie_file
            ),
            None => warn!(
                "⚠️ cookie 文件缺失或为空: {}，所有请求都会失败",
                config.terabox.cookie_file
            ),
        }
        Self::with_credentials(config, credentials)
    }

    pub fn with_credentials(config: Config, credentials: Option<Credentials>) -> Result<Self> {
        let client = build_http_client(std::time::Duration::from_secs(
            config.terabox.http_timeout_secs,
        ))?;

        Ok(Self {
            config,
            client,
            credentials: credentials.filter(|c| !c.is_empty()).map(Arc::new),
        })
    }

    /// 为单次请求创建会话，cookie 缺失时直接返回配置错误
    pub fn session(&self) -> Result<TeraboxClient, ResolveError> {
        let credentials = self
            .credentials
            .clone()
            .ok_or(ResolveError::MissingCredentials)?;
        Ok(TeraboxClient::new(self.client.clone(), credentials))
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions::from(&self.config.terabox)
    }

    /// 完整处理一个请求：校验链接 → 检查 cookie → 解析
    pub async fn resolve(&self, share_url: Option<&str>) -> Result<ShareResult, ResolveError> {
        terabox::validate_share_url(share_url)?;
        let session = self.session()?;
        let share_url = share_url.map(str::trim).unwrap_or_default();
        terabox::resolve_validated(&session, share_url, &self.resolve_options()).await
    }

    /// 在独立任务中解析，任务 panic 时转成内部错误返回
    pub async fn resolve_guarded(
        self: Arc<Self>,
        share_url: Option<String>,
    ) -> Result<ShareResult, ResolveError> {
        run_guarded(async move { self.resolve(share_url.as_deref()).await }).await
    }
}

/// 在独立任务中执行，panic 或任务被取消都转成 `ResolveError::Internal`
pub async fn run_guarded<F, T>(fut: F) -> Result<T, ResolveError>
where
    F: Future<Output = Result<T, ResolveError>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(fut).await {
        Ok(result) => result,
        Err(e) => {
            error!("❌ 解析任务异常退出: {}", e);
            Err(ResolveError::Internal(panic_message(e)))
        }
    }
}

fn panic_message(err: tokio::task::JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "任务 panic".to_string()
    }
}
