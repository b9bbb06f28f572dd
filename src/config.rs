//! 配置文件加载

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub terabox: TeraboxConfig,
    #[serde(default)] // 没有 [web] 就用默认值
    pub web: WebConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeraboxConfig {
    /// Netscape 格式的 cookie 导出文件
    #[serde(default = "default_cookie_file")]
    pub cookie_file: String,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
    /// 同时进行的直链请求数，1 表示逐个请求
    #[serde(default = "default_resolve_concurrency")]
    pub resolve_concurrency: usize,
    /// 展开子文件夹的层数，0 表示只取分享根目录
    #[serde(default = "default_folder_depth")]
    pub folder_depth: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WebConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for TeraboxConfig {
    fn default() -> Self {
        Self {
            cookie_file: default_cookie_file(),
            http_timeout_secs: default_http_timeout_secs(),
            resolve_concurrency: default_resolve_concurrency(),
            folder_depth: default_folder_depth(),
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

fn default_cookie_file() -> String {
    "cookie.txt".to_string()
}

fn default_http_timeout_secs() -> u64 {
    30
}

fn default_resolve_concurrency() -> usize {
    4
}

fn default_folder_depth() -> usize {
    3
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// 读取配置文件；文件不存在时使用默认值，最后应用环境变量覆盖
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = fs::read_to_string(path)?;
            toml::from_str::<Config>(&content)
                .map_err(|e| anyhow!("解析配置文件 {} 失败: {}", path, e))?
        } else {
            Config::default()
        };

        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("COOKIE_FILE") {
            if !path.trim().is_empty() {
                self.terabox.cookie_file = path;
            }
        }
        if let Some(port) = env_parse::<u16>("PORT") {
            self.web.port = port;
        }
        if let Some(secs) = env_parse::<u64>("HTTP_TIMEOUT_SECS") {
            self.terabox.http_timeout_secs = secs;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.terabox.http_timeout_secs == 0 {
            return Err(anyhow!("http_timeout_secs 必须大于 0"));
        }
        if self.terabox.resolve_concurrency == 0 {
            return Err(anyhow!("resolve_concurrency 必须大于 0"));
        }
        Ok(())
    }

    pub fn browser_ua() -> &'static str {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
}
