//! 读取浏览器导出的 cookie.txt（Netscape 格式）

use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// 登录态 cookie，整个请求期间只读共享
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    cookies: BTreeMap<String, String>,
}

impl Credentials {
    pub fn new(cookies: BTreeMap<String, String>) -> Self {
        Self { cookies }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    #[cfg(test)]
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// 拼成 `Cookie` 请求头
    pub fn header_value(&self) -> String {
        self.cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// 解析 Netscape cookie 文件内容
///
/// 每行 7 列以 TAB 分隔，第 6 列是名字、第 7 列是值。
/// `#HttpOnly_` 开头的行是真实 cookie，其余 `#` 开头的是注释。
pub fn parse_cookie_txt(content: &str) -> Credentials {
    let mut cookies = BTreeMap::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let line = match line.strip_prefix("#HttpOnly_") {
            Some(rest) => rest,
            None if line.starts_with('#') => continue,
            None => line,
        };

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() >= 7 {
            cookies.insert(parts[5].to_string(), parts[6].to_string());
        }
    }

    Credentials::new(cookies)
}

/// 读取 cookie 文件；文件不存在或没有任何 cookie 时返回 None
pub fn load_cookie_file(path: impl AsRef<Path>) -> Result<Option<Credentials>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let credentials = parse_cookie_txt(&content);
    if credentials.is_empty() {
        return Ok(None);
    }
    Ok(Some(credentials))
}
