//! 展示用的转换：文件大小、缩略图

use super::types::Thumbnails;

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

const THUMBNAIL_BASE: &str = "https://data.1024tera.com/thumbnail";

/// 格式化文件大小，保留两位小数，例如 `1.50 KB`
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    for unit in UNITS {
        if value < 1024.0 {
            return format!("{:.2} {}", value, unit);
        }
        value /= 1024.0;
    }
    format!("{:.2} PB", value)
}

/// 按 fs_id 拼出四种尺寸的缩略图地址，不做网络校验
pub fn thumbnails(fs_id: u64) -> Thumbnails {
    let url = |w: u32, h: u32| {
        format!(
            "{}/{}?size=c{}_u{}&quality=100&ft=video",
            THUMBNAIL_BASE, fs_id, w, h
        )
    };

    Thumbnails {
        small: url(140, 90),
        medium: url(360, 270),
        icon: url(60, 60),
        large: url(850, 580),
    }
}
