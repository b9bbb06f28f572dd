use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use terabox_direct_link::{config::Config, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "terabox_direct_link=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // 用法：terabox-direct-link <share_url> [config_path]
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        return Err(anyhow!(
            "用法: {} <share_url> [config_path]",
            args.first()
                .map(|s| s.as_str())
                .unwrap_or("terabox-direct-link")
        ));
    }

    let share_url = args[1].clone();
    let config_path = std::env::var("CONFIG_PATH")
        .ok()
        .or_else(|| args.get(2).cloned())
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;
    if std::path::Path::new(&config_path).exists() {
        tracing::info!("✅ 配置加载完成: {}", config_path);
    } else {
        tracing::info!("✅ 使用默认配置与环境变量");
    }

    let state = Arc::new(AppState::new(config)?);

    let result = state
        .resolve_guarded(Some(share_url))
        .await
        .map_err(|e| anyhow!("解析失败 ({}): {}", e.kind().as_str(), e))?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
