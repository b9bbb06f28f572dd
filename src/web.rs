//! Web 服务器模块

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{ErrorKind, ResolveError};
use crate::terabox::SUPPORTED_DOMAINS;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ExtractQuery {
    #[serde(default)]
    pub extract: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub kind: &'static str,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported: Option<&'static [&'static str]>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

impl From<&ResolveError> for ErrorResponse {
    fn from(err: &ResolveError) -> Self {
        ErrorResponse {
            success: false,
            kind: err.kind().as_str(),
            error: err.to_string(),
            raw: err.raw().cloned(),
            supported: matches!(err, ResolveError::UnsupportedDomain { .. })
                .then_some(SUPPORTED_DOMAINS),
        }
    }
}

impl IntoResponse for ResolveError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        match kind {
            ErrorKind::Input | ErrorKind::Extraction => warn!("❌ 请求失败: {}", self),
            _ => error!("❌ 请求失败: {}", self),
        }

        let status =
            StatusCode::from_u16(kind.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

/// 健康检查端点
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: crate::VERSION,
    })
}

/// 解析端点：`GET /api?extract=<分享链接>`
///
/// 查询参数解析失败也按 `ErrorResponse` 返回
pub async fn extract_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ExtractQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            return ResolveError::InvalidQuery(rejection.body_text()).into_response();
        }
    };
    info!("📥 收到解析请求: {}", query.extract.as_deref().unwrap_or(""));

    match state.resolve_guarded(query.extract).await {
        Ok(result) => {
            info!("✅ 解析完成，共 {} 个文件", result.item_count);
            Json(result).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// 创建 Web 路由
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api", get(extract_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}
