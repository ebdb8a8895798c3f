//! 健康检查 API

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;

use crate::config::env::constants::VERSION;
use crate::state::AppState;

/// 健康检查响应
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    timestamp: String,
    uptime_secs: i64,
    network: String,
    rpc_configured: bool,
    generation_enabled: bool,
    minting_enabled: bool,
}

/// 创建健康检查路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(health_check))
}

/// 健康检查 - 返回状态、版本和已启用的功能
///
/// GET /health
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let now = chrono::Utc::now();
    Json(HealthResponse {
        status: "ok",
        service: "stark-deploy-agent",
        version: VERSION,
        timestamp: now.to_rfc3339(),
        uptime_secs: (now - state.started_at).num_seconds(),
        network: state.config.network.network.clone(),
        rpc_configured: state.rpc.is_some(),
        generation_enabled: state.generator.is_some(),
        minting_enabled: state.minter.is_some(),
    })
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use std::sync::Arc;

    use crate::infra::command::mock::ScriptedRunner;

    #[tokio::test]
    async fn test_health() {
        let contracts = contracts_dir();
        let state = state(Arc::new(ScriptedRunner::new()), contracts.path(), None, None);

        let (status, body) = send(state, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["network"], "sepolia");
        assert_eq!(body["generation_enabled"], false);
        assert_eq!(body["minting_enabled"], false);
    }
}
