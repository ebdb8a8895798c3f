//! 交易状态查询 API
//!
//! GET /tx-status/:hash

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::domain::request::is_hex_address;
use crate::domain::ValidationError;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct TxStatusResponse {
    transaction_hash: String,
    status: &'static str,
    finality_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    execution_status: Option<String>,
    transaction_url: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/tx-status/:hash", get(tx_status))
}

/// 查询交易状态 - 返回节点报告的 finality/execution 状态
///
/// GET /tx-status/:hash
///
/// 需要配置 STARKNET_RPC_URL
async fn tx_status(
    State(state): State<Arc<AppState>>,
    Path(hash): Path<String>,
) -> ApiResult<impl IntoResponse> {
    if !is_hex_address(&hash) {
        return Err(ValidationError::field(
            "hash",
            "transaction hash must be 0x followed by 1 to 64 hex digits",
        )
        .into());
    }
    let rpc = state
        .rpc
        .as_ref()
        .ok_or_else(|| ValidationError::body("STARKNET_RPC_URL is not configured"))?;

    let status = rpc.transaction_status(&hash).await.map_err(|e| {
        warn!(tx_hash = %hash, error = %e, "Transaction status lookup failed");
        ApiError::internal(format!("transaction status lookup failed: {}", e))
    })?;

    Ok(Json(TxStatusResponse {
        transaction_url: state.config.network.transaction_url(&hash),
        status: status.label(),
        finality_status: status.finality_status,
        execution_status: status.execution_status,
        transaction_hash: hash,
    }))
}
