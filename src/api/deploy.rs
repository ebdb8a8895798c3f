//! 部署 API
//!
//! 包含 /create-token, /deploy-contract, /deploy-nft 端点

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

use super::{json_body, media_type};
use crate::domain::request::{parse_nft_request, parse_source_request, parse_token_request};
use crate::domain::{DeployRequest, ValidationError};
use crate::error::ApiResult;
use crate::state::AppState;

/// 创建部署路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/create-token", post(create_token))
        .route("/deploy-contract", post(deploy_contract))
        .route("/deploy-nft", post(deploy_nft))
}

/// 部署 ERC20 代币
///
/// POST /create-token
async fn create_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let payload = json_body(&headers, &body)?;
    let request = parse_token_request(&payload)?;
    run(&state, request).await
}

/// 部署任意合约源码
///
/// POST /deploy-contract
/// 接受 application/json `{code, contract_name?}` 或 text/plain 源码
async fn deploy_contract(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let request = match media_type(&headers).as_deref() {
        Some("text/plain") => {
            let code = std::str::from_utf8(&body)
                .map_err(|_| ValidationError::body("Source body must be UTF-8 text"))?;
            parse_source_request(code, None)?
        }
        Some("application/json") => {
            let payload = json_body(&headers, &body)?;
            let code = match payload.get("code") {
                Some(Value::String(code)) => code.as_str(),
                _ => {
                    return Err(
                        ValidationError::field("code", "'code' must be a non-empty string").into(),
                    )
                }
            };
            let contract_name = payload.get("contract_name").and_then(Value::as_str);
            parse_source_request(code, contract_name)?
        }
        _ => {
            return Err(
                ValidationError::body("Expected application/json or text/plain body").into(),
            )
        }
    };
    run(&state, request).await
}

/// 部署 ERC721 集合
///
/// POST /deploy-nft
async fn deploy_nft(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let payload = json_body(&headers, &body)?;
    let request = parse_nft_request(&payload)?;
    run(&state, request).await
}

async fn run(state: &AppState, request: DeployRequest) -> ApiResult<impl IntoResponse> {
    let result = state.pipeline.run(&request).await?;
    Ok((StatusCode::CREATED, Json(result)))
}
