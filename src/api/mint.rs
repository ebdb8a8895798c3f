//! 铸造 API
//!
//! POST /mint-nft

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::json_body;
use crate::domain::request::parse_mint_request;
use crate::error::ApiResult;
use crate::services::PipelineError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct MintResponse {
    transaction_hash: String,
    transaction_url: String,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/mint-nft", post(mint_nft))
}

/// 铸造一个 NFT
///
/// 需要配置 STARKNET_RPC_URL、STARKNET_ACCOUNT_ADDRESS 和 STARKNET_PRIVATE_KEY
async fn mint_nft(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let payload = json_body(&headers, &body)?;
    let params = parse_mint_request(&payload)?;

    let minter = state.minter.as_ref().ok_or_else(|| {
        PipelineError::Credential(
            "STARKNET_RPC_URL, STARKNET_ACCOUNT_ADDRESS and STARKNET_PRIVATE_KEY must be set"
                .to_string(),
        )
    })?;

    let transaction_hash = minter.mint(&params).await?;
    let transaction_url = state.config.network.transaction_url(&transaction_hash);
    Ok(Json(MintResponse {
        transaction_hash,
        transaction_url,
    }))
}
