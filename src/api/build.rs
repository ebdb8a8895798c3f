//! 合约生成 API
//!
//! GET/POST /build-contract

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

use super::json_body;
use crate::domain::request::{parse_build_request, MAX_INSTRUCTIONS_LEN, MIN_INSTRUCTIONS_LEN};
use crate::domain::DeployResult;
use crate::error::ApiResult;
use crate::services::{generate_or_fallback, BuildOutcome};
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct GeneratedResponse {
    generated: bool,
    contract_name: String,
    contract_code: String,
}

#[derive(Debug, Serialize)]
struct FallbackResponse {
    generated: bool,
    fallback_reason: String,
    #[serde(flatten)]
    result: DeployResult,
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/build-contract", get(describe).post(build_contract))
}

/// 生成合约源码；生成不可用时部署内置计数器合约
///
/// POST /build-contract
async fn build_contract(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Response> {
    let payload = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        Some(json_body(&headers, &body)?)
    };
    let params = parse_build_request(payload.as_ref())?;

    let outcome =
        generate_or_fallback(state.generator.as_deref(), &state.pipeline, &params).await?;

    let response = match outcome {
        BuildOutcome::Generated(generated) => Json(GeneratedResponse {
            generated: true,
            contract_name: generated.contract_name,
            contract_code: generated.contract_code,
        })
        .into_response(),
        BuildOutcome::Fallback { reason, result } => (
            StatusCode::CREATED,
            Json(FallbackResponse {
                generated: false,
                fallback_reason: reason,
                result,
            }),
        )
            .into_response(),
    };
    Ok(response)
}

/// GET /build-contract
async fn describe(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "message": "Contract Builder API",
        "generation_enabled": state.generator.is_some(),
        "endpoints": {
            "POST": "/build-contract",
            "description": "Generate a Cairo Starknet contract from instructions; deploys the bundled counter contract when generation is unavailable",
            "parameters": {
                "instructions": format!(
                    "string (optional) - natural language instructions, {}..{} characters",
                    MIN_INSTRUCTIONS_LEN, MAX_INSTRUCTIONS_LEN
                ),
                "contract_name": "string (optional) - name for the generated contract module",
            },
        },
    }))
}
