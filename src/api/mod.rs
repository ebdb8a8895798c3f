//! API 模块
//!
//! HTTP handlers 和路由组装

pub mod build;
pub mod deploy;
pub mod health;
pub mod mint;
pub mod tx_status;

use axum::{
    body::Bytes,
    http::{header::CONTENT_TYPE, HeaderMap},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::domain::ValidationError;
use crate::state::AppState;

/// 构建完整的 API 路由
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .merge(health::router())
        // Deploy
        .merge(deploy::router())
        // Mint
        .merge(mint::router())
        // Generation
        .merge(build::router())
        // Transaction status
        .merge(tx_status::router())
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// 请求体的媒体类型（忽略 charset 等参数）
pub(crate) fn media_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
}

/// 解析 JSON 请求体，Content-Type 必须是 application/json
pub(crate) fn json_body(headers: &HeaderMap, body: &Bytes) -> Result<Value, ValidationError> {
    if media_type(headers).as_deref() != Some("application/json") {
        return Err(ValidationError::body("Expected application/json body"));
    }
    serde_json::from_slice(body)
        .map_err(|e| ValidationError::body(format!("Malformed JSON body: {}", e)))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use std::path::Path;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use crate::config::{EnvConfig, NetworkConfig, ToolConfig};
    use crate::infra::command::mock::ScriptedRunner;
    use crate::services::deploy::finality::NoWait;
    use crate::services::{DeployPipeline, NftMinter, SourceGenerator};

    pub const TOKEN_SOURCE: &str = "#[starknet::contract]\nmod MyToken {\n    #[constructor]\n    fn constructor(ref self: ContractState) {\n        let name: ByteArray = \"MyToken\";\n        let symbol: ByteArray = \"MTK\";\n        let max_supply: u256 = 1000000;\n        let decimals: u8 = 18;\n    }\n}\n";

    pub const NFT_SOURCE: &str = "#[starknet::contract]\nmod MyNFT {\n    #[constructor]\n    fn constructor(ref self: ContractState) {\n        let name: ByteArray = \"MyNFT\";\n        let symbol: ByteArray = \"NFT\";\n        let base_uri: ByteArray = \"ipfs://placeholder/\";\n    }\n}\n";

    pub const COUNTER_SOURCE: &str = "#[starknet::contract]\nmod Counter {\n    #[storage]\n    struct Storage { value: u128 }\n}\n";

    /// 在临时目录中创建所有合约项目模板
    pub fn contracts_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (project, source) in [
            ("token-contract", TOKEN_SOURCE),
            ("nft-contract", NFT_SOURCE),
            ("custom-contract", "// replaced per request\n"),
            ("counter-contract", COUNTER_SOURCE),
        ] {
            let root = dir.path().join(project);
            std::fs::create_dir_all(root.join("src")).unwrap();
            std::fs::write(root.join("Scarb.toml"), "[package]\nname = \"c\"\n").unwrap();
            std::fs::write(root.join("src/lib.cairo"), source).unwrap();
        }
        dir
    }

    pub fn state(
        runner: Arc<ScriptedRunner>,
        contracts: &Path,
        generator: Option<Arc<dyn SourceGenerator>>,
        minter: Option<Arc<dyn NftMinter>>,
    ) -> Arc<AppState> {
        let config = EnvConfig {
            contracts_dir: contracts.to_path_buf(),
            ..EnvConfig::default()
        };
        let pipeline = DeployPipeline::new(
            runner,
            ToolConfig::default(),
            NetworkConfig::default(),
            contracts.to_path_buf(),
            Arc::new(NoWait),
            1,
            CancellationToken::new(),
        );
        Arc::new(AppState::with_services(config, pipeline, generator, minter))
    }

    /// 成功部署的三次工具调用
    pub fn successful_runner() -> Arc<ScriptedRunner> {
        Arc::new(
            ScriptedRunner::new()
                .then_output(0, "Finished release target(s)", "")
                .then_output(0, "Class Hash: 0x1\nTransaction Hash: 0x9", "")
                .then_output(0, "Contract Address: 0x2\nTransaction Hash: 0x3", ""),
        )
    }

    pub async fn send(
        state: Arc<AppState>,
        request: Request<Body>,
    ) -> (StatusCode, serde_json::Value) {
        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn post_raw(uri: &str, content_type: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, content_type)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_media_type_ignores_parameters() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("Application/JSON; charset=utf-8"),
        );
        assert_eq!(media_type(&headers).as_deref(), Some("application/json"));
    }

    #[test]
    fn test_json_body_requires_content_type() {
        let err = json_body(&HeaderMap::new(), &Bytes::from_static(b"{}")).unwrap_err();
        assert_eq!(err.message, "Expected application/json body");
    }

    #[test]
    fn test_json_body_rejects_malformed_json() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let err = json_body(&headers, &Bytes::from_static(b"{nope")).unwrap_err();
        assert!(err.message.starts_with("Malformed JSON body"));
    }
}
