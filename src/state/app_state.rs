//! 应用状态

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// 全局 shutdown token，用于取消进行中的等待
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// 获取全局 shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN
        .get_or_init(CancellationToken::new)
        .clone()
}

/// 触发全局 shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}

use crate::config::env::EnvConfig;
use crate::infra::{ChatCompletionClient, StarknetRpcClient};
use crate::services::{
    DeployPipeline, LlmSourceGenerator, NftMinter, SourceGenerator, StarknetMinter,
};

/// 应用状态
pub struct AppState {
    // ========== 核心配置 ==========
    /// 环境配置
    pub config: EnvConfig,
    /// 服务启动时间
    pub started_at: DateTime<Utc>,

    // ========== 服务 ==========
    /// 部署流水线
    pub pipeline: DeployPipeline,
    /// 源码生成（未配置 API key 时为 None）
    pub generator: Option<Arc<dyn SourceGenerator>>,
    /// 铸造（未配置签名凭据时为 None）
    pub minter: Option<Arc<dyn NftMinter>>,
    /// RPC 客户端（未配置 RPC URL 时为 None）
    pub rpc: Option<StarknetRpcClient>,
}

impl AppState {
    /// 根据配置创建应用状态
    pub fn new(config: EnvConfig, cancel: CancellationToken) -> Self {
        tracing::info!(
            port = config.port,
            contracts_dir = %config.contracts_dir.display(),
            network = %config.network.network,
            rpc_configured = config.network.rpc_url.is_some(),
            json_output = config.tools.json_output,
            max_concurrent_pipelines = config.max_concurrent_pipelines,
            "Loaded configuration"
        );

        let generator = config.generation.as_ref().map(|generation| {
            tracing::info!(model = %generation.model, "Source generation enabled");
            Arc::new(LlmSourceGenerator::new(ChatCompletionClient::new(
                generation.api_key.clone(),
                generation.model.clone(),
                generation.base_url.clone(),
            ))) as Arc<dyn SourceGenerator>
        });

        let minter = config.credentials.as_ref().map(|credentials| {
            tracing::info!(account = %credentials.account_address, "Minting enabled");
            Arc::new(StarknetMinter::new(credentials.clone())) as Arc<dyn NftMinter>
        });

        let rpc = config.network.rpc_url.clone().map(StarknetRpcClient::new);

        Self {
            pipeline: DeployPipeline::from_config(&config, cancel),
            generator,
            minter,
            rpc,
            started_at: Utc::now(),
            config,
        }
    }

    /// 使用自定义组件创建状态（测试用）
    #[cfg(test)]
    pub fn with_services(
        config: EnvConfig,
        pipeline: DeployPipeline,
        generator: Option<Arc<dyn SourceGenerator>>,
        minter: Option<Arc<dyn NftMinter>>,
    ) -> Self {
        let rpc = config.network.rpc_url.clone().map(StarknetRpcClient::new);
        Self {
            config,
            started_at: Utc::now(),
            pipeline,
            generator,
            minter,
            rpc,
        }
    }
}
