//! Stark Deploy Agent - Starknet 合约部署代理
//!
//! 通过 scarb / sncast 构建、声明并部署合约的 HTTP 服务

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;
pub mod state;

use anyhow::Context;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::env::{constants::VERSION, log_level_from_env};
use crate::config::EnvConfig;
use crate::state::{get_shutdown_token, trigger_shutdown, AppState};

/// 命令行覆盖项
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    /// 覆盖 PORT 环境变量
    pub port_override: Option<u16>,
}

/// 初始化日志：RUST_LOG 优先，否则使用 LOG_LEVEL
pub fn init_tracing() {
    let default_level = log_level_from_env();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

/// 加载配置、启动 HTTP 服务，直到收到 Ctrl-C
pub async fn init_and_run_agent_with_config(runtime: RuntimeConfig) -> anyhow::Result<()> {
    init_tracing();

    let mut config = EnvConfig::from_env();
    if let Some(port) = runtime.port_override {
        config.port = port;
    }
    let addr = format!("{}:{}", config.bind_addr, config.port);

    let shutdown = get_shutdown_token();
    let state = Arc::new(AppState::new(config, shutdown.clone()));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(addr = %addr, version = VERSION, "Stark deploy agent listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received, cancelling in-flight waits");
    trigger_shutdown();
}
