//! 等待 declare 交易确认
//!
//! 配置了 RPC 节点时按指数退避轮询交易状态，直到超时；否则固定等待一段时间。
//! 两种方式都响应取消令牌。

use async_trait::async_trait;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::FinalityConfig;
use crate::infra::StarknetRpcClient;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FinalityError {
    #[error("wait for declare transaction was cancelled")]
    Cancelled,
    #[error("declare transaction {tx_hash} not accepted after {elapsed_secs}s")]
    Timeout { tx_hash: String, elapsed_secs: u64 },
    #[error("declare transaction {tx_hash} was {status}")]
    Rejected { tx_hash: String, status: String },
}

/// declare 阶段的结果
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Declared {
    /// 新提交了 declare 交易，输出里不一定能解析出交易哈希
    Fresh(Option<String>),
    /// 类已存在，没有新交易
    AlreadyDeclared,
}

#[derive(Debug, PartialEq, Eq)]
pub enum WaitOutcome {
    /// 类已声明，无需等待
    Skipped,
    /// 固定延时已结束
    Delayed(Duration),
    /// 节点确认交易已被接受
    Accepted { polls: u32 },
}

impl WaitOutcome {
    pub fn describe(&self) -> String {
        match self {
            WaitOutcome::Skipped => "class already declared".to_string(),
            WaitOutcome::Delayed(d) => format!("waited fixed {}s", d.as_secs()),
            WaitOutcome::Accepted { polls } => format!("accepted after {} poll(s)", polls),
        }
    }
}

#[async_trait]
pub trait FinalityWaiter: Send + Sync {
    async fn wait(
        &self,
        declared: &Declared,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, FinalityError>;
}

async fn sleep_or_cancel(
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<WaitOutcome, FinalityError> {
    info!(delay_secs = delay.as_secs(), "Waiting fixed delay for declare to settle");
    tokio::select! {
        _ = cancel.cancelled() => Err(FinalityError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(WaitOutcome::Delayed(delay)),
    }
}

/// 固定延时（未配置 RPC 节点时使用）
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl FinalityWaiter for FixedDelay {
    async fn wait(
        &self,
        declared: &Declared,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, FinalityError> {
        match declared {
            Declared::AlreadyDeclared => Ok(WaitOutcome::Skipped),
            Declared::Fresh(_) => sleep_or_cancel(self.delay, cancel).await,
        }
    }
}

/// 轮询 `starknet_getTransactionStatus` 直到 declare 被接受
///
/// 拿不到交易哈希时退回固定延时。
pub struct RpcPoller {
    client: StarknetRpcClient,
    config: FinalityConfig,
}

impl RpcPoller {
    pub fn new(client: StarknetRpcClient, config: FinalityConfig) -> Self {
        Self { client, config }
    }

    async fn poll(
        &self,
        tx_hash: &str,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, FinalityError> {
        let started = Instant::now();
        let mut interval = self.config.poll_interval;
        let mut polls = 0u32;

        loop {
            polls += 1;
            match self.client.transaction_status(tx_hash).await {
                Ok(status) if status.is_failed() => {
                    warn!(tx_hash = %tx_hash, status = status.label(), "Declare transaction failed");
                    return Err(FinalityError::Rejected {
                        tx_hash: tx_hash.to_string(),
                        status: status.label().to_string(),
                    });
                }
                Ok(status) if status.is_accepted() => {
                    info!(
                        tx_hash = %tx_hash,
                        finality_status = %status.finality_status,
                        polls = polls,
                        "Declare transaction accepted"
                    );
                    return Ok(WaitOutcome::Accepted { polls });
                }
                Ok(status) => {
                    debug!(tx_hash = %tx_hash, status = status.label(), polls = polls, "Declare still pending");
                }
                Err(e) => {
                    warn!(tx_hash = %tx_hash, error = %e, polls = polls, "Failed to poll transaction status, will retry");
                }
            }

            let elapsed = started.elapsed();
            if elapsed >= self.config.timeout {
                return Err(FinalityError::Timeout {
                    tx_hash: tx_hash.to_string(),
                    elapsed_secs: elapsed.as_secs(),
                });
            }

            let sleep_for = interval.min(self.config.timeout - elapsed);
            tokio::select! {
                _ = cancel.cancelled() => return Err(FinalityError::Cancelled),
                _ = tokio::time::sleep(sleep_for) => {}
            }
            interval = (interval * 2).min(self.config.max_poll_interval);
        }
    }
}

#[async_trait]
impl FinalityWaiter for RpcPoller {
    async fn wait(
        &self,
        declared: &Declared,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome, FinalityError> {
        match declared {
            Declared::AlreadyDeclared => Ok(WaitOutcome::Skipped),
            Declared::Fresh(Some(tx_hash)) => self.poll(tx_hash, cancel).await,
            Declared::Fresh(None) => {
                warn!("Declare output carried no transaction hash, falling back to fixed delay");
                sleep_or_cancel(self.config.fixed_delay, cancel).await
            }
        }
    }
}

/// 立即返回，测试用
#[cfg(test)]
pub struct NoWait;

#[cfg(test)]
#[async_trait]
impl FinalityWaiter for NoWait {
    async fn wait(
        &self,
        declared: &Declared,
        _cancel: &CancellationToken,
    ) -> Result<WaitOutcome, FinalityError> {
        Ok(match declared {
            Declared::Fresh(_) => WaitOutcome::Delayed(Duration::ZERO),
            Declared::AlreadyDeclared => WaitOutcome::Skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// 按顺序返回预设的交易状态，用完后重复最后一个
    async fn spawn_rpc(statuses: Vec<Value>) -> String {
        let state = Arc::new((statuses, AtomicUsize::new(0)));
        let app = Router::new()
            .route(
                "/",
                post(
                    |State(state): State<Arc<(Vec<Value>, AtomicUsize)>>| async move {
                        let n = state.1.fetch_add(1, Ordering::SeqCst);
                        let body = state.0[n.min(state.0.len() - 1)].clone();
                        Json(match body.get("error") {
                            Some(error) => json!({"jsonrpc": "2.0", "id": 1, "error": error}),
                            None => json!({"jsonrpc": "2.0", "id": 1, "result": body}),
                        })
                    },
                ),
            )
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn fresh(tx_hash: &str) -> Declared {
        Declared::Fresh(Some(tx_hash.to_string()))
    }

    fn fast_config(timeout: Duration) -> FinalityConfig {
        FinalityConfig {
            fixed_delay: Duration::ZERO,
            poll_interval: Duration::from_millis(10),
            max_poll_interval: Duration::from_millis(40),
            timeout,
        }
    }

    #[tokio::test]
    async fn test_poller_waits_until_accepted() {
        let url = spawn_rpc(vec![
            json!({"error": {"code": 29, "message": "Transaction hash not found"}}),
            json!({"finality_status": "RECEIVED"}),
            json!({"finality_status": "ACCEPTED_ON_L2", "execution_status": "SUCCEEDED"}),
        ])
        .await;
        let poller = RpcPoller::new(StarknetRpcClient::new(url), fast_config(Duration::from_secs(5)));

        let outcome = poller.wait(&fresh("0xabc"), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, WaitOutcome::Accepted { polls: 3 });
    }

    #[tokio::test]
    async fn test_poller_reports_rejection() {
        let url = spawn_rpc(vec![json!({"finality_status": "REJECTED"})]).await;
        let poller = RpcPoller::new(StarknetRpcClient::new(url), fast_config(Duration::from_secs(5)));

        let err = poller.wait(&fresh("0xabc"), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, FinalityError::Rejected { ref status, .. } if status == "rejected"));
    }

    #[tokio::test]
    async fn test_poller_times_out() {
        let url = spawn_rpc(vec![json!({"finality_status": "RECEIVED"})]).await;
        let poller =
            RpcPoller::new(StarknetRpcClient::new(url), fast_config(Duration::from_millis(100)));

        let err = poller.wait(&fresh("0xabc"), &CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, FinalityError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_poller_skips_already_declared() {
        let poller = RpcPoller::new(
            StarknetRpcClient::new("http://127.0.0.1:9"),
            fast_config(Duration::from_secs(1)),
        );
        let outcome = poller
            .wait(&Declared::AlreadyDeclared, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_poller_falls_back_to_fixed_delay_without_tx_hash() {
        let config = FinalityConfig {
            fixed_delay: Duration::from_millis(5),
            ..fast_config(Duration::from_secs(1))
        };
        // Unreachable node: a poll attempt would time out instead of delaying
        let poller = RpcPoller::new(StarknetRpcClient::new("http://127.0.0.1:9"), config);

        let outcome = poller
            .wait(&Declared::Fresh(None), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Delayed(Duration::from_millis(5)));
    }

    #[tokio::test]
    async fn test_fixed_delay_is_cancellable() {
        let waiter = FixedDelay::new(Duration::from_secs(60));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = waiter.wait(&fresh("0xabc"), &cancel).await.unwrap_err();
        assert_eq!(err, FinalityError::Cancelled);
    }

    #[tokio::test]
    async fn test_fixed_delay_skips_already_declared() {
        let waiter = FixedDelay::new(Duration::from_secs(60));
        let outcome = waiter
            .wait(&Declared::AlreadyDeclared, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, WaitOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_fixed_delay_elapses() {
        let waiter = FixedDelay::new(Duration::from_millis(5));
        let outcome = waiter.wait(&Declared::Fresh(None), &CancellationToken::new()).await.unwrap();
        assert_eq!(outcome, WaitOutcome::Delayed(Duration::from_millis(5)));
    }
}
