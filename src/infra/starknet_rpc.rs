//! Starknet JSON-RPC 客户端
//!
//! 仅封装交易状态查询，用于 declare 之后的确认等待和 /tx-status 端点

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// JSON-RPC 错误码：交易哈希不存在
const TXN_HASH_NOT_FOUND: i64 = 29;

/// RPC 调用错误
#[derive(Debug, Error)]
pub enum RpcError {
    /// 网络错误
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    /// 节点返回 JSON-RPC 错误
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    /// 响应既无 result 也无 error
    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
}

/// 交易状态
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatus {
    pub finality_status: String,
    #[serde(default)]
    pub execution_status: Option<String>,
}

impl TransactionStatus {
    /// 节点尚未见到该交易
    pub fn not_found() -> Self {
        Self {
            finality_status: "NOT_RECEIVED".to_string(),
            execution_status: None,
        }
    }

    /// 已被 L2 或 L1 接受且执行成功
    pub fn is_accepted(&self) -> bool {
        matches!(
            self.finality_status.as_str(),
            "ACCEPTED_ON_L2" | "ACCEPTED_ON_L1"
        ) && !self.is_reverted()
    }

    pub fn is_reverted(&self) -> bool {
        self.execution_status.as_deref() == Some("REVERTED")
    }

    /// 终态失败：被拒绝或执行回滚
    pub fn is_failed(&self) -> bool {
        self.finality_status == "REJECTED" || self.is_reverted()
    }

    /// 简化的状态标签
    pub fn label(&self) -> &'static str {
        if self.is_reverted() {
            "reverted"
        } else if self.finality_status == "REJECTED" {
            "rejected"
        } else if self.is_accepted() {
            "accepted"
        } else if self.finality_status == "NOT_RECEIVED" {
            "not_found"
        } else {
            "pending"
        }
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: TxHashParams<'a>,
}

#[derive(Serialize)]
struct TxHashParams<'a> {
    transaction_hash: &'a str,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<TransactionStatus>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Starknet RPC 客户端，复用连接池
#[derive(Clone)]
pub struct StarknetRpcClient {
    client: Client,
    rpc_url: String,
}

impl StarknetRpcClient {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .pool_max_idle_per_host(2)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            rpc_url: rpc_url.into(),
        }
    }

    /// 查询交易状态
    ///
    /// 节点返回 TXN_HASH_NOT_FOUND 时视为尚未接收，而不是错误
    pub async fn transaction_status(&self, tx_hash: &str) -> Result<TransactionStatus, RpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "starknet_getTransactionStatus",
            params: TxHashParams {
                transaction_hash: tx_hash,
            },
        };

        let response: RpcResponse = self
            .client
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        match (response.result, response.error) {
            (Some(status), _) => {
                debug!(
                    tx_hash = %tx_hash,
                    finality_status = %status.finality_status,
                    execution_status = ?status.execution_status,
                    "Fetched transaction status"
                );
                Ok(status)
            }
            (None, Some(err)) if err.code == TXN_HASH_NOT_FOUND => Ok(TransactionStatus::not_found()),
            (None, Some(err)) => Err(RpcError::Rpc {
                code: err.code,
                message: err.message,
            }),
            (None, None) => Err(RpcError::InvalidResponse(
                "missing both result and error".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(finality: &str, execution: Option<&str>) -> TransactionStatus {
        TransactionStatus {
            finality_status: finality.to_string(),
            execution_status: execution.map(str::to_string),
        }
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(status("RECEIVED", None).label(), "pending");
        assert_eq!(status("ACCEPTED_ON_L2", Some("SUCCEEDED")).label(), "accepted");
        assert_eq!(status("ACCEPTED_ON_L1", Some("SUCCEEDED")).label(), "accepted");
        assert_eq!(status("ACCEPTED_ON_L2", Some("REVERTED")).label(), "reverted");
        assert_eq!(status("REJECTED", None).label(), "rejected");
        assert_eq!(TransactionStatus::not_found().label(), "not_found");
    }

    #[test]
    fn test_reverted_is_failed_not_accepted() {
        let reverted = status("ACCEPTED_ON_L2", Some("REVERTED"));
        assert!(reverted.is_failed());
        assert!(!reverted.is_accepted());
    }

    #[test]
    fn test_status_deserializes_without_execution_status() {
        let parsed: TransactionStatus =
            serde_json::from_str(r#"{"finality_status":"RECEIVED"}"#).unwrap();
        assert_eq!(parsed.execution_status, None);
    }

    #[test]
    fn test_request_shape() {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "starknet_getTransactionStatus",
            params: TxHashParams {
                transaction_hash: "0xabc",
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["params"]["transaction_hash"], "0xabc");
        assert_eq!(json["method"], "starknet_getTransactionStatus");
    }
}
