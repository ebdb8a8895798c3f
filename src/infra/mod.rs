//! 基础设施模块
//!
//! 封装外部依赖（命令执行、Starknet RPC、文本生成 HTTP client）

pub mod command;
pub mod llm;
pub mod starknet_rpc;

pub use command::{CommandError, CommandRunner, Invocation, ProcessRunner};
pub use llm::{ChatCompletionClient, LlmError};
pub use starknet_rpc::{RpcError, StarknetRpcClient, TransactionStatus};
