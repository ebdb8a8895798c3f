//! 领域模型模块
//!
//! 纯数据结构，不依赖 axum/tokio

pub mod deploy;
pub mod request;

// Re-exports for convenience
pub use deploy::{
    ContractKind, DeployResult, DeployStage, DeployedParams, ProcessResult, StageStatus,
};
pub use request::{
    BuildParams, DeployRequest, MintParams, NftParams, SourceParams, TokenParams, ValidationError,
};
