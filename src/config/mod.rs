//! 配置模块
//!
//! 环境变量解析与合约项目布局

pub mod contracts;
pub mod env;

pub use contracts::ContractProject;
pub use env::{
    EnvConfig, FinalityConfig, GenerationConfig, NetworkConfig, SigningCredentials, ToolConfig,
};
