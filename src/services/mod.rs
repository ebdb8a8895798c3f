//! 服务层模块
//!
//! 部署流水线、铸造和源码生成

pub mod deploy;
pub mod error;
pub mod generation;
pub mod mint;

pub use deploy::DeployPipeline;
pub use error::PipelineError;
pub use generation::{
    generate_or_fallback, BuildOutcome, GeneratedContract, GenerationError, LlmSourceGenerator,
    SourceGenerator,
};
pub use mint::{NftMinter, StarknetMinter};
