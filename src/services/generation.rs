//! 合约源码生成
//!
//! 向 chat-completions 模型请求一个 Cairo Starknet 合约。未配置生成服务或回答不可用时，
//! 改为部署内置的计数器合约，并在响应中说明原因。

use async_trait::async_trait;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;
use tracing::{info, warn};

use super::deploy::DeployPipeline;
use super::error::PipelineError;
use crate::config::env::constants::MAX_GENERATED_SOURCE_BYTES;
use crate::domain::request::detect_contract_name;
use crate::domain::{BuildParams, DeployRequest, DeployResult};
use crate::infra::{ChatCompletionClient, LlmError};

const DEFAULT_CONTRACT_NAME: &str = "GeneratedContract";

const SYSTEM_PROMPT: &str = "You write Cairo 1 smart contracts for Starknet. \
Reply with exactly one contract: a single `#[starknet::contract]` module with its storage, \
constructor, and an `#[abi(embed_v0)]` impl of its interface. \
Use only the Starknet core library. Do not add explanations.";

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("text generation is not configured")]
    NotConfigured,
    #[error("text generation request failed: {0}")]
    Provider(#[from] LlmError),
    #[error("generated source is not a Starknet contract: {0}")]
    Invalid(&'static str),
    #[error("generated source exceeds {0} bytes")]
    TooLarge(usize),
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedContract {
    pub contract_name: String,
    pub contract_code: String,
}

#[async_trait]
pub trait SourceGenerator: Send + Sync {
    async fn generate(&self, params: &BuildParams) -> Result<GeneratedContract, GenerationError>;
}

pub struct LlmSourceGenerator {
    client: ChatCompletionClient,
}

impl LlmSourceGenerator {
    pub fn new(client: ChatCompletionClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SourceGenerator for LlmSourceGenerator {
    async fn generate(&self, params: &BuildParams) -> Result<GeneratedContract, GenerationError> {
        let prompt = match &params.contract_name {
            Some(name) => format!(
                "{}\n\nName the contract module `{}`.",
                params.instructions, name
            ),
            None => params.instructions.clone(),
        };

        let completion = self.client.complete(SYSTEM_PROMPT, &prompt).await?;
        let code = strip_fences(&completion);
        validate_source(&code)?;

        let contract_name = params
            .contract_name
            .clone()
            .or_else(|| detect_contract_name(&code))
            .unwrap_or_else(|| DEFAULT_CONTRACT_NAME.to_string());

        info!(
            model = %self.client.model(),
            contract = %contract_name,
            bytes = code.len(),
            "Generated contract source"
        );
        Ok(GeneratedContract {
            contract_name,
            contract_code: code,
        })
    }
}

/// `/build-contract` 的结果
#[derive(Debug)]
pub enum BuildOutcome {
    Generated(GeneratedContract),
    Fallback {
        reason: String,
        result: DeployResult,
    },
}

/// 生成源码；生成不可用时部署内置合约
pub async fn generate_or_fallback(
    generator: Option<&dyn SourceGenerator>,
    pipeline: &DeployPipeline,
    params: &BuildParams,
) -> Result<BuildOutcome, PipelineError> {
    let failure = match generator {
        Some(generator) => match generator.generate(params).await {
            Ok(generated) => return Ok(BuildOutcome::Generated(generated)),
            Err(e) => e,
        },
        None => GenerationError::NotConfigured,
    };

    warn!(reason = %failure, "Source generation unavailable, deploying bundled contract");
    let result = pipeline.run(&DeployRequest::Fallback).await?;
    Ok(BuildOutcome::Fallback {
        reason: failure.to_string(),
        result,
    })
}

/// 取回答中的第一个代码块，没有代码块时取整个回答
fn strip_fences(reply: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| {
        Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```").expect("fence pattern is valid")
    });

    match fence.captures(reply).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim().to_string(),
        None => reply.trim().to_string(),
    }
}

fn validate_source(code: &str) -> Result<(), GenerationError> {
    static MODULE: OnceLock<Regex> = OnceLock::new();
    let module =
        MODULE.get_or_init(|| Regex::new(r"\bmod\s+[A-Za-z_]").expect("module pattern is valid"));

    if code.len() > MAX_GENERATED_SOURCE_BYTES {
        return Err(GenerationError::TooLarge(MAX_GENERATED_SOURCE_BYTES));
    }
    if !code.contains("#[starknet::contract]") {
        return Err(GenerationError::Invalid("missing #[starknet::contract]"));
    }
    if !module.is_match(code) {
        return Err(GenerationError::Invalid("missing module declaration"));
    }
    Ok(())
}
