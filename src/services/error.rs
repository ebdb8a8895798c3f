//! 流水线错误定义
//!
//! 每个变体都会终止当前请求。阶段失败保留工具输出，由 HTTP 层原样返回。

use thiserror::Error;

use crate::domain::{ProcessResult, ValidationError};
use crate::infra::CommandError;

use super::deploy::finality::FinalityError;
use super::deploy::template::TemplateError;
use super::deploy::workspace::WorkspaceError;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("scarb build failed")]
    Build(ProcessResult),

    #[error("declare failed")]
    Declare(ProcessResult),

    #[error("declare transaction not finalized")]
    Finality(#[source] FinalityError),

    #[error("deploy failed")]
    Deploy(ProcessResult),

    #[error("{message}")]
    Parse {
        message: &'static str,
        output: ProcessResult,
    },

    #[error("missing signing credentials")]
    Credential(String),

    #[error("mint failed")]
    Remote(String),

    #[error("workspace preparation failed")]
    Workspace(#[source] WorkspaceError),

    #[error("pipeline cancelled")]
    Cancelled,
}

impl PipelineError {
    /// 工具无法启动时的阶段错误
    ///
    /// I/O 错误信息放进 `stderr`，与普通的工具失败一致。
    pub fn from_command(
        stage: fn(ProcessResult) -> PipelineError,
        err: CommandError,
    ) -> PipelineError {
        stage(ProcessResult::new(-1, "", err.to_string()))
    }

    /// 客户端错误，对应 400
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::Validation(_) | PipelineError::Credential(_)
        )
    }

    /// 失败阶段运行过工具时返回其输出
    pub fn output(&self) -> Option<&ProcessResult> {
        match self {
            PipelineError::Build(output)
            | PipelineError::Declare(output)
            | PipelineError::Deploy(output)
            | PipelineError::Parse { output, .. } => Some(output),
            _ => None,
        }
    }

    /// 错误标题之外的详细信息
    pub fn detail(&self) -> Option<String> {
        match self {
            PipelineError::Finality(e) => Some(e.to_string()),
            PipelineError::Workspace(e) => Some(e.to_string()),
            PipelineError::Credential(detail) | PipelineError::Remote(detail) => {
                Some(detail.clone())
            }
            _ => None,
        }
    }
}

impl From<FinalityError> for PipelineError {
    fn from(err: FinalityError) -> Self {
        match err {
            FinalityError::Cancelled => PipelineError::Cancelled,
            other => PipelineError::Finality(other),
        }
    }
}

impl From<WorkspaceError> for PipelineError {
    fn from(err: WorkspaceError) -> Self {
        PipelineError::Workspace(err)
    }
}
