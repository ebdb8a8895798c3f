//! 命令执行器
//!
//! 提供统一的外部命令执行接口：
//! - 参数列表调用（不经过 shell）
//! - 完整捕获 stdout/stderr
//! - 非零退出码不视为错误，由调用方解释
//! - 可选超时

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::domain::ProcessResult;

/// 命令执行错误
#[derive(Debug, Error)]
pub enum CommandError {
    /// 命令启动失败（通常是工具未安装）
    #[error("Failed to spawn command: {0}")]
    SpawnFailed(#[source] std::io::Error),
    /// 命令超时
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),
    /// 等待命令完成失败
    #[error("Failed to wait for command: {0}")]
    WaitFailed(#[source] std::io::Error),
}

/// 一次外部命令调用
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub work_dir: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, work_dir: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            work_dir: work_dir.as_ref().to_path_buf(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// 用于日志的命令行展示
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 外部进程执行接口
///
/// 流水线通过此 trait 调用 scarb/sncast，测试中可替换为脚本化实现
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessResult, CommandError>;
}

/// 基于 tokio::process 的命令执行器
#[derive(Clone, Debug, Default)]
pub struct CommandRunner {
    timeout: Option<Duration>,
}

impl CommandRunner {
    /// 创建执行器
    ///
    /// `timeout` 为 None 时不限制执行时间
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessResult, CommandError> {
        info!(
            command = %invocation.display(),
            work_dir = %invocation.work_dir.display(),
            "Running command"
        );

        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(CommandError::SpawnFailed)?;

        let output = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result.map_err(CommandError::WaitFailed)?,
                Err(_) => {
                    // child 已被 drop，kill_on_drop 负责终止进程
                    error!(command = %invocation.display(), "Command timed out after {:?}", timeout);
                    return Err(CommandError::Timeout(timeout));
                }
            },
            None => child
                .wait_with_output()
                .await
                .map_err(CommandError::WaitFailed)?,
        };

        let result = ProcessResult::new(
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );

        info!(
            program = %invocation.program,
            exit_code = result.exit_code,
            "Command finished"
        );
        if !result.stdout.is_empty() {
            debug!(program = %invocation.program, "STDOUT:\n{}", result.stdout);
        }
        if !result.stderr.is_empty() {
            debug!(program = %invocation.program, "STDERR:\n{}", result.stderr);
        }

        Ok(result)
    }
}
