//! 部署相关领域模型

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 合约类型
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Token,
    RawSource,
    NftCollection,
    /// 文本生成失败时部署的内置合约
    Fallback,
}

impl ContractKind {
    /// 转换为字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractKind::Token => "token",
            ContractKind::RawSource => "raw_source",
            ContractKind::NftCollection => "nft_collection",
            ContractKind::Fallback => "fallback",
        }
    }
}

/// 阶段状态
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Running,
    Success,
    Failed,
    Skipped,
}

/// 流水线阶段信息
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeployStage {
    /// 阶段标识 (e.g., "build", "declare", "deploy")
    pub name: String,
    /// 显示名称 (e.g., "Scarb Build")
    pub display_name: String,
    /// 开始时间
    pub started_at: Option<DateTime<Utc>>,
    /// 结束时间
    pub finished_at: Option<DateTime<Utc>>,
    /// 持续时间（毫秒）
    pub duration_ms: Option<i64>,
    /// 阶段状态
    pub status: StageStatus,
    /// 附加信息
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl DeployStage {
    /// 创建新的待执行阶段
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
            started_at: None,
            finished_at: None,
            duration_ms: None,
            status: StageStatus::Pending,
            message: None,
        }
    }

    /// 开始执行阶段
    pub fn start(&mut self) {
        self.started_at = Some(Utc::now());
        self.status = StageStatus::Running;
    }

    /// 完成阶段
    pub fn finish(&mut self, success: bool, message: Option<String>) {
        let now = Utc::now();
        self.finished_at = Some(now);
        self.status = if success {
            StageStatus::Success
        } else {
            StageStatus::Failed
        };
        self.message = message;
        if let Some(started) = self.started_at {
            self.duration_ms = Some((now - started).num_milliseconds());
        }
    }

    /// 跳过阶段
    pub fn skip(&mut self, reason: Option<String>) {
        self.status = StageStatus::Skipped;
        self.message = reason;
    }
}

/// 外部命令执行结果
///
/// 捕获后不可变，流水线每个阶段的错误都携带它
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProcessResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// 是否成功退出
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout + stderr 合并文本，用于标识符提取
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }
}

/// 回显的请求参数
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum DeployedParams {
    Token {
        name: String,
        symbol: String,
        max_token: u128,
        decimals: u8,
    },
    Nft {
        name: String,
        symbol: String,
        base_uri: String,
    },
    Source {
        contract_name: String,
    },
}

/// 部署结果
///
/// 仅在 declare 和 deploy 都解析出全部标识符后构造一次
#[derive(Clone, Debug, Serialize)]
pub struct DeployResult {
    pub run_id: String,
    #[serde(flatten)]
    pub params: DeployedParams,
    pub class_hash: String,
    pub contract_address: String,
    pub transaction_hash: String,
    pub transaction_url: String,
    pub stages: Vec<DeployStage>,
}
