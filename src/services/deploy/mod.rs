//! 部署流水线
//!
//! 每个请求按固定顺序执行：工作区 → 模板 → 构建 → declare → 等待确认 → deploy。
//! 任一阶段失败即终止，并附带工具的输出。

pub mod extract;
pub mod finality;
pub mod template;
pub mod workspace;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::env::constants::ALREADY_DECLARED_MARKER;
use crate::config::{ContractProject, EnvConfig, NetworkConfig, ToolConfig};
use crate::domain::{DeployRequest, DeployResult, DeployStage, DeployedParams, ProcessResult};
use crate::infra::{CommandRunner, Invocation, ProcessRunner, StarknetRpcClient};

use super::error::PipelineError;
use extract::{extract_identifier, Fallback, IdentifierField};
use finality::{Declared, FinalityWaiter, FixedDelay, RpcPoller, WaitOutcome};
use template::SourceTemplate;
use workspace::Workspace;

const STAGE_TEMPLATE: &str = "template";
const STAGE_BUILD: &str = "build";
const STAGE_DECLARE: &str = "declare";
const STAGE_WAIT: &str = "wait_finality";
const STAGE_DEPLOY: &str = "deploy";

const STAGES: &[(&str, &str)] = &[
    (STAGE_TEMPLATE, "Render Source"),
    (STAGE_BUILD, "Scarb Build"),
    (STAGE_DECLARE, "Declare Class"),
    (STAGE_WAIT, "Wait For Declare"),
    (STAGE_DEPLOY, "Deploy Contract"),
];

pub struct DeployPipeline {
    runner: Arc<dyn ProcessRunner>,
    tools: ToolConfig,
    network: NetworkConfig,
    contracts_dir: PathBuf,
    waiter: Arc<dyn FinalityWaiter>,
    permits: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl DeployPipeline {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        tools: ToolConfig,
        network: NetworkConfig,
        contracts_dir: PathBuf,
        waiter: Arc<dyn FinalityWaiter>,
        max_concurrent: usize,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            runner,
            tools,
            network,
            contracts_dir,
            waiter,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            cancel,
        }
    }

    /// 根据配置组装真实的进程执行器和确认等待器
    pub fn from_config(config: &EnvConfig, cancel: CancellationToken) -> Self {
        let runner = Arc::new(CommandRunner::new(config.tools.command_timeout));
        let waiter: Arc<dyn FinalityWaiter> = match &config.network.rpc_url {
            Some(url) => Arc::new(RpcPoller::new(
                StarknetRpcClient::new(url.clone()),
                config.finality.clone(),
            )),
            None => Arc::new(FixedDelay::new(config.finality.fixed_delay)),
        };

        Self::new(
            runner,
            config.tools.clone(),
            config.network.clone(),
            config.contracts_dir.clone(),
            waiter,
            config.max_concurrent_pipelines,
            cancel,
        )
    }

    /// 执行一次已校验的部署请求
    pub async fn run(&self, request: &DeployRequest) -> Result<DeployResult, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("pipeline", run_id = %run_id, kind = request.kind().as_str());
        self.run_stages(run_id, request).instrument(span).await
    }

    async fn run_stages(
        &self,
        run_id: String,
        request: &DeployRequest,
    ) -> Result<DeployResult, PipelineError> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| PipelineError::Cancelled)?;

        let project = ContractProject::for_kind(request.kind());
        let contract_name = contract_name(&project, request);
        let mut stages = StageLog::new();

        info!(contract = %contract_name, project = project.dir_name, "Pipeline started");
        let workspace = Workspace::prepare(&project.template_dir(&self.contracts_dir)).await?;

        // Template
        stages.start(STAGE_TEMPLATE);
        match self.render_source(&workspace, &project, request).await {
            Ok(Some(message)) => stages.finish(STAGE_TEMPLATE, Some(message)),
            Ok(None) => stages.skip(STAGE_TEMPLATE, "bundled contract"),
            Err(e) => return Err(stages.fail(STAGE_TEMPLATE, e)),
        }

        // Build
        stages.start(STAGE_BUILD);
        let build = Invocation::new(&self.tools.scarb_path, workspace.path()).arg("build");
        let output = self
            .runner
            .run(&build)
            .await
            .map_err(|e| PipelineError::from_command(PipelineError::Build, e))
            .and_then(|output| check_exit(output, PipelineError::Build));
        if let Err(e) = output {
            return Err(stages.fail(STAGE_BUILD, e));
        }
        stages.finish(STAGE_BUILD, None);

        // Declare
        stages.start(STAGE_DECLARE);
        let (class_hash, declared) = match self.declare(&workspace, &contract_name).await {
            Ok(declared) => declared,
            Err(e) => return Err(stages.fail(STAGE_DECLARE, e)),
        };
        stages.finish(STAGE_DECLARE, Some(format!("class hash {}", class_hash)));
        info!(class_hash = %class_hash, declared = ?declared, "Class declared");

        // Wait for the declare to settle
        stages.start(STAGE_WAIT);
        match self.waiter.wait(&declared, &self.cancel).await {
            Ok(WaitOutcome::Skipped) => {
                stages.skip(STAGE_WAIT, WaitOutcome::Skipped.describe());
            }
            Ok(outcome) => stages.finish(STAGE_WAIT, Some(outcome.describe())),
            Err(e) => return Err(stages.fail(STAGE_WAIT, e.into())),
        }

        // Deploy
        stages.start(STAGE_DEPLOY);
        let (contract_address, transaction_hash) =
            match self.deploy(&workspace, &class_hash).await {
                Ok(deployed) => deployed,
                Err(e) => return Err(stages.fail(STAGE_DEPLOY, e)),
            };
        stages.finish(STAGE_DEPLOY, Some(format!("address {}", contract_address)));

        let transaction_url = self.network.transaction_url(&transaction_hash);
        info!(
            class_hash = %class_hash,
            contract_address = %contract_address,
            transaction_hash = %transaction_hash,
            "Pipeline finished"
        );

        Ok(DeployResult {
            run_id,
            params: deployed_params(request, &contract_name),
            class_hash,
            contract_address,
            transaction_hash,
            transaction_url,
            stages: stages.into_inner(),
        })
    }

    /// 返回阶段消息；直接使用内置源码时返回 None
    async fn render_source(
        &self,
        workspace: &Workspace,
        project: &ContractProject,
        request: &DeployRequest,
    ) -> Result<Option<String>, PipelineError> {
        let source_path = workspace.join(project.source_path);
        match request {
            DeployRequest::Token(params) => {
                let values = [
                    ("name", params.name.clone()),
                    ("symbol", params.symbol.clone()),
                    ("max_supply", params.max_token.to_string()),
                    ("decimals", params.decimals.to_string()),
                ];
                SourceTemplate::token().render_file(&source_path, &values).await?;
                Ok(Some("token slots rendered".to_string()))
            }
            DeployRequest::NftCollection(params) => {
                let values = [
                    ("name", params.name.clone()),
                    ("symbol", params.symbol.clone()),
                    ("base_uri", params.base_uri.clone()),
                ];
                SourceTemplate::nft().render_file(&source_path, &values).await?;
                Ok(Some("collection slots rendered".to_string()))
            }
            DeployRequest::RawSource(params) => {
                workspace.write_source(project.source_path, &params.code).await?;
                Ok(Some(format!("wrote {} bytes of source", params.code.len())))
            }
            DeployRequest::Fallback => Ok(None),
        }
    }

    fn sncast(&self, workspace: &Workspace) -> Invocation {
        let invocation = Invocation::new(&self.tools.sncast_path, workspace.path())
            .args(["--account", self.tools.account.as_str()]);
        if self.tools.json_output {
            invocation.arg("--json")
        } else {
            invocation
        }
    }

    /// 声明合约类，返回类哈希和 declare 结果
    async fn declare(
        &self,
        workspace: &Workspace,
        contract_name: &str,
    ) -> Result<(String, Declared), PipelineError> {
        let invocation = self
            .sncast(workspace)
            .args(["declare", "--contract-name", contract_name])
            .args(self.network.sncast_args());

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| PipelineError::from_command(PipelineError::Declare, e))?;
        let combined = output.combined_output();

        let already_declared = !output.success()
            && combined.to_lowercase().contains(ALREADY_DECLARED_MARKER);
        if !output.success() && !already_declared {
            return Err(PipelineError::Declare(output));
        }
        if already_declared {
            warn!(contract = %contract_name, "Class already declared, reusing existing class hash");
        }

        let Some(class_hash) =
            extract_identifier(&combined, IdentifierField::ClassHash, Fallback::LastHexToken)
        else {
            return Err(PipelineError::Parse {
                message: "could not determine class hash from declare output",
                output,
            });
        };

        let declared = if already_declared {
            Declared::AlreadyDeclared
        } else {
            Declared::Fresh(extract_identifier(
                &combined,
                IdentifierField::TransactionHash,
                Fallback::None,
            ))
        };
        Ok((class_hash, declared))
    }

    /// 部署合约实例，返回合约地址和交易哈希
    async fn deploy(
        &self,
        workspace: &Workspace,
        class_hash: &str,
    ) -> Result<(String, String), PipelineError> {
        let mut invocation = self
            .sncast(workspace)
            .args(["deploy", "--class-hash", class_hash]);
        if let Some(salt) = &self.tools.deploy_salt {
            invocation = invocation.args(["--salt", salt.as_str()]);
        }
        let invocation = invocation.args(self.network.sncast_args());

        let output = self
            .runner
            .run(&invocation)
            .await
            .map_err(|e| PipelineError::from_command(PipelineError::Deploy, e))
            .and_then(|output| check_exit(output, PipelineError::Deploy))?;

        let address =
            extract_identifier(&output.stdout, IdentifierField::ContractAddress, Fallback::None);
        let tx_hash =
            extract_identifier(&output.stdout, IdentifierField::TransactionHash, Fallback::None);
        match (address, tx_hash) {
            (Some(address), Some(tx_hash)) => Ok((address, tx_hash)),
            _ => Err(PipelineError::Parse {
                message: "could not parse deploy output",
                output,
            }),
        }
    }
}

fn check_exit(
    output: ProcessResult,
    stage: fn(ProcessResult) -> PipelineError,
) -> Result<ProcessResult, PipelineError> {
    if output.success() {
        Ok(output)
    } else {
        Err(stage(output))
    }
}

fn contract_name(project: &ContractProject, request: &DeployRequest) -> String {
    match (request, project.contract_name) {
        (DeployRequest::RawSource(params), _) => params.contract_name.clone(),
        (_, Some(name)) => name.to_string(),
        (_, None) => String::new(),
    }
}

fn deployed_params(request: &DeployRequest, contract_name: &str) -> DeployedParams {
    match request {
        DeployRequest::Token(params) => DeployedParams::Token {
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            max_token: params.max_token,
            decimals: params.decimals,
        },
        DeployRequest::NftCollection(params) => DeployedParams::Nft {
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            base_uri: params.base_uri.clone(),
        },
        DeployRequest::RawSource(_) | DeployRequest::Fallback => DeployedParams::Source {
            contract_name: contract_name.to_string(),
        },
    }
}

/// 单次运行的阶段记录
struct StageLog {
    stages: Vec<DeployStage>,
}

impl StageLog {
    fn new() -> Self {
        Self {
            stages: STAGES
                .iter()
                .map(|(name, display)| DeployStage::new(name, display))
                .collect(),
        }
    }

    fn get(&mut self, name: &str) -> Option<&mut DeployStage> {
        self.stages.iter_mut().find(|stage| stage.name == name)
    }

    fn start(&mut self, name: &str) {
        info!(stage = name, "Stage started");
        if let Some(stage) = self.get(name) {
            stage.start();
        }
    }

    fn finish(&mut self, name: &str, message: Option<String>) {
        if let Some(stage) = self.get(name) {
            stage.finish(true, message);
            info!(stage = name, duration_ms = ?stage.duration_ms, "Stage finished");
        }
    }

    fn skip(&mut self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        info!(stage = name, reason = %reason, "Stage skipped");
        if let Some(stage) = self.get(name) {
            stage.skip(Some(reason));
        }
    }

    /// 记录失败并原样返回错误
    fn fail(&mut self, name: &str, err: PipelineError) -> PipelineError {
        let exit_code = err.output().map(|output| output.exit_code);
        error!(stage = name, exit_code = ?exit_code, error = %err, "Stage failed");
        if let Some(stage) = self.get(name) {
            stage.finish(false, Some(err.to_string()));
        }
        err
    }

    fn into_inner(self) -> Vec<DeployStage> {
        self.stages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{SourceParams, StageStatus, TokenParams};
    use template::TemplateError;
    use crate::infra::command::mock::ScriptedRunner;
    use async_trait::async_trait;
    use finality::{FinalityError, NoWait};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    const TOKEN_SOURCE: &str = r#"#[starknet::contract]
mod MyToken {
    #[constructor]
    fn constructor(ref self: ContractState, recipient: ContractAddress) {
        let name: ByteArray = "MyToken";
        let symbol: ByteArray = "MTK";
        let max_supply: u256 = 1000000;
        let decimals: u8 = 18;
    }
}
"#;

    /// 拒绝所有 declare 交易
    struct RejectingWaiter;

    #[async_trait]
    impl FinalityWaiter for RejectingWaiter {
        async fn wait(
            &self,
            _declared: &Declared,
            _cancel: &CancellationToken,
        ) -> Result<WaitOutcome, FinalityError> {
            Err(FinalityError::Rejected {
                tx_hash: "0x9".to_string(),
                status: "reverted".to_string(),
            })
        }
    }

    fn contracts_dir() -> TempDir {
        contracts_dir_with_token(TOKEN_SOURCE)
    }

    fn contracts_dir_with_token(token_source: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (project, source) in [
            ("token-contract", token_source),
            ("custom-contract", "// replaced per request\n"),
        ] {
            let root = dir.path().join(project);
            std::fs::create_dir_all(root.join("src")).unwrap();
            std::fs::write(root.join("Scarb.toml"), "[package]\nname = \"c\"\n").unwrap();
            std::fs::write(root.join("src/lib.cairo"), source).unwrap();
        }
        dir
    }

    fn pipeline(runner: Arc<ScriptedRunner>, contracts: &Path, tools: ToolConfig) -> DeployPipeline {
        pipeline_with_waiter(runner, contracts, tools, Arc::new(NoWait))
    }

    fn pipeline_with_waiter(
        runner: Arc<ScriptedRunner>,
        contracts: &Path,
        tools: ToolConfig,
        waiter: Arc<dyn FinalityWaiter>,
    ) -> DeployPipeline {
        DeployPipeline::new(
            runner,
            tools,
            NetworkConfig::default(),
            contracts.to_path_buf(),
            waiter,
            1,
            CancellationToken::new(),
        )
    }

    fn token_request() -> DeployRequest {
        DeployRequest::Token(TokenParams {
            name: "Coin".to_string(),
            symbol: "CN".to_string(),
            max_token: 1000,
            decimals: 18,
        })
    }

    #[tokio::test]
    async fn test_token_pipeline_success() {
        let contracts = contracts_dir();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_output(0, "Compiling MyToken\nFinished", "")
                .then_output(0, "Class Hash: 0x1\nTransaction Hash: 0x9", "")
                .then_output(0, "Contract Address: 0x2\nTransaction Hash: 0x3", ""),
        );
        let result = pipeline(runner.clone(), contracts.path(), ToolConfig::default())
            .run(&token_request())
            .await
            .unwrap();

        assert_eq!(result.class_hash, "0x1");
        assert_eq!(result.contract_address, "0x2");
        assert_eq!(result.transaction_hash, "0x3");
        assert!(result.transaction_url.ends_with("/tx/0x3"));
        assert_eq!(
            result.params,
            DeployedParams::Token {
                name: "Coin".to_string(),
                symbol: "CN".to_string(),
                max_token: 1000,
                decimals: 18,
            }
        );
        assert!(result
            .stages
            .iter()
            .all(|stage| stage.status == StageStatus::Success));

        let calls = runner.calls();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0].display(), "scarb build");
        assert_eq!(
            calls[1].display(),
            "sncast --account sepolia declare --contract-name MyToken --network sepolia"
        );
        assert_eq!(
            calls[2].display(),
            "sncast --account sepolia deploy --class-hash 0x1 --network sepolia"
        );

        // The project template itself is never edited
        let template =
            std::fs::read_to_string(contracts.path().join("token-contract/src/lib.cairo")).unwrap();
        assert_eq!(template, TOKEN_SOURCE);
    }

    #[tokio::test]
    async fn test_build_failure_stops_pipeline() {
        let contracts = contracts_dir();
        let runner = Arc::new(ScriptedRunner::new().then_output(1, "", "error: x"));
        let err = pipeline(runner.clone(), contracts.path(), ToolConfig::default())
            .run(&token_request())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "scarb build failed");
        assert_eq!(err.output().unwrap().stderr, "error: x");
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_scarb_is_build_failure() {
        let contracts = contracts_dir();
        let runner = Arc::new(ScriptedRunner::new().then_spawn_failure("scarb: not found"));
        let err = pipeline(runner, contracts.path(), ToolConfig::default())
            .run(&token_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Build(_)));
        assert!(err.output().unwrap().stderr.contains("scarb: not found"));
    }

    #[tokio::test]
    async fn test_already_declared_recovers_class_hash_and_skips_wait() {
        let contracts = contracts_dir();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_output(0, "", "")
                .then_output(
                    1,
                    "",
                    "Error: Class with hash 0x04ab12cd34ef56 is already declared.",
                )
                .then_output(0, "Contract Address: 0x2\nTransaction Hash: 0x3", ""),
        );
        let result = pipeline(runner, contracts.path(), ToolConfig::default())
            .run(&token_request())
            .await
            .unwrap();

        assert_eq!(result.class_hash, "0x04ab12cd34ef56");
        let wait = result.stages.iter().find(|s| s.name == STAGE_WAIT).unwrap();
        assert_eq!(wait.status, StageStatus::Skipped);
    }

    #[tokio::test]
    async fn test_declare_without_tx_hash_still_waits() {
        let contracts = contracts_dir();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_output(0, "", "")
                .then_output(0, "Class Hash: 0x1", "")
                .then_output(0, "Contract Address: 0x2\nTransaction Hash: 0x3", ""),
        );
        let waiter = Arc::new(FixedDelay::new(Duration::from_millis(5)));
        let result = pipeline_with_waiter(runner, contracts.path(), ToolConfig::default(), waiter)
            .run(&token_request())
            .await
            .unwrap();

        let wait = result.stages.iter().find(|s| s.name == STAGE_WAIT).unwrap();
        assert_eq!(wait.status, StageStatus::Success);
        assert_eq!(wait.message.as_deref(), Some("waited fixed 0s"));
    }

    #[tokio::test]
    async fn test_declare_failure() {
        let contracts = contracts_dir();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_output(0, "", "")
                .then_output(2, "", "Error: account not found"),
        );
        let err = pipeline(runner, contracts.path(), ToolConfig::default())
            .run(&token_request())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "declare failed");
        assert_eq!(err.output().unwrap().exit_code, 2);
    }

    #[tokio::test]
    async fn test_declare_without_class_hash_is_parse_error() {
        let contracts = contracts_dir();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_output(0, "", "")
                .then_output(0, "declared, probably", ""),
        );
        let err = pipeline(runner, contracts.path(), ToolConfig::default())
            .run(&token_request())
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "could not determine class hash from declare output"
        );
    }

    #[tokio::test]
    async fn test_rejected_declare_stops_before_deploy() {
        let contracts = contracts_dir();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_output(0, "", "")
                .then_output(0, "Class Hash: 0x1\nTransaction Hash: 0x9", ""),
        );
        let err = pipeline_with_waiter(
            runner.clone(),
            contracts.path(),
            ToolConfig::default(),
            Arc::new(RejectingWaiter),
        )
        .run(&token_request())
        .await
        .unwrap_err();

        assert!(matches!(err, PipelineError::Finality(_)));
        assert_eq!(
            err.detail().as_deref(),
            Some("declare transaction 0x9 was reverted")
        );
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_deploy_failure_keeps_output() {
        let contracts = contracts_dir();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_output(0, "", "")
                .then_output(0, "Class Hash: 0x1\nTransaction Hash: 0x9", "")
                .then_output(3, "", "Error: insufficient fee"),
        );
        let err = pipeline(runner.clone(), contracts.path(), ToolConfig::default())
            .run(&token_request())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "deploy failed");
        let output = err.output().unwrap();
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stderr, "Error: insufficient fee");
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_template_without_slots_never_builds() {
        let contracts = contracts_dir_with_token("#[starknet::contract]\nmod MyToken {}\n");
        let runner = Arc::new(ScriptedRunner::new());
        let err = pipeline(runner.clone(), contracts.path(), ToolConfig::default())
            .run(&token_request())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Template(TemplateError::Unchanged)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_deploy_output_without_address_is_parse_error() {
        let contracts = contracts_dir();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_output(0, "", "")
                .then_output(0, "Class Hash: 0x1", "")
                .then_output(0, "Transaction Hash: 0x3", "Contract Address: 0x2"),
        );
        let err = pipeline(runner, contracts.path(), ToolConfig::default())
            .run(&token_request())
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "could not parse deploy output");
    }

    #[tokio::test]
    async fn test_raw_source_uses_request_contract_name_and_options() {
        let contracts = contracts_dir();
        let runner = Arc::new(
            ScriptedRunner::new()
                .then_output(0, "", "")
                .then_output(
                    0,
                    r#"{"command":"declare","class_hash":"0xabc","transaction_hash":"0xdef"}"#,
                    "",
                )
                .then_output(
                    0,
                    r#"{"command":"deploy","contract_address":"0x22","transaction_hash":"0x33"}"#,
                    "",
                ),
        );
        let tools = ToolConfig {
            json_output: true,
            deploy_salt: Some("0x1".to_string()),
            ..ToolConfig::default()
        };
        let request = DeployRequest::RawSource(SourceParams {
            code: "#[starknet::contract]\nmod Vault {}\n".to_string(),
            contract_name: "Vault".to_string(),
        });

        let result = pipeline(runner.clone(), contracts.path(), tools)
            .run(&request)
            .await
            .unwrap();

        assert_eq!(result.contract_address, "0x22");
        assert_eq!(
            result.params,
            DeployedParams::Source {
                contract_name: "Vault".to_string()
            }
        );
        let calls = runner.calls();
        assert_eq!(
            calls[1].display(),
            "sncast --account sepolia --json declare --contract-name Vault --network sepolia"
        );
        assert_eq!(
            calls[2].display(),
            "sncast --account sepolia --json deploy --class-hash 0xabc --salt 0x1 --network sepolia"
        );
    }

    #[tokio::test]
    async fn test_missing_project_template() {
        let contracts = tempfile::tempdir().unwrap();
        let runner = Arc::new(ScriptedRunner::new());
        let err = pipeline(runner.clone(), contracts.path(), ToolConfig::default())
            .run(&DeployRequest::Fallback)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Workspace(_)));
        assert!(runner.calls().is_empty());
    }
}
