//! 环境变量配置加载

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// 环境配置
#[derive(Clone, Debug)]
pub struct EnvConfig {
    /// 默认日志级别（RUST_LOG 未设置时使用）
    pub log_level: String,
    /// 监听地址
    pub bind_addr: String,
    /// 服务监听端口
    pub port: u16,
    /// 合约项目模板根目录
    pub contracts_dir: PathBuf,
    /// 外部工具配置
    pub tools: ToolConfig,
    /// 网络配置
    pub network: NetworkConfig,
    /// declare 确认等待配置
    pub finality: FinalityConfig,
    /// 铸造签名凭据（未配置时为 None）
    pub credentials: Option<SigningCredentials>,
    /// 文本生成配置（未配置 API key 时为 None）
    pub generation: Option<GenerationConfig>,
    /// 同时运行的流水线数量
    pub max_concurrent_pipelines: usize,
}

/// scarb / sncast 调用配置
#[derive(Clone, Debug)]
pub struct ToolConfig {
    pub scarb_path: String,
    pub sncast_path: String,
    /// sncast --account 名称
    pub account: String,
    /// 是否请求 sncast --json 输出
    pub json_output: bool,
    /// 固定部署 salt，未设置时由 sncast 随机生成
    pub deploy_salt: Option<String>,
    /// 单个命令超时，None 表示不限制
    pub command_timeout: Option<Duration>,
}

/// 网络配置
#[derive(Clone, Debug)]
pub struct NetworkConfig {
    /// sncast --network 名称（未配置 RPC URL 时使用）
    pub network: String,
    /// RPC 端点
    pub rpc_url: Option<String>,
    /// 区块浏览器交易 URL 前缀
    pub explorer_tx_url: String,
}

impl NetworkConfig {
    /// 拼接交易浏览器 URL
    pub fn transaction_url(&self, tx_hash: &str) -> String {
        format!("{}/{}", self.explorer_tx_url.trim_end_matches('/'), tx_hash)
    }

    /// sncast 的网络选择参数
    pub fn sncast_args(&self) -> Vec<String> {
        match &self.rpc_url {
            Some(url) => vec!["--url".to_string(), url.clone()],
            None => vec!["--network".to_string(), self.network.clone()],
        }
    }
}

/// declare 确认等待配置
#[derive(Clone, Debug)]
pub struct FinalityConfig {
    /// 无 RPC 时的固定等待
    pub fixed_delay: Duration,
    /// 轮询初始间隔
    pub poll_interval: Duration,
    /// 轮询最大间隔
    pub max_poll_interval: Duration,
    /// 轮询总超时
    pub timeout: Duration,
}

/// 签名凭据
#[derive(Clone)]
pub struct SigningCredentials {
    pub rpc_url: String,
    pub account_address: String,
    pub private_key: String,
}

impl std::fmt::Debug for SigningCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningCredentials")
            .field("rpc_url", &self.rpc_url)
            .field("account_address", &self.account_address)
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// 文本生成配置
#[derive(Clone)]
pub struct GenerationConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
}

impl std::fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl EnvConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Self {
        let log_level = log_level_from_env();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parse_or("PORT", 5000);

        let contracts_dir = env::var("CONTRACTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./contracts"));

        let network = NetworkConfig::from_env();
        let credentials = SigningCredentials::from_env(network.rpc_url.as_deref());

        let max_concurrent_pipelines = match parse_or("MAX_CONCURRENT_PIPELINES", 1usize) {
            0 => {
                warn!("MAX_CONCURRENT_PIPELINES=0 is not usable, falling back to 1");
                1
            }
            n => n,
        };

        Self {
            log_level,
            bind_addr,
            port,
            contracts_dir,
            tools: ToolConfig::from_env(),
            network,
            finality: FinalityConfig::from_env(),
            credentials,
            generation: GenerationConfig::from_env(),
            max_concurrent_pipelines,
        }
    }
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            bind_addr: "0.0.0.0".to_string(),
            port: 5000,
            contracts_dir: PathBuf::from("./contracts"),
            tools: ToolConfig::default(),
            network: NetworkConfig::default(),
            finality: FinalityConfig::default(),
            credentials: None,
            generation: None,
            max_concurrent_pipelines: 1,
        }
    }
}

impl ToolConfig {
    pub fn from_env() -> Self {
        Self {
            scarb_path: env::var("SCARB_PATH").unwrap_or_else(|_| "scarb".to_string()),
            sncast_path: env::var("SNCAST_PATH").unwrap_or_else(|_| "sncast".to_string()),
            account: env::var("SNCAST_ACCOUNT").unwrap_or_else(|_| "sepolia".to_string()),
            json_output: bool_or("SNCAST_JSON_OUTPUT", true),
            deploy_salt: non_empty("DEPLOY_SALT"),
            command_timeout: non_empty("COMMAND_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            scarb_path: "scarb".to_string(),
            sncast_path: "sncast".to_string(),
            account: "sepolia".to_string(),
            json_output: false,
            deploy_salt: None,
            command_timeout: None,
        }
    }
}

impl NetworkConfig {
    pub fn from_env() -> Self {
        Self {
            network: env::var("STARKNET_NETWORK").unwrap_or_else(|_| "sepolia".to_string()),
            rpc_url: non_empty("STARKNET_RPC_URL"),
            explorer_tx_url: env::var("EXPLORER_TX_URL")
                .unwrap_or_else(|_| constants::DEFAULT_EXPLORER_TX_URL.to_string()),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            network: "sepolia".to_string(),
            rpc_url: None,
            explorer_tx_url: constants::DEFAULT_EXPLORER_TX_URL.to_string(),
        }
    }
}

impl FinalityConfig {
    pub fn from_env() -> Self {
        Self {
            fixed_delay: Duration::from_secs(parse_or("DECLARE_WAIT_SECS", 30)),
            poll_interval: Duration::from_millis(parse_or("DECLARE_POLL_INTERVAL_MS", 2000)),
            max_poll_interval: Duration::from_millis(parse_or(
                "DECLARE_POLL_MAX_INTERVAL_MS",
                15000,
            )),
            timeout: Duration::from_secs(parse_or("DECLARE_POLL_TIMEOUT_SECS", 300)),
        }
        .clamped()
    }

    /// 轮询间隔不低于 `MIN_POLL_INTERVAL_MS`，最大间隔不低于初始间隔
    pub fn clamped(mut self) -> Self {
        let min = Duration::from_millis(constants::MIN_POLL_INTERVAL_MS);
        if self.poll_interval < min {
            warn!(
                poll_interval_ms = self.poll_interval.as_millis() as u64,
                min_ms = constants::MIN_POLL_INTERVAL_MS,
                "DECLARE_POLL_INTERVAL_MS too small, clamping"
            );
            self.poll_interval = min;
        }
        if self.max_poll_interval < self.poll_interval {
            warn!(
                max_poll_interval_ms = self.max_poll_interval.as_millis() as u64,
                "DECLARE_POLL_MAX_INTERVAL_MS below poll interval, raising it"
            );
            self.max_poll_interval = self.poll_interval;
        }
        self
    }
}

impl Default for FinalityConfig {
    fn default() -> Self {
        Self {
            fixed_delay: Duration::from_secs(30),
            poll_interval: Duration::from_millis(2000),
            max_poll_interval: Duration::from_millis(15000),
            timeout: Duration::from_secs(300),
        }
    }
}

impl SigningCredentials {
    /// 三项都配置时才返回凭据
    pub fn from_env(rpc_url: Option<&str>) -> Option<Self> {
        let account_address = non_empty("STARKNET_ACCOUNT_ADDRESS");
        let private_key = non_empty("STARKNET_PRIVATE_KEY");

        match (rpc_url, account_address, private_key) {
            (Some(rpc_url), Some(account_address), Some(private_key)) => Some(Self {
                rpc_url: rpc_url.to_string(),
                account_address,
                private_key,
            }),
            (_, Some(_), _) | (_, _, Some(_)) => {
                warn!("Incomplete signing configuration: STARKNET_RPC_URL, STARKNET_ACCOUNT_ADDRESS and STARKNET_PRIVATE_KEY are all required for minting");
                None
            }
            _ => None,
        }
    }
}

impl GenerationConfig {
    pub fn from_env() -> Option<Self> {
        let api_key = non_empty("OPENAI_API_KEY")?;
        Some(Self {
            api_key,
            model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            base_url: env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
        })
    }
}

/// 默认日志级别，RUST_LOG 未设置时生效
pub fn log_level_from_env() -> String {
    non_empty("LOG_LEVEL")
        .map(|v| v.trim().to_lowercase())
        .unwrap_or_else(|| "info".to_string())
}

/// 读取非空环境变量
fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// 解析环境变量，失败时使用默认值
fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match non_empty(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key = %key, value = %raw, "Invalid value, using default");
            default
        }),
        None => default,
    }
}

fn bool_or(key: &str, default: bool) -> bool {
    non_empty(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

/// 常量
pub mod constants {
    /// declare 轮询的最小间隔（毫秒）
    pub const MIN_POLL_INTERVAL_MS: u64 = 100;
    /// sncast 对重复 declare 的提示
    pub const ALREADY_DECLARED_MARKER: &str = "already declared";

    /// 默认区块浏览器交易 URL 前缀
    pub const DEFAULT_EXPLORER_TX_URL: &str = "https://sepolia.starkscan.co/tx";

    /// 生成源码最大字节数
    pub const MAX_GENERATED_SOURCE_BYTES: usize = 64 * 1024;

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
