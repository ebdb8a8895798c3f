//! Stark Deploy Agent - Starknet 合约部署代理
//!
//! Usage:
//! - Normal mode: `stark-deploy-agent`
//! - With custom port: `stark-deploy-agent --port 8080`

use stark_deploy_agent::RuntimeConfig;

/// 解析命令行参数
fn parse_args() -> RuntimeConfig {
    let args: Vec<String> = std::env::args().collect();
    let mut config = RuntimeConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--port" if i + 1 < args.len() => {
                config.port_override = args[i + 1].parse().ok();
                if config.port_override.is_none() {
                    eprintln!("Ignoring invalid --port value: {}", args[i + 1]);
                }
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            _ => {
                i += 1;
            }
        }
    }

    config
}

fn print_help() {
    println!("Stark Deploy Agent - Starknet 合约部署代理");
    println!();
    println!("USAGE:");
    println!("    stark-deploy-agent [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --port <PORT>    Override the listening port");
    println!("    -h, --help       Print help information");
    println!();
    println!("ENVIRONMENT:");
    println!("    CONTRACTS_DIR, STARKNET_RPC_URL, SNCAST_ACCOUNT, OPENAI_API_KEY, ...");
    println!("    A .env file in the working directory is loaded first.");
    println!();
    println!("EXAMPLES:");
    println!("    stark-deploy-agent                # Listen on PORT (default 5000)");
    println!("    stark-deploy-agent --port 8080    # Custom port");
}

fn main() {
    // .env 不存在时忽略
    dotenv::dotenv().ok();

    let config = parse_args();

    let rt = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let result = rt.block_on(stark_deploy_agent::init_and_run_agent_with_config(config));

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
