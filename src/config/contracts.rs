//! 合约项目布局
//!
//! 每种合约类型对应 CONTRACTS_DIR 下的一个 Scarb 项目模板

use std::path::{Path, PathBuf};

use crate::domain::ContractKind;

/// 合约项目模板
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractProject {
    /// 模板目录名（相对于 CONTRACTS_DIR）
    pub dir_name: &'static str,
    /// 源码文件（相对于项目目录）
    pub source_path: &'static str,
    /// sncast declare --contract-name，None 表示由请求决定
    pub contract_name: Option<&'static str>,
}

impl ContractProject {
    /// 获取合约类型对应的项目模板
    pub fn for_kind(kind: ContractKind) -> Self {
        match kind {
            ContractKind::Token => Self {
                dir_name: "token-contract",
                source_path: "src/lib.cairo",
                contract_name: Some("MyToken"),
            },
            ContractKind::NftCollection => Self {
                dir_name: "nft-contract",
                source_path: "src/lib.cairo",
                contract_name: Some("MyNFT"),
            },
            ContractKind::RawSource => Self {
                dir_name: "custom-contract",
                source_path: "src/lib.cairo",
                contract_name: None,
            },
            ContractKind::Fallback => Self {
                dir_name: "counter-contract",
                source_path: "src/lib.cairo",
                contract_name: Some("Counter"),
            },
        }
    }

    /// 模板目录的完整路径
    pub fn template_dir(&self, contracts_dir: &Path) -> PathBuf {
        contracts_dir.join(self.dir_name)
    }
}
