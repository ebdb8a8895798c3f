//! NFT 铸造
//!
//! 用配置的账户发送一笔 `mint(recipient, token_uri)` 调用

use async_trait::async_trait;
use starknet::{
    accounts::{Account, ExecutionEncoding, SingleOwnerAccount},
    core::types::{Call, Felt},
    macros::selector,
    providers::{
        jsonrpc::{HttpTransport, JsonRpcClient},
        Provider,
    },
    signers::{LocalWallet, SigningKey},
};
use tracing::{error, info};
use url::Url;

use super::error::PipelineError;
use crate::config::SigningCredentials;
use crate::domain::MintParams;

/// Cairo `bytes31` 的最大字节数
const BYTES_PER_WORD: usize = 31;

#[async_trait]
pub trait NftMinter: Send + Sync {
    /// 返回 invoke 交易哈希
    async fn mint(&self, params: &MintParams) -> Result<String, PipelineError>;
}

pub struct StarknetMinter {
    credentials: SigningCredentials,
}

impl StarknetMinter {
    pub fn new(credentials: SigningCredentials) -> Self {
        Self { credentials }
    }

    fn parse_credentials(&self) -> Result<(Url, Felt, Felt), PipelineError> {
        let rpc_url = Url::parse(&self.credentials.rpc_url).map_err(|e| {
            PipelineError::Credential(format!("STARKNET_RPC_URL is not a valid URL: {}", e))
        })?;
        let account_address = Felt::from_hex(&self.credentials.account_address).map_err(|_| {
            PipelineError::Credential("STARKNET_ACCOUNT_ADDRESS is not a hex felt".to_string())
        })?;
        let private_key = Felt::from_hex(&self.credentials.private_key).map_err(|_| {
            PipelineError::Credential("STARKNET_PRIVATE_KEY is not a hex felt".to_string())
        })?;
        Ok((rpc_url, account_address, private_key))
    }
}

#[async_trait]
impl NftMinter for StarknetMinter {
    async fn mint(&self, params: &MintParams) -> Result<String, PipelineError> {
        let (rpc_url, account_address, private_key) = self.parse_credentials()?;
        let call = mint_call(params)?;

        let provider = JsonRpcClient::new(HttpTransport::new(rpc_url));
        let chain_id = provider.chain_id().await.map_err(|e| {
            error!(error = %e, "Failed to fetch chain id");
            PipelineError::Remote(format!("failed to fetch chain id: {}", e))
        })?;

        let signer = LocalWallet::from_signing_key(SigningKey::from_secret_scalar(private_key));
        let account = SingleOwnerAccount::new(
            provider,
            signer,
            account_address,
            chain_id,
            ExecutionEncoding::New,
        );

        let result = account.execute_v3(vec![call]).send().await.map_err(|e| {
            error!(
                contract_address = %params.contract_address,
                error = %e,
                "Mint invoke failed"
            );
            PipelineError::Remote(e.to_string())
        })?;

        let tx_hash = format!("{:#x}", result.transaction_hash);
        info!(
            contract_address = %params.contract_address,
            recipient = %params.recipient,
            tx_hash = %tx_hash,
            "Mint submitted"
        );
        Ok(tx_hash)
    }
}

fn mint_call(params: &MintParams) -> Result<Call, PipelineError> {
    let to = Felt::from_hex(&params.contract_address)
        .map_err(|_| invalid_address("contract_address"))?;
    let recipient =
        Felt::from_hex(&params.recipient).map_err(|_| invalid_address("recipient"))?;

    let mut calldata = vec![recipient];
    calldata.extend(encode_byte_array(&params.uri));

    Ok(Call {
        to,
        selector: selector!("mint"),
        calldata,
    })
}

fn invalid_address(field: &str) -> PipelineError {
    crate::domain::ValidationError::field(field, format!("'{}' is not a valid felt", field)).into()
}

/// Cairo `ByteArray` 序列化：完整字数量、每个 31 字节的字、剩余部分及其长度
fn encode_byte_array(value: &str) -> Vec<Felt> {
    let bytes = value.as_bytes();
    let chunks: Vec<&[u8]> = bytes.chunks(BYTES_PER_WORD).collect();

    let (full, pending): (&[&[u8]], &[u8]) = match chunks.split_last() {
        Some((last, rest)) if last.len() < BYTES_PER_WORD => (rest, *last),
        _ => (&chunks[..], &[]),
    };

    let mut felts = Vec::with_capacity(full.len() + 3);
    felts.push(Felt::from(full.len() as u64));
    felts.extend(full.iter().map(|word| Felt::from_bytes_be_slice(word)));
    felts.push(Felt::from_bytes_be_slice(pending));
    felts.push(Felt::from(pending.len() as u64));
    felts
}
