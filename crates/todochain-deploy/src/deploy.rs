use alloy::network::TransactionBuilder;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use anyhow::{Context, bail};
use todochain_core::DappConfig;
use tracing::{info, warn};

use crate::artifact;
use crate::cli::Args;

/// Sends the creation transaction and waits for its receipt.
#[tracing::instrument(skip_all, fields(artifact = %args.artifact.display()))]
pub async fn deploy(args: &Args) -> anyhow::Result<Address> {
    let config = match &args.config {
        Some(path) => DappConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => DappConfig::default(),
    };

    let rpc_url = resolve_rpc_url(args.rpc_url.as_deref(), &config)?;
    let signer: PrivateKeySigner = args
        .private_key
        .trim()
        .parse()
        .context("invalid deployer private key")?;
    let bytecode = artifact::load(&args.artifact)?;

    info!(
        deployer = %signer.address(),
        rpc = %rpc_url,
        size = bytecode.len(),
        "deploying TodoList"
    );
    let provider = ProviderBuilder::new().wallet(signer).connect_http(rpc_url);

    let chain_id = provider
        .get_chain_id()
        .await
        .context("failed to query chain id")?;
    if chain_id != config.network.chain_id {
        warn!(
            chain_id,
            expected = config.network.chain_id,
            "RPC endpoint is not on the configured network"
        );
    }

    let tx = TransactionRequest::default().with_deploy_code(bytecode);
    let receipt = provider
        .send_transaction(tx)
        .await
        .context("failed to submit deployment")?
        .get_receipt()
        .await
        .context("failed waiting for deployment receipt")?;

    if !receipt.status() {
        bail!("deployment transaction {} reverted", receipt.transaction_hash);
    }
    let address = receipt
        .contract_address
        .context("deployment receipt carries no contract address")?;
    info!(%address, block = ?receipt.block_number, "TodoList deployed");
    Ok(address)
}

fn resolve_rpc_url(flag: Option<&str>, config: &DappConfig) -> anyhow::Result<Url> {
    let raw = flag
        .or_else(|| config.network.primary_rpc_url())
        .context("no RPC URL configured")?;
    raw.parse()
        .with_context(|| format!("invalid RPC URL {raw}"))
}
