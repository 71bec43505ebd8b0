use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "todochain-deploy",
    about = "Deploys the TodoList contract and prints its address"
)]
pub struct Args {
    /// Compiled contract: a Hardhat/Foundry artifact JSON or a bare hex file.
    #[arg(long, default_value = "artifacts/contracts/TodoList.sol/TodoList.json")]
    pub artifact: PathBuf,

    /// dapp TOML config; its network section supplies the RPC URL and chain id.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Overrides the config's first RPC URL.
    #[arg(long)]
    pub rpc_url: Option<String>,

    #[arg(long, env = "DEPLOYER_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: String,

    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn private_key_and_overrides_parse() {
        let args = Args::try_parse_from([
            "todochain-deploy",
            "--artifact",
            "out/TodoList.json",
            "--rpc-url",
            "http://127.0.0.1:8545",
            "--private-key",
            "0xabc",
            "-vv",
        ])
        .expect("args parse");

        assert_eq!(args.artifact, PathBuf::from("out/TodoList.json"));
        assert_eq!(args.rpc_url.as_deref(), Some("http://127.0.0.1:8545"));
        assert_eq!(args.private_key, "0xabc");
        assert_eq!(args.verbose, 2);
        assert!(args.config.is_none());
    }
}
