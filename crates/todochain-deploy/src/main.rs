mod artifact;
mod cli;
mod deploy;

use clap::Parser;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    if let Err(err) = run(args).await {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(args: cli::Args) -> anyhow::Result<()> {
    cli::init_tracing(args.verbose, args.quiet)?;
    let address = deploy::deploy(&args).await?;
    println!("TodoList deployed to: {address}");
    Ok(())
}
