//! Deposit bridge CLI.

use alloy_primitives::B256;
use clap::Parser;
use eyre::Result;
use std::path::PathBuf;

use deposit_bridge::{
    app::BridgeApp,
    config::Config,
    messenger::{CrossChainMessenger, FIRST_MESSAGE, OpMessenger},
    render::CONNECT_PROMPT,
    wallet::Wallet,
};

#[derive(Parser, Debug)]
#[command(name = "deposit-bridge")]
#[command(about = "Bridge ETH from L1 to an OP-stack L2 and follow the deposit")]
struct Args {
    /// Path to config file
    #[arg(short, long, default_value = "deposit-bridge.toml")]
    config: PathBuf,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// Deposit the configured amount and follow it to L2
    Run,
    /// Show the message status of an existing deposit
    Status {
        /// Hash of the L1 deposit transaction
        l1_tx_hash: B256,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("deposit_bridge=info".parse()?),
        )
        .init();

    let args = Args::parse();

    tracing::info!(config = ?args.config, "loading configuration");
    let config = Config::load(&args.config)?;

    match args.cmd {
        Command::Run => run(&config).await,
        Command::Status { l1_tx_hash } => status(&config, l1_tx_hash).await,
    }
}

async fn run(config: &Config) -> Result<()> {
    let wallet = Wallet::from_config(config.signer.as_ref())?;
    let app = BridgeApp::connect(config, wallet).await?;

    let Some(controller) = app.controller() else {
        println!("{CONNECT_PROMPT}");
        return Ok(());
    };

    let mut updates = controller.subscribe();
    let mut updates_open = true;
    let mut interrupted = false;
    let mut printed = Vec::new();

    let start = controller.start();
    tokio::pin!(start);

    let result = loop {
        tokio::select! {
            result = &mut start => break result,
            changed = updates.changed(), if updates_open => {
                if changed.is_err() {
                    updates_open = false;
                    continue;
                }
                print_new_lines(&mut printed, app.render());
            }
            _ = tokio::signal::ctrl_c(), if !interrupted => {
                interrupted = true;
                controller.cancel();
            }
        }
    };

    print_new_lines(&mut printed, app.render());

    let outcome = result?;
    tracing::info!(
        l1_tx_hash = %outcome.l1_tx_hash,
        l2_tx_hash = %outcome.l2_tx_hash,
        status = %outcome.message_status,
        "deposit bridged"
    );
    Ok(())
}

/// Print the lines that differ from the previous render.
fn print_new_lines(printed: &mut Vec<String>, lines: Vec<String>) {
    for (index, line) in lines.iter().enumerate() {
        if printed.get(index) != Some(line) {
            println!("{line}");
        }
    }
    *printed = lines;
}

async fn status(config: &Config, l1_tx_hash: B256) -> Result<()> {
    let messenger = OpMessenger::new(config, None)?;
    messenger.verify_chains().await?;

    let l2_block = messenger.l2_block_number().await?;
    let status = messenger
        .get_message_status(l1_tx_hash, FIRST_MESSAGE, l2_block)
        .await?;
    let estimate = messenger
        .estimate_message_wait_time_seconds(l1_tx_hash, FIRST_MESSAGE, l2_block)
        .await?;

    println!("L2 message status: {status}");
    if !status.is_final() {
        println!("Estimated wait time: {estimate} seconds");
    }
    Ok(())
}
