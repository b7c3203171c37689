// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use crystal_swap::app::config::GlobalSettings;
use crystal_swap::app::logging::setup_logging;
use crystal_swap::domain::error::AppError;
use crystal_swap::network::provider::ConnectionFactory;
use crystal_swap::services::rotation::executor::SwapExecutor;
use crystal_swap::services::rotation::session::SessionDriver;
use futures::future::try_join_all;
use std::str::FromStr;

#[derive(Parser, Debug)]
#[command(author, version, about = "crystal swap rotation bot")]
struct Cli {
    /// Path to config file (default: config.{toml,yaml,...})
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(if settings.debug { "debug" } else { "info" }, false);

    let provider = ConnectionFactory::http(&settings.rpc_url)?;
    tracing::info!(
        target: "config",
        rpc = %settings.rpc_url,
        accounts = settings.private_keys.len(),
        "Configuration loaded"
    );

    let mut session_tasks = Vec::new();
    for (account_index, key) in settings.private_keys.iter().enumerate() {
        let signer = PrivateKeySigner::from_str(key).map_err(|e| {
            AppError::Config(format!("Invalid private key at index {account_index}: {e}"))
        })?;
        tracing::info!(
            target: "config",
            account = account_index,
            wallet = %format!("{:#x}", signer.address()),
            "Account ready"
        );

        let executor = SwapExecutor::new(
            provider.clone(),
            signer,
            settings.executor_tuning(),
            account_index,
        );
        let session = SessionDriver::new(executor, settings.session_settings(), account_index);
        session_tasks.push(tokio::spawn(async move { session.run().await }));
    }

    let results = try_join_all(session_tasks)
        .await
        .map_err(|e| AppError::Unknown(anyhow::anyhow!("Session task join failed: {e}")))?;
    for res in results {
        res?;
    }
    Ok(())
}
