//! Process wiring: stores, client, worker pool and API server.

use std::sync::Arc;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use chainwatch_core::types::{Block, BlockStatus};
use chainwatch_core::{
    BlockRepository, ChainClient, InMemoryClaimLock, Job, Jobs, Parser, ParserWorker,
};
use chainwatch_evm::HttpChainClient;
use chainwatch_storage::{InMemoryBlockStore, InMemorySubscriberStore, InMemoryTransactionStore};

use crate::config::Config;

/// Run until Ctrl-C, then stop the jobs and the server.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let blocks = Arc::new(InMemoryBlockStore::with_staleness_window(
        config.worker.staleness_window(),
    ));
    let subscribers = Arc::new(InMemorySubscriberStore::new());
    let transactions = Arc::new(InMemoryTransactionStore::new());
    let client = Arc::new(
        HttpChainClient::new(config.client.clone()).context("failed to build chain client")?,
    );
    tracing::info!(url = %client.url(), "Chain client ready");

    let start = seed_start_block(client.as_ref(), blocks.as_ref(), config.worker.start_block)
        .await?;
    tracing::info!(block = start, "Seeded start block");

    let parser = Arc::new(Parser::new(
        transactions.clone(),
        subscribers.clone(),
        blocks.clone(),
    ));
    subscribe_predefined(&parser, &config.worker.predefined_addresses).await?;

    let worker = Arc::new(ParserWorker::new(
        transactions,
        subscribers,
        blocks,
        client,
        Arc::new(InMemoryClaimLock::new()),
    ));
    let jobs = worker_jobs(worker, &config);

    let cancel = CancellationToken::new();
    let running = jobs.start(cancel.clone());
    let mut server = tokio::spawn({
        let server_config = config.server.clone();
        let cancel = cancel.clone();
        async move { chainwatch_api::serve(&server_config, parser, cancel).await }
    });

    let early_exit = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Shutting down");
            None
        }
        res = &mut server => Some(res),
    };

    cancel.cancel();
    running.wait().await;

    let server_result = match early_exit {
        Some(res) => res,
        None => server.await,
    };
    server_result
        .context("API server task panicked")?
        .context("API server failed")?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Record the starting point as parsed so the first claim is the block after
/// it. Without an explicit start the current chain head is used.
pub async fn seed_start_block(
    client: &dyn ChainClient,
    blocks: &dyn BlockRepository,
    start: Option<u64>,
) -> anyhow::Result<u64> {
    let number = match start {
        Some(n) => n,
        None => client
            .block_number()
            .await
            .context("failed to read chain head for the start block")?,
    };
    blocks
        .upsert(Block::new(number, BlockStatus::Parsed))
        .await
        .context("failed to seed start block")?;
    Ok(number)
}

pub async fn subscribe_predefined(parser: &Parser, addresses: &[String]) -> anyhow::Result<()> {
    for address in addresses {
        parser
            .subscribe(address)
            .await
            .with_context(|| format!("failed to subscribe predefined address {address}"))?;
    }
    if !addresses.is_empty() {
        tracing::info!(count = addresses.len(), "Subscribed predefined addresses");
    }
    Ok(())
}

fn worker_jobs(worker: Arc<ParserWorker>, config: &Config) -> Jobs {
    let mut jobs = Jobs::new();
    for i in 0..config.worker.count {
        let worker = Arc::clone(&worker);
        jobs.add(Job::new(
            format!("parser-worker-{i}"),
            config.worker.interval(),
            move || {
                let worker = Arc::clone(&worker);
                async move { worker.run().await }
            },
        ));
    }
    jobs
}
