//! chainwatch: watch Ethereum addresses and serve their transactions.
//!
//! Usage:
//! ```bash
//! CHAINWATCH_ETH_HTTP_CLIENT_HOST=https://cloudflare-eth.com chainwatch
//! chainwatch version
//! chainwatch help
//! ```

mod bootstrap;
mod config;
mod telemetry;

use std::env;
use std::process;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    match args.get(1).map(String::as_str) {
        None | Some("run") => {}
        Some("version" | "--version" | "-V") => {
            println!("chainwatch {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Some("help" | "--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(other) => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }

    dotenv::dotenv().ok();
    let config = Config::from_env()?;
    telemetry::init_tracing(&config.log);

    bootstrap::run(config).await
}

fn print_usage() {
    println!("chainwatch {}", env!("CARGO_PKG_VERSION"));
    println!("Watch Ethereum addresses and serve matched transactions over HTTP\n");
    println!("USAGE:");
    println!("    chainwatch [COMMAND]\n");
    println!("COMMANDS:");
    println!("    run      Start the watcher and API server (default)");
    println!("    version  Print version");
    println!("    help     Print this help\n");
    println!("ENVIRONMENT:");
    println!("    {:<40} JSON-RPC endpoint (required)", config::ETH_HTTP_CLIENT_HOST);
    println!("    {:<40} request timeout, ms (5000)", config::ETH_HTTP_CLIENT_TIMEOUT_MS);
    println!("    {:<40} parser jobs (4)", config::WORKER_COUNT);
    println!("    {:<40} tick interval, ms (1000)", config::WORKER_INTERVAL_MS);
    println!("    {:<40} first block (chain head)", config::WORKER_START_BLOCK_NUMBER);
    println!("    {:<40} reclaim window, ms (300000)", config::WORKER_STALENESS_WINDOW_MS);
    println!("    {:<40} comma-separated addresses", config::PREDEFINED_ADDRESSES);
    println!("    {:<40} bind host (0.0.0.0)", config::SERVER_HOST);
    println!("    {:<40} bind port (8080)", config::SERVER_PORT);
    println!("    {:<40} log filter (info)", config::LOG_LEVEL);
    println!("    {:<40} JSON logs (false)", config::LOG_JSON);
}
