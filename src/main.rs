use std::sync::Arc;

use fileserve::cache::{CacheStore, Sweeper};
use fileserve::cli::{Cli, USAGE};
use fileserve::config::Config;
use fileserve::serve::StaticFiles;
use fileserve::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(cli) = Cli::from_args(std::env::args_os()) else {
        print!("{USAGE}");
        return Ok(());
    };

    let cfg = Config::load(&cli)?;

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(cfg.max_level())
        .init();

    if let Some(level) = cfg.unknown_log_level() {
        tracing::warn!(log_level = level, "Unrecognised log level, using info");
    }

    let cache = CacheStore::new();
    let sweeper = cfg
        .static_files
        .sweep_interval()
        .map(|period| Sweeper::new(cache.clone(), period).spawn());

    let files = Arc::new(StaticFiles::new(&cfg.static_files, cache));

    tokio::select! {
        res = server::listener::run(&cfg, files) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    if let Some(handle) = sweeper {
        handle.abort();
    }

    Ok(())
}
