use anyhow::{Context, Result};
use api_connector::{
    config::ConfigLoader, db, repositories::HttpRequestLogRepository, telemetry::init_tracing,
};
use clap::Parser;
use std::sync::Arc;

/// Delete request log entries whose deletion date has passed
#[derive(Debug, Parser)]
#[command(name = "purge_request_logs", version)]
struct Args {
    /// Only report how many entries would be deleted
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    init_tracing(&config).context("initializing telemetry")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    let logs = HttpRequestLogRepository::new(Arc::new(db));

    if args.dry_run {
        let expired = logs
            .count_expired()
            .await
            .context("counting expired request logs")?;
        println!("{} request log entr(y/ies) past their deletion date.", expired);
        return Ok(());
    }

    let deleted = logs
        .purge_expired()
        .await
        .context("purging expired request logs")?;
    println!("Deleted {} expired request log entr(y/ies).", deleted);

    Ok(())
}
