use metrics_pipeline::config::PipelineConfig;
use metrics_pipeline::runner::run_market;
use metrics_pipeline::warehouse::HttpWarehouse;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting order metrics pipeline");

    let config = PipelineConfig::from_env();
    let warehouse = HttpWarehouse::new(&config.warehouse_url, &config.warehouse_token);
    let now = chrono::Utc::now();

    let mut failed = Vec::new();
    for market in &config.markets {
        match run_market(&warehouse, &config, market, now).await {
            Ok(report) => {
                tracing::info!(
                    market = report.market.as_str(),
                    canonical_records = report.canonical_records,
                    path = %report.snapshot_path.display(),
                    "market succeeded"
                );
            }
            Err(err) => {
                tracing::error!(
                    market = market.code.as_str(),
                    error = %err,
                    "market failed; previous snapshot left in place"
                );
                failed.push(market.code.clone());
            }
        }
    }

    if !failed.is_empty() {
        anyhow::bail!(
            "{} of {} markets failed: {:?}",
            failed.len(),
            config.markets.len(),
            failed
        );
    }

    Ok(())
}
