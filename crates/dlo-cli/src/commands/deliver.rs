use std::time::Duration;

use dlo_scheduler::DeliveryScheduler;
use tracing::info;

use crate::app::App;

/// Run the delivery loop until Ctrl-C, then stop it between cycles.
pub async fn serve(app: &App) -> anyhow::Result<()> {
    let every = Duration::from_secs(app.config.delivery.interval_secs);
    let scheduler = DeliveryScheduler::start(app.engine()?, every)?;
    info!("Dear Loved One delivery running; press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    info!("shutdown requested");
    scheduler.stop().await;
    Ok(())
}

pub async fn once(app: &App) -> anyhow::Result<()> {
    let report = app.engine()?.run_cycle().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
