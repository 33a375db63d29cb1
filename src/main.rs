use anyhow::{Context, Result};
use rvdss::{
    export::export_all,
    view::{chart_view, ChartRequest},
    Config, DatasetSnapshot, HttpSource,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) config + logging ─────────────────────────────────────────
    let config = Config::from_env().context("reading configuration")?;
    let env = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_str()));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!(?config, "startup");

    // ─── 2) source + snapshot ────────────────────────────────────────
    let source = HttpSource::new(config.variant, config.landing_timeout, config.dataset_timeout)
        .context("building http source")?;
    let snapshot = DatasetSnapshot::new(source, config.retry);

    // ─── 3) initial load; nothing is served without it ───────────────
    let dataset = snapshot
        .refresh()
        .await
        .context("initial dataset load failed")?;
    export_all(&dataset, &config.output_dir).context("exporting dataset")?;

    let view = chart_view(&dataset, ChartRequest::default());
    info!(
        region = %view.region,
        series = view.series.len(),
        "default chart view ready"
    );

    // ─── 4) optional periodic refresh ────────────────────────────────
    let Some(every) = config.refresh_every else {
        info!("run once; exit");
        return Ok(());
    };
    info!(every_secs = every.as_secs(), "refreshing periodically");

    let output_dir = config.output_dir.clone();
    tokio::select! {
        _ = snapshot.run_refresh_loop(every, |ds| {
            if let Err(e) = export_all(ds, &output_dir) {
                error!(error = %e, "export after refresh failed");
            }
        }) => {}
        res = tokio::signal::ctrl_c() => {
            if let Err(e) = res {
                warn!(error = %e, "could not listen for shutdown signal");
            }
            info!(status = ?snapshot.status(), "shutdown");
        }
    }
    Ok(())
}
