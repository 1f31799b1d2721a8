use anyhow::Result;
use natsmon::*;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let repo = varz_repo::VarzRepo::new(Duration::from_millis(
        app_config.monitoring.request_timeout_ms,
    ))?;
    let monitor = monitor::Monitor::new(
        repo,
        monitor::MonitorConfig {
            poll_interval_ms: app_config.monitoring.poll_interval_ms,
            broadcast_capacity: app_config.publishing.broadcast_capacity,
        },
    );

    monitor.configure_target(&app_config.server.url);
    let mut events = monitor.subscribe();
    anyhow::ensure!(monitor.start(), "monitoring did not start; check server.url");
    tracing::info!(url = %app_config.server.url, "Polling started");

    loop {
        tokio::select! {
            event = events.recv() => {
                match event {
                    Ok(models::MonitorEvent::Stats(stats)) => {
                        tracing::info!(
                            server = %stats.server_name,
                            cpu = stats.cpu,
                            memory = %stats.memory.display,
                            conns = %stats.conns.display,
                            in_msgs_rate = %stats.in_msgs_rate.display,
                            out_msgs_rate = %stats.out_msgs_rate.display,
                            in_bytes_rate = %stats.in_bytes_rate.display,
                            out_bytes_rate = %stats.out_bytes_rate.display,
                            "server stats"
                        );
                    }
                    Ok(models::MonitorEvent::Failed(failure)) => {
                        tracing::error!(
                            kind = ?failure.kind,
                            detail = %failure.detail,
                            "polling halted; restart to resume"
                        );
                        break;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("event subscriber lagged, skipped {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = async {
                #[cfg(unix)]
                {
                    let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                        Ok(s) => s,
                        Err(_) => {
                            let _ = tokio::signal::ctrl_c().await;
                            return;
                        }
                    };
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {}
                        _ = sigterm.recv() => {}
                    }
                }
                #[cfg(not(unix))]
                {
                    let _ = tokio::signal::ctrl_c().await;
                }
            } => {
                tracing::info!("Received shutdown signal");
                monitor.stop();
                break;
            }
        }
    }

    Ok(())
}
