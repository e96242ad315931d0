//! Keep-alive job: pings the service's own public URL on a fixed interval so
//! idle-sleeping hosts keep it warm.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::KeepAliveConfig;

pub fn spawn_keep_alive(cfg: Option<KeepAliveConfig>) -> Option<JoinHandle<()>> {
    let cfg = cfg?;
    info!(url = %cfg.url, interval_secs = cfg.interval_secs, "keep-alive job started");
    Some(tokio::spawn(run(cfg)))
}

async fn run(cfg: KeepAliveConfig) {
    let client = reqwest::Client::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(cfg.interval_secs));
    // first tick fires immediately; the server is not listening yet
    ticker.tick().await;
    loop {
        ticker.tick().await;
        ping(&client, &cfg.url).await;
    }
}

/// Returns whether the target answered 2xx.
pub async fn ping(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(res) if res.status().is_success() => {
            debug!(%url, status = %res.status(), "keep-alive ok");
            true
        }
        Ok(res) => {
            warn!(%url, status = %res.status(), "keep-alive got non-success status");
            false
        }
        Err(e) => {
            warn!(%url, error = %e, "keep-alive request failed");
            false
        }
    }
}
