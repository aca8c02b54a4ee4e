//! Site server command (`sitepress serve`).

use std::path::PathBuf;

use anyhow::Result;

use sitepress::site::server::{ServerConfig, start_server};
use sitepress::site_config::SiteConfig;

pub async fn cmd_serve(
    root: PathBuf,
    host: Option<String>,
    port: Option<u16>,
    dev: bool,
    open: bool,
) -> Result<()> {
    let site = SiteConfig::with_cli_args(root, host, port)?;

    // Skip in dev mode (no browser inside containers)
    if open && !dev {
        let url = format!("http://localhost:{}", site.port());
        tokio::spawn(async move {
            // Small delay to let the server start binding
            tokio::time::sleep(tokio::time::Duration::from_millis(500)).await;
            if let Err(e) = open::that(&url) {
                tracing::warn!(error = %e, "failed to open browser");
            }
        });
    }

    start_server(ServerConfig {
        site,
        dev_mode: dev,
    })
    .await
}
