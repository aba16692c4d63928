//! Serve command - run the mirror

use crate::cli::args::ServeArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{MirrorError, MirrorResult};
use crate::mirror::Mirror;
use crate::server;
use crate::ui::{self, UiContext};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::debug;

/// Execute the serve command
pub async fn execute(args: ServeArgs, config: &Config) -> MirrorResult<()> {
    let ctx = UiContext::detect();
    let config = apply_overrides(args, config);

    ConfigManager::ensure_storage_dirs(&config).await?;

    let mirror = Arc::new(Mirror::from_config(&config));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| MirrorError::io(format!("binding {}", addr), e))?;
    let local = listener
        .local_addr()
        .map_err(|e| MirrorError::io("reading listener address", e))?;

    ui::intro(&ctx, "wheelmirror");
    ui::key_value(&ctx, "Origin", mirror.index_url());
    ui::key_value(
        &ctx,
        "Cache",
        &config.storage.cache_dir.display().to_string(),
    );
    ui::key_value(
        &ctx,
        "Patched",
        &config.storage.modified_dir.display().to_string(),
    );
    let patched: Vec<&str> = mirror.rules().packages().collect();
    if !patched.is_empty() {
        ui::key_value(&ctx, "Patching", &patched.join(", "));
    }
    ui::step_ok(&ctx, &format!("Listening on http://{}/simple/", local));
    debug!("Serving with config {:?}", config);

    server::serve(listener, mirror).await
}

/// Command-line flags take precedence over the config file
fn apply_overrides(args: ServeArgs, config: &Config) -> Config {
    let mut config = config.clone();
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(origin) = args.origin {
        config.origin.index_url = origin;
    }
    config
}
