use std::path::Path;

use anyhow::Context;
use tide_config::TidingsConfig;
use tide_db::TideDb;

use crate::cli::GlobalFlags;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub config: TidingsConfig,
    pub db: TideDb,
}

impl AppContext {
    /// Open the briefing store: `--db` wins, then a configured remote, then `store.path`.
    pub async fn init(config: TidingsConfig, flags: &GlobalFlags) -> anyhow::Result<Self> {
        let db = match flags.db.as_deref() {
            Some(path) => open_local(path).await?,
            None if config.store.is_remote() => {
                tracing::debug!(url = %config.store.url, "opening remote briefing store");
                TideDb::open_remote(&config.store.url, &config.store.auth_token)
                    .await
                    .context("failed to connect to remote briefing store")?
            }
            None => open_local(&config.store.path).await?,
        };

        Ok(Self { config, db })
    }
}

async fn open_local(path: &str) -> anyhow::Result<TideDb> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    tracing::debug!(path, "opening local briefing store");
    TideDb::open_local(path)
        .await
        .with_context(|| format!("failed to open {path}"))
}
