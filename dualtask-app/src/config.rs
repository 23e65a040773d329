use anyhow::{Context, Result};
use dualtask_tasks::SessionConfig;
use std::path::Path;
use tracing::info;

/// Reads the session configuration from `path`, writing the defaults there
/// first when the file does not exist yet. A file that exists but does not
/// parse or validate is an error.
pub fn load_or_create(path: &Path) -> Result<SessionConfig> {
    if !path.exists() {
        let config = SessionConfig::default();
        let json = serde_json::to_string_pretty(&config)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing default config to {}", path.display()))?;
        info!(path = %path.display(), "wrote default configuration");
        return Ok(config);
    }

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: SessionConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    info!(path = %path.display(), run_games = ?config.run_games, duration = config.duration, "configuration loaded");
    Ok(config)
}
