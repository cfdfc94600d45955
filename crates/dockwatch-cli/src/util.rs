use std::path::Path;

use anyhow::{Context, Result};

/// Load `./.env` without overriding variables already set.
pub fn load_dotenv() -> Result<()> {
    let env_path = Path::new(".env");
    if env_path.exists() {
        for item in dotenvy::from_path_iter(env_path).context("load .env")? {
            let (key, val) = item.context("parse .env")?;
            if std::env::var_os(&key).is_none() {
                unsafe {
                    std::env::set_var(&key, &val);
                }
            }
        }
    }
    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG`. The server defaults to `info`,
/// client commands to `warn`.
pub fn setup_logging(server: bool) {
    let default = if server { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();
}
