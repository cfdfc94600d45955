use anyhow::Result;

use crate::opts::ClientOpts;
use crate::output::print_success;

pub async fn cmd_access(opts: &ClientOpts) -> Result<()> {
    let grants = opts.client()?.temp_access().await?;
    let lines = if grants.is_empty() {
        vec!["No active temporary grants".to_string()]
    } else {
        grants
            .iter()
            .map(|g| format!("{}\texpires {}", g.username, g.expires_at.to_rfc3339()))
            .collect()
    };
    print_success(opts, &grants, lines)
}
