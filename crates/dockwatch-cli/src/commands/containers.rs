use anyhow::Result;
use dockwatch_core::reconcile::display_line;

use crate::opts::ClientOpts;
use crate::output::print_success;

pub async fn cmd_containers(opts: &ClientOpts) -> Result<()> {
    let containers = opts.client()?.containers().await?;
    let lines = if containers.is_empty() {
        vec!["No containers found".to_string()]
    } else {
        containers.iter().map(display_line).collect()
    };
    print_success(opts, &containers, lines)
}
