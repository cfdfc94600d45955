use anyhow::Result;
use clap::Args;
use serde_json::json;

use crate::opts::ClientOpts;
use crate::output::print_success;

#[derive(Args, Debug)]
pub struct LogsArgs {
    /// Container id (full or short)
    pub container_id: String,

    /// Number of trailing lines (server default when omitted)
    #[arg(short = 'n', long)]
    pub lines: Option<usize>,
}

pub async fn cmd_logs(opts: &ClientOpts, args: &LogsArgs) -> Result<()> {
    let logs = opts
        .client()?
        .logs(&args.container_id, args.lines)
        .await?;
    let lines = logs.lines().map(str::to_string).collect();
    print_success(opts, &json!({ "logs": logs }), lines)
}
