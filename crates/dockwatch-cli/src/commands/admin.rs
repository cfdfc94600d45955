use anyhow::Result;
use clap::Args;
use dockwatch_core::AdminCommand;
use serde_json::json;

use crate::opts::ClientOpts;
use crate::output::print_success;

#[derive(Args, Debug)]
pub struct AdminArgs {
    /// `<username>` grants half an hour of access; `remove <username>` revokes it
    #[arg(num_args = 0.., trailing_var_arg = true)]
    pub input: Vec<String>,
}

pub async fn cmd_admin(opts: &ClientOpts, args: &AdminArgs) -> Result<()> {
    // Parse before building a client so usage errors never reach the server.
    let command = AdminCommand::parse(&args.input.join(" "))?;
    let client = opts.client()?;
    match command {
        AdminCommand::Grant { username, hours } => {
            let grant = client.grant(&username, Some(hours)).await?;
            let line = format!("{} (until {})", grant.message, grant.expires_at.to_rfc3339());
            print_success(opts, &grant, vec![line])
        }
        AdminCommand::Revoke { username } => {
            let message = client.revoke(&username).await?;
            print_success(opts, &json!({ "message": message }), vec![message.clone()])
        }
    }
}
