use anyhow::Result;
use serde_json::json;

use crate::opts::ClientOpts;
use crate::output::print_success;

pub async fn cmd_whoami(opts: &ClientOpts) -> Result<()> {
    let username = opts.client()?.current_user().await?;
    print_success(opts, &json!({ "username": username }), vec![username.clone()])
}
