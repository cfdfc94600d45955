use anyhow::{Result, bail};
use clap::Args;

use crate::opts::ClientOpts;
use crate::output::print_success;

#[derive(Args, Debug)]
pub struct ExecArgs {
    /// Shell command to run on the remote host
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

pub async fn cmd_exec(opts: &ClientOpts, args: &ExecArgs) -> Result<()> {
    let output = opts.client()?.execute(&args.command.join(" ")).await?;
    let mut lines: Vec<String> = output.stdout.lines().map(str::to_string).collect();
    lines.extend(output.stderr.lines().map(|l| format!("stderr: {l}")));
    print_success(opts, &output, lines)?;
    match output.exit_code {
        Some(0) => Ok(()),
        Some(code) => bail!("remote command exited with status {code}"),
        None => bail!("remote command was terminated by a signal"),
    }
}
