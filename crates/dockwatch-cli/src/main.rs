mod commands;
mod opts;
mod output;
mod util;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::admin::AdminArgs;
use commands::exec::ExecArgs;
use commands::logs::LogsArgs;
use commands::serve::ServeArgs;
use commands::watch::WatchArgs;
use opts::ClientOpts;

#[derive(Parser, Debug)]
#[command(name = "dockwatch", version, about = "Docker container dashboard")]
struct Cli {
    #[command(flatten)]
    opts: ClientOpts,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the dashboard server (configured from the environment)
    Serve(ServeArgs),

    /// List containers on the remote host
    Containers,

    /// Show the log tail of one container
    Logs(LogsArgs),

    /// Grant (`<username>`) or revoke (`remove <username>`) temporary access
    Admin(AdminArgs),

    /// List active temporary grants
    Access,

    /// Follow the dashboard as containers change
    Watch(WatchArgs),

    /// Print the username the server sees
    Whoami,

    /// Run a command on the remote host (when enabled on the server)
    Exec(ExecArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    util::load_dotenv()?;
    let cli = Cli::parse();
    util::setup_logging(matches!(cli.command, Command::Serve(_)));
    let opts = &cli.opts;

    match cli.command {
        Command::Serve(args) => commands::serve::cmd_serve(&args).await,
        Command::Containers => commands::containers::cmd_containers(opts).await,
        Command::Logs(args) => commands::logs::cmd_logs(opts, &args).await,
        Command::Admin(args) => commands::admin::cmd_admin(opts, &args).await,
        Command::Access => commands::access::cmd_access(opts).await,
        Command::Watch(args) => commands::watch::cmd_watch(opts, &args).await,
        Command::Whoami => commands::whoami::cmd_whoami(opts).await,
        Command::Exec(args) => commands::exec::cmd_exec(opts, &args).await,
    }
}
