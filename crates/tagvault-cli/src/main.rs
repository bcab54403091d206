//! CLI entry point.
//!
//! Loads configuration, checks the principal against the access policy,
//! then dispatches to a handler. Ctrl-C cancels in-flight coordinator
//! rounds; whatever already completed is still reported.

use clap::{CommandFactory, Parser};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use tagvault_cli::{
    AccessPolicy, Cli, CliConfig, CliContext, Commands, Principal, bootstrap, exit_code_for,
    handlers,
};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code_for(&e));
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let config = CliConfig::from_arg(cli.config)?.load()?;

    let principal = Principal::current()?;
    AccessPolicy::new(config.authorized_principals.iter().cloned()).authorize(&principal)?;
    debug!(principal = %principal.id, "Access granted");

    let ctx = bootstrap(&config)?;
    spawn_interrupt_handler(&ctx);
    dispatch(&ctx, command).await
}

fn spawn_interrupt_handler(ctx: &CliContext) {
    let cancel = ctx.cancel().clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; cancelling outstanding attempts");
            cancel.cancel();
        }
    });
}

async fn dispatch(ctx: &CliContext, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Channels {
            refresh,
            usable,
            json,
        } => handlers::channels::execute(ctx, refresh, usable, json).await,
        Commands::List { channel } => handlers::list::execute(ctx, &channel).await,
        Commands::Save { channel, file } => handlers::save::execute(ctx, &channel, &file).await,
        Commands::Rename {
            channel,
            old_file,
            new_file,
        } => handlers::rename::execute(ctx, &channel, &old_file, &new_file).await,
        Commands::Delete { channel, file } => handlers::delete::execute(ctx, &channel, &file).await,
        Commands::Repair { channel, file } => handlers::repair::execute(ctx, &channel, &file).await,
        Commands::Slot { date, time } => handlers::slot::execute(ctx, &date, &time).await,
        Commands::InitSchema => handlers::init_schema::execute(ctx).await,
    }
}
