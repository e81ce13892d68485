//! regdash CLI - Registration dashboard in the terminal
//!
//! This is the main entry point for the regdash command-line tool, which provides:
//! - Paged, searchable, sortable listings of every resource (`list`)
//! - Summary cards over a whole collection (`summary`)
//! - Create, update and confirmed delete of single records
//! - Periodic refresh with change reporting (`watch`)
//! - An interactive dashboard with one tab per resource (`tui`)

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

mod commands;
mod config;
mod tracing_setup;
mod tui;
mod ui;

use commands::Session;
use tracing_setup::TracingConfig;

#[derive(Parser, Debug)]
#[command(
    name = "regdash",
    author,
    version,
    about = "Registration dashboard: list, search, edit and delete students, programs, agents and inscriptions",
    long_about = "Client for the registration backend. Every list is fetched whole and \
                  searched, sorted and paged locally; writes go to the backend and are \
                  applied to the local snapshot when they succeed."
)]
struct Cli {
    /// Backend base URL (overrides api.base_url)
    #[arg(long, global = true, env = "REGDASH_API_URL")]
    endpoint: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, global = true)]
    insecure: bool,

    /// Debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Export traces over OTLP (requires the telemetry feature)
    #[arg(long, global = true)]
    otel: bool,

    /// Suppress progress spinners (for script consumption)
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the known resources
    Resources,
    /// Show one page of a resource
    List(commands::list::ListArgs),
    /// Summary cards for a resource
    Summary(commands::list::SummaryArgs),
    /// Show the fields and validation rules of a resource
    Schema(commands::list::SchemaArgs),
    /// Create a record
    Create(commands::edit::CreateArgs),
    /// Change fields of a record
    Update(commands::edit::UpdateArgs),
    /// Delete a record after retyping its identity
    Delete(commands::edit::DeleteArgs),
    /// Refresh a resource periodically and report changes
    Watch(commands::watch::WatchArgs),
    /// Interactive dashboard
    Tui(tui::TuiArgs),
    /// Manage regdash configuration (init, path, show, validate)
    Config(config::ConfigArgs),
    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(Parser, Debug)]
struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    shell: Shell,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)] // PowerShell is a proper noun, not a suffix
enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let tracing_config = TracingConfig {
        debug: cli.debug,
        otel: cli.otel,
    };
    if matches!(cli.command, Commands::Tui(_)) {
        let log = regdash_core::DashConfig::home_dir().join("logs").join("tui.log");
        tracing_setup::init_file(&tracing_config, &log).ok();
    } else {
        tracing_setup::init(&tracing_config).ok();
    }

    // Initialize UI quiet mode from flag, env var, and TTY detection
    ui::init_quiet_mode(cli.quiet);

    let result = run(cli).await;
    tracing_setup::shutdown_otel();
    match result {
        // the console sink already printed the failure
        Err(err) if err.is::<commands::Reported>() => std::process::exit(1),
        other => other,
    }
}

async fn run(cli: Cli) -> Result<()> {
    let session = || Session::load(cli.endpoint.clone(), cli.insecure);

    match cli.command {
        Commands::Resources => commands::run_resources()?,
        Commands::Schema(args) => commands::run_schema(args)?,
        Commands::List(args) => commands::run_list(&session()?, args).await?,
        Commands::Summary(args) => commands::run_summary(&session()?, args).await?,
        Commands::Create(args) => commands::run_create(&session()?, args).await?,
        Commands::Update(args) => commands::run_update(&session()?, args).await?,
        Commands::Delete(args) => commands::run_delete(&session()?, args).await?,
        Commands::Watch(args) => commands::run_watch(&session()?, args).await?,
        Commands::Tui(args) => tui::launch(&session()?, args).await?,
        Commands::Config(args) => config::run_config(args)?,
        Commands::Completions(args) => run_completions(args)?,
    }
    Ok(())
}

fn run_completions(args: CompletionsArgs) -> Result<()> {
    use clap::CommandFactory;
    use clap_complete::{generate, Shell as CompletionShell};
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();

    let shell = match args.shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    };

    generate(shell, &mut cmd, bin_name, &mut io::stdout());

    Ok(())
}
