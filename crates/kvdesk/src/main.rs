use clap::{Parser, Subcommand};
use colored::Colorize;
use env_logger::Env;

mod browse;
mod config;
mod delete;
mod fmt;
mod get;
mod keys;
mod put;
mod search;
mod settings;
mod tui;

#[derive(Parser)]
#[command(name = "kvdesk")]
#[command(about = "Admin client for a key/value record store", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true, hide = true)]
    debug: bool,

    /// Store API base URL (overrides KVDESK_URL and saved settings)
    #[arg(long, global = true, value_name = "URL")]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List keys in the store
    #[command(alias = "ls")]
    Keys(keys::KeysArgs),

    /// Print a record
    Get(get::GetArgs),

    /// Save a new value for an existing key
    Put(put::PutArgs),

    /// Delete a record
    #[command(alias = "rm")]
    Delete(delete::DeleteArgs),

    /// Pretty-print or validate a record's JSON
    Fmt(fmt::FmtArgs),

    /// Search key names, or keys and values with --global
    #[command(alias = "s")]
    Search(search::SearchArgs),

    /// Show or change the store's database path
    Config(config::ConfigArgs),

    /// List a directory on the store host
    Browse(browse::BrowseArgs),

    /// Show or change client settings
    Settings(settings::SettingsArgs),

    /// Interactive terminal UI
    Tui(tui::TuiArgs),
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {e}", "Error:".red());
        for cause in e.chain().skip(1) {
            eprintln!("  {cause}");
        }
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Default level depends on --debug (overridden by RUST_LOG)
    let env = if cli.debug {
        Env::default().default_filter_or("debug")
    } else {
        Env::default().default_filter_or("error")
    };
    env_logger::Builder::from_env(env).init();

    let resolve = || -> anyhow::Result<settings::Target> {
        let target = settings::Target::resolve(cli.url.as_deref())?;
        log::debug!("Using store at {} ({})", target.url, target.source);
        Ok(target)
    };

    match cli.command {
        Commands::Settings(args) => settings::execute(args, cli.url.as_deref()),
        Commands::Keys(args) => keys::execute(args, &resolve()?),
        Commands::Get(args) => get::execute(args, &resolve()?),
        Commands::Put(args) => put::execute(args, &resolve()?),
        Commands::Delete(args) => delete::execute(args, &resolve()?),
        Commands::Fmt(args) => fmt::execute(args, &resolve()?),
        Commands::Search(args) => search::execute(args, &resolve()?),
        Commands::Config(args) => config::execute(args, &resolve()?),
        Commands::Browse(args) => browse::execute(args, &resolve()?),
        Commands::Tui(args) => tui::execute(args, &resolve()?),
    }
}
