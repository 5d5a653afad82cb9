use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// vbd — terminal front end for the VirtuBeauty dashboard state engine.
#[derive(Parser, Debug)]
#[command(name = "vbd", version)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,

    /// Path to the persistent key-value store (omit for in-memory)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the auto-refreshing dashboard loop
    Dashboard(DashboardArgs),

    /// Sign in with the wallet from PRIVATE_KEY
    SignIn,

    /// Sign out and clear the local session
    SignOut,
}

/// Arguments for the `dashboard` subcommand.
#[derive(Parser, Debug)]
pub struct DashboardArgs {
    /// Starting tab (prototype, latest, sentient, favorites); unknown values
    /// fall back to the persisted tab
    #[arg(long)]
    pub tab: Option<String>,

    /// Starting page
    #[arg(long, default_value = "1")]
    pub page: u32,
}
