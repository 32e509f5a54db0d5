use clap::{Parser, Subcommand};

use plant_access::models::entry::EntryKind;

/// Plant access portal: workflow proxy server and command-line client
#[derive(Parser)]
#[command(name = "plant-access", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the proxy server
    Serve {
        /// Port to bind (defaults to PLANT_ACCESS_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Show which workflow operations are configured
    Workflows,

    /// Log in through a running portal and keep the session locally
    Login {
        #[arg(long)]
        user: String,
        #[arg(long, env = "PLANT_ACCESS_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Print the logged-in user
    Whoami,

    /// Drop the local session
    Logout,

    /// List the people or vehicles registered under a request code
    Entries {
        #[arg(long)]
        solicitud: String,
        #[arg(long, value_enum, default_value_t = EntryKind::Person)]
        kind: EntryKind,
    },
}
