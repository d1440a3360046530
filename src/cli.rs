use crate::session::TokenPolicy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "userdesk")]
#[command(about = "Manage user records behind an identity-provider sign-in", long_about = None)]
pub struct Args {
    #[arg(
        long = "api-url",
        global = true,
        help = "Base URL of the user API (e.g., http://localhost:3000)"
    )]
    pub api_url: Option<String>,

    #[arg(
        long = "token-policy",
        value_enum,
        global = true,
        help = "How request tokens are obtained"
    )]
    pub token_policy: Option<TokenPolicy>,

    #[arg(
        long = "storage-dir",
        global = true,
        help = "Directory holding the persisted session"
    )]
    pub storage_dir: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", global = true, help = "Log request details to stderr")]
    pub verbose: bool,

    #[arg(long = "config-init", help = "Write an example config file and exit")]
    pub config_init: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Sign in with the identity provider
    Login,
    /// Sign out and clear the stored session
    Logout,
    /// Show the signed-in identity
    Whoami,
    /// List all users
    List,
    /// Create a user
    Add { name: String, email: String },
    /// Change a user's name and email
    Update {
        id: String,
        name: String,
        email: String,
    },
    /// Delete a user
    Delete {
        id: String,
        #[arg(short = 'y', long = "yes", help = "Do not ask for confirmation")]
        yes: bool,
    },
    /// Interactive session (the default)
    Shell,
}
