use clap::Parser;
use colored::*;
use std::process;
use std::sync::Arc;

use userdesk::api::HttpRecordApi;
use userdesk::auth::OAuthProvider;
use userdesk::cli::{Args, Command};
use userdesk::commands::run_command;
use userdesk::config::{Config, FileConfig};
use userdesk::session::{CredentialStore, FilesystemCredentialStore, SessionManager};
use userdesk::{logging, Dashboard};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Handle --config-init
    if args.config_init {
        let Some(path) = FileConfig::user_config_dir().map(|dir| dir.join("userdesk.yaml")) else {
            eprintln!("{} cannot determine the home directory", "Error:".red());
            process::exit(1);
        };
        match FileConfig::write_example(&path) {
            Ok(true) => println!("{} {}", "Wrote example config to".green(), path.display()),
            Ok(false) => println!("{} {}", "Config already exists:".yellow(), path.display()),
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red(), e);
                process::exit(1);
            }
        }
        return;
    }

    // Load configuration
    let config = match Config::from_env_and_args(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };
    logging::init(config.verbose);
    tracing::debug!(
        api_url = %config.api_url,
        token_policy = %config.token_policy,
        storage_dir = %config.storage_dir.display(),
        "configuration loaded"
    );

    let api = match HttpRecordApi::new(&config.api_url) {
        Ok(api) => api,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            process::exit(1);
        }
    };

    let store: Arc<dyn CredentialStore> =
        Arc::new(FilesystemCredentialStore::new(&config.storage_dir));
    let provider = OAuthProvider::new(config.oauth.clone());
    let session = Arc::new(SessionManager::new(provider, store, config.token_policy));
    session.start_listener();

    let mut dashboard = Dashboard::new(session, api);
    let command = args.command.unwrap_or(Command::Shell);

    if let Err(e) = run_command(&mut dashboard, command).await {
        eprintln!("{} {}", "Error:".red(), e);
        process::exit(1);
    }
}
