use std::io::BufRead;

use clap::Subcommand;
use meetbook_core::integrations::graph::CLIENT_SECRET_KEY;
use meetbook_core::integrations::{keyring_store, CalendarBackend};
use meetbook_core::GraphClient;

use super::{block_on, effective_config, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Show which Graph settings are present
    Status,
    /// Fetch the organizer profile to verify credentials
    Test,
    /// Store the app client secret in the OS keyring
    Login {
        /// Client secret; read from stdin when omitted
        #[arg(long)]
        client_secret: Option<String>,
    },
    /// Remove the stored client secret
    Logout,
}

pub fn run(action: AuthAction) -> CmdResult {
    match action {
        AuthAction::Status => {
            let mut config = effective_config()?;
            let source = if config.graph.client_secret.is_some() {
                "environment"
            } else if keyring_store::get(CLIENT_SECRET_KEY)?.is_some() {
                config.graph.client_secret = Some("stored".into());
                "keyring"
            } else {
                "none"
            };

            println!("tenant:    {}", or_unset(&config.graph.tenant_id));
            println!("client id: {}", or_unset(&config.graph.client_id));
            println!("organizer: {}", or_unset(&config.graph.organizer_upn));
            println!("secret:    {source}");

            let missing = config.graph.missing();
            if missing.is_empty() {
                println!("configured");
            } else {
                println!("not configured, missing: {}", missing.join(", "));
            }
        }
        AuthAction::Test => {
            let config = effective_config()?;
            let client = GraphClient::from_config(&config)?;
            let profile = block_on(client.profile())??;
            println!("connected as {} ({})", profile.label(), client.organizer());
        }
        AuthAction::Login { client_secret } => {
            let secret = match client_secret {
                Some(secret) => secret,
                None => {
                    eprintln!("client secret:");
                    let mut line = String::new();
                    std::io::stdin().lock().read_line(&mut line)?;
                    line.trim().to_string()
                }
            };
            if secret.is_empty() {
                return Err("client secret must not be empty".into());
            }
            keyring_store::set(CLIENT_SECRET_KEY, &secret)?;
            println!("client secret stored in keyring");
        }
        AuthAction::Logout => {
            keyring_store::delete(CLIENT_SECRET_KEY)?;
            println!("client secret removed");
        }
    }
    Ok(())
}

fn or_unset(value: &str) -> &str {
    if value.trim().is_empty() {
        "(unset)"
    } else {
        value
    }
}
