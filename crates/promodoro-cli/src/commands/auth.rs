use clap::Subcommand;
use promodoro_core::api::{clear_token, load_token, store_token};
use promodoro_core::{ApiClient, Config};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in and store the bearer token in the OS keyring
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Remove the stored token
    Logout,
    /// Show whether a token is stored
    Status,
}

pub fn run(action: AuthAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        AuthAction::Login { email, password } => {
            let config = Config::load_or_default();
            let api = ApiClient::new(&config.api.base_url, None)?;
            let rt = tokio::runtime::Runtime::new()?;
            let token = rt.block_on(api.login(&email, &password))?;
            store_token(&token)?;
            println!("logged in as {email}");
        }
        AuthAction::Logout => {
            clear_token()?;
            println!("logged out");
        }
        AuthAction::Status => {
            if load_token().is_some() {
                println!("logged in");
            } else {
                println!("not logged in");
            }
        }
    }
    Ok(())
}
