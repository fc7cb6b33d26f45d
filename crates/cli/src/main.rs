//! Identity store CLI - Role and user management tools.
//!
//! # Usage
//!
//! ```bash
//! # Create a role
//! idstore role create Admin
//!
//! # Register a user and grant the role
//! idstore user register -u alice -e alice@example.com -p 'correct horse'
//! idstore user grant -u alice -r Admin
//!
//! # Check a password and list the user's roles
//! idstore user login -u alice -p 'correct horse'
//! ```
//!
//! # Commands
//!
//! - `role create|delete|members` - Manage roles
//! - `user register|grant|revoke|roles|login` - Manage users
//!
//! # Environment Variables
//!
//! - `IDENTITY_MONGODB_URL` - MongoDB connection string (or `MONGODB_URL`)
//! - `IDENTITY_DB` - Database name (default: identity)
//! - `RUST_LOG` - Log filter (default: `docstore_identity=info,idstore=info`)
//!
//! Database settings may also come from a `.env` file, which is read when the
//! configuration is loaded.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use secrecy::SecretString;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::CliError;

const DEFAULT_LOG_FILTER: &str = "docstore_identity=info,idstore=info";

#[derive(Parser)]
#[command(name = "idstore")]
#[command(author, version, about = "Identity store CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage roles
    Role {
        #[command(subcommand)]
        action: RoleAction,
    },
    /// Manage users
    User {
        #[command(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand)]
enum RoleAction {
    /// Create a new role
    Create {
        /// Role name
        name: String,
    },
    /// Delete a role
    Delete {
        /// Role name
        name: String,
    },
    /// List the users holding a role
    Members {
        /// Role name
        name: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a new user with a password
    Register {
        /// User name
        #[arg(short, long)]
        user: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
    /// Add a user to a role
    Grant {
        /// User name
        #[arg(short, long)]
        user: String,

        /// Role name
        #[arg(short, long)]
        role: String,
    },
    /// Remove a user from a role
    Revoke {
        /// User name
        #[arg(short, long)]
        user: String,

        /// Role name
        #[arg(short, long)]
        role: String,
    },
    /// List a user's roles
    Roles {
        /// User name
        #[arg(short, long)]
        user: String,
    },
    /// Check a password and list the user's roles
    Login {
        /// User name
        #[arg(short, long)]
        user: String,

        /// Password
        #[arg(short, long)]
        password: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling");
            shutdown.cancel();
        }
    });

    if let Err(e) = run(cli, &cancel).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<(), CliError> {
    let stores = commands::connect().await?;

    match cli.command {
        Commands::Role { action } => match action {
            RoleAction::Create { name } => {
                commands::role::create(&stores, &name, cancel).await?;
            }
            RoleAction::Delete { name } => commands::role::delete(&stores, &name, cancel).await?,
            RoleAction::Members { name } => {
                commands::role::members(&stores, &name, cancel).await?;
            }
        },
        Commands::User { action } => match action {
            UserAction::Register {
                user,
                email,
                password,
            } => {
                let password = SecretString::from(password);
                commands::user::register(&stores, &user, &email, &password, cancel).await?;
            }
            UserAction::Grant { user, role } => {
                commands::user::grant(&stores, &user, &role, cancel).await?;
            }
            UserAction::Revoke { user, role } => {
                commands::user::revoke(&stores, &user, &role, cancel).await?;
            }
            UserAction::Roles { user } => {
                commands::user::roles(&stores, &user, cancel).await?;
            }
            UserAction::Login { user, password } => {
                let password = SecretString::from(password);
                commands::user::login(&stores, &user, &password, cancel).await?;
            }
        },
    }
    Ok(())
}
