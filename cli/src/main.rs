//! Account service — operator CLI
//!
//! Runs account lifecycle operations against the configured database.
//!
//! ```sh
//! # Run with default config (~/.config/account-service/config.toml)
//! account-cli list
//!
//! # Custom config path
//! account-cli --config /etc/account-service/config.toml register ana ana@x.com --password pw1
//!
//! # Validate config without touching the database
//! account-cli --check
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use futures_util::TryStreamExt;
use tracing::{error, info};

use account_service::infrastructure::crypto::{
    ActivationTokenIssuer, BcryptPasswordHasher, JwtTokenService,
};
use account_service::{
    init_database, init_tracing, run_migrations, AccountRepository, AccountService, AppConfig,
    CreateAccountDto, DatabaseConfig,
};

/// Account service — registration, activation and password management.
#[derive(Parser, Debug)]
#[command(
    name = "account-cli",
    version,
    about = "Manage user accounts: register, activate, reset passwords",
    long_about = "Account service CLI — runs account lifecycle operations \
                  against the configured database.\n\n\
                  Default config: ~/.config/account-service/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "ACCOUNTS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long, global = true)]
    no_migrate: bool,

    /// Skip creating the default admin account.
    #[arg(long, global = true)]
    no_admin: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Register a new account and print its activation token.
    Register {
        username: String,
        email: String,
        #[arg(long, env = "ACCOUNT_PASSWORD")]
        password: String,
    },
    /// Check credentials and print a bearer token.
    Login {
        /// Username or email.
        identity: String,
        #[arg(long, env = "ACCOUNT_PASSWORD")]
        password: String,
    },
    /// Consume an activation token.
    Activate { token: String },
    /// Reissue the activation token for an email address.
    ResendActivation { email: String },
    /// Set a new password and mark the account activated.
    ResetPassword {
        username: String,
        #[arg(long, env = "ACCOUNT_PASSWORD")]
        password: String,
    },
    /// Delete an account by username.
    Delete { username: String },
    /// Print every username.
    List,
    /// Report whether a bearer token belongs to an admin.
    IsAdmin { token: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli
        .config
        .unwrap_or_else(account_service::default_config_path);

    let loaded = AppConfig::load(&config_path);
    let mut config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => {
            let mut cfg = AppConfig::default();
            cfg.apply_env_overrides();
            cfg
        }
    };

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    // Init tracing first so subsequent logs are formatted properly
    init_tracing(&config.logging);
    match loaded {
        Ok(_) => info!("Configuration loaded from {}", config_path.display()),
        Err(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            error!("Using default configuration.");
        }
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("✅ Configuration is valid");
        println!("   Config file        : {}", config_path.display());
        println!("   Database           : {}", config.database.url);
        println!("   Log level          : {}", config.logging.level);
        println!("   Require activation : {}", config.accounts.require_activation);
        println!("   Default role       : {}", config.accounts.default_role);
        return Ok(());
    }

    let command = require_command(cli.command)?;

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig {
        url: config.database.url.clone(),
    };
    let db = init_database(&db_config).await?;
    if !cli.no_migrate {
        run_migrations(&db).await?;
    }

    // ── Service wiring ─────────────────────────────────────────
    let service = AccountService::new(
        Arc::new(AccountRepository::new(db.clone())),
        Arc::new(BcryptPasswordHasher::new(config.security.bcrypt_cost)),
        Arc::new(JwtTokenService::new(config.jwt_config())),
        ActivationTokenIssuer::new(config.security.activation_secret.clone()),
        config.accounts.clone(),
    );

    if !cli.no_admin {
        service
            .ensure_default_admin(
                &config.admin.username,
                &config.admin.email,
                &config.admin.password,
            )
            .await?;
    }

    let result = run(&service, command).await;

    if let Err(e) = db.close().await {
        error!("Error closing database connection: {}", e);
    }
    result
}

/// Everything except `--check` needs a subcommand.
fn require_command(command: Option<Command>) -> Result<Command, Box<dyn std::error::Error>> {
    command.ok_or_else(|| "no command given; see --help".into())
}

async fn run(
    service: &AccountService<AccountRepository>,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let account = service
                .register(CreateAccountDto {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("{}", serde_json::json!({
                "id": account.id,
                "username": account.username,
                "email": account.email,
                "role": account.role,
                "activation_token": account.token,
            }));
        }
        Command::Login { identity, password } => {
            let auth = service.login(&identity, &password).await?;
            println!("{}", serde_json::json!({
                "token": auth.token,
                "token_type": auth.token_type,
                "expires_in": auth.expires_in,
                "username": auth.principal.username,
                "scopes": auth.principal.scopes,
            }));
        }
        Command::Activate { token } => {
            let account = service.activate(&token).await?;
            println!("Activated {}", account.username);
        }
        Command::ResendActivation { email } => {
            let account = service.reset_activation(&email).await?;
            println!("{}", serde_json::json!({
                "username": account.username,
                "activation_token": account.token,
            }));
        }
        Command::ResetPassword { username, password } => {
            service.reset_password(&username, &password).await?;
            println!("Password reset for {}", username);
        }
        Command::Delete { username } => {
            service.delete(&username).await?;
            println!("Deleted {}", username);
        }
        Command::List => {
            let mut usernames = service.list_all_usernames().await?;
            while let Some(username) = usernames.try_next().await? {
                println!("{}", username);
            }
        }
        Command::IsAdmin { token } => {
            println!("{}", service.is_admin(&token).await?);
        }
    }
    Ok(())
}
