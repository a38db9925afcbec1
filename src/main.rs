use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::info;
use tracing_subscriber::EnvFilter;

use scoresheet::auth::Passwords;
use scoresheet::config::ServerConfig;
use scoresheet::server::{AppState, create_router};
use scoresheet::service::accounts;
use scoresheet::store::{SqliteStore, Store};

const GENERATED_PASSWORD_LEN: usize = 16;

#[derive(Parser)]
#[command(name = "scoresheet")]
#[command(about = "A scoreboard server for team competitions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to [default: 127.0.0.1]
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to [default: 8080]
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and uploads [default: ./data]
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// TOML config file. Flags override its values.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Create the database and the first admin account
    Init {
        /// Data directory for the database and uploads
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Skip interactive prompts and generate the admin password
        #[arg(long)]
        non_interactive: bool,

        /// Admin username
        #[arg(long, default_value = "admin")]
        username: String,

        /// Admin email
        #[arg(long, default_value = "admin@example.com")]
        email: String,
    },

    /// Upgrade an existing database to the latest schema
    Migrate {
        /// Data directory for the database and uploads
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

fn generate_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LEN)
        .map(char::from)
        .collect()
}

fn db_path(data_dir: &Path) -> PathBuf {
    ServerConfig {
        data_dir: data_dir.to_path_buf(),
        ..ServerConfig::default()
    }
    .db_path()
}

fn open_store(data_dir: &Path) -> anyhow::Result<SqliteStore> {
    fs::create_dir_all(data_dir)?;
    Ok(SqliteStore::new(db_path(data_dir))?)
}

struct AdminCredentials {
    username: String,
    email: String,
    password: String,
}

fn prompt_credentials(username: String, email: String) -> anyhow::Result<AdminCredentials> {
    let username = inquire::Text::new("Admin username:")
        .with_default(&username)
        .with_validator(|input: &str| {
            if input.trim().is_empty() {
                Err("Username cannot be empty".into())
            } else if input.contains(char::is_whitespace) {
                Err("Username cannot contain whitespace".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;

    let email = inquire::Text::new("Admin email:")
        .with_default(&email)
        .prompt()?;

    let password = inquire::Password::new("Admin password:")
        .with_validator(|input: &str| {
            if input.chars().count() < 6 {
                Err("Password must be at least 6 characters".into())
            } else {
                Ok(inquire::validator::Validation::Valid)
            }
        })
        .prompt()?;

    Ok(AdminCredentials {
        username,
        email,
        password,
    })
}

fn run_init(
    data_dir: &Path,
    non_interactive: bool,
    username: String,
    email: String,
) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    store.initialize()?;

    if store.has_admin()? {
        bail!(
            "Server already initialized. An admin account exists in {}",
            data_dir.display()
        );
    }

    let (credentials, generated) = if non_interactive {
        let credentials = AdminCredentials {
            username,
            email,
            password: generate_password(),
        };
        (credentials, true)
    } else {
        (prompt_credentials(username, email)?, false)
    };

    let admin = accounts::create_admin(
        &store,
        &Passwords::new(),
        &credentials.username,
        &credentials.email,
        &credentials.password,
    )?;

    println!();
    println!("========================================");
    println!("Created admin '{}'", admin.username);
    if generated {
        println!("Password (save this, it won't be shown again):");
        println!();
        println!("  {}", credentials.password);
    }
    println!();
    println!("Database: {}", db_path(data_dir).display());
    println!("========================================");
    println!();

    Ok(())
}

fn run_migrate(data_dir: &Path) -> anyhow::Result<()> {
    if !db_path(data_dir).exists() {
        bail!(
            "No database at {}. Run 'scoresheet admin init' first.",
            db_path(data_dir).display()
        );
    }

    let store = open_store(data_dir)?;
    let before = store.schema_version()?;
    store.initialize()?;
    let after = store.schema_version()?;

    if before == after {
        println!("Database already at schema version {after}");
    } else {
        println!("Migrated database from schema version {before} to {after}");
    }
    Ok(())
}

fn load_config(
    config_path: Option<&Path>,
    host: Option<String>,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<ServerConfig> {
    let mut config = match config_path {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
    if let Some(data_dir) = data_dir {
        config.data_dir = data_dir;
    }

    config.validate()?;
    Ok(config)
}

async fn run_serve(config: ServerConfig) -> anyhow::Result<()> {
    if !config.db_path().exists() {
        bail!("Server not initialized. Run 'scoresheet admin init' first to create the database.");
    }

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;
    if !store.has_admin()? {
        bail!("Server not initialized. Run 'scoresheet admin init' first to create an admin.");
    }

    fs::create_dir_all(config.uploads_dir())?;
    info!("Team images stored in {}", config.uploads_dir().display());

    let addr = config.socket_addr()?;
    let state = Arc::new(AppState::new(Arc::new(store), config));
    let app = create_router(state);

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("scoresheet=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
                username,
                email,
            } => {
                run_init(&data_dir, non_interactive, username, email)?;
            }
            AdminCommands::Migrate { data_dir } => {
                run_migrate(&data_dir)?;
            }
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            config,
        } => {
            let config = load_config(config.as_deref(), host, port, data_dir)?;
            run_serve(config).await?;
        }
    }

    Ok(())
}
