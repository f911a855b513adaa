/// Spindle Server - album catalog and review API
use clap::{Parser, Subcommand};
use spindle_core::types::validate_new_password;
use spindle_core::{CreateUser, Role};
use spindle_server::{config::ServerConfig, create_router, services::AuthService, state::AppState};
use sqlx::SqlitePool;
use std::{net::SocketAddr, path::PathBuf, sync::Arc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spindle-server")]
#[command(about = "Spindle album catalog and review server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create a new account
    AddUser {
        /// Display name
        #[arg(long)]
        name: String,
        /// Login email
        #[arg(long)]
        email: String,
        /// Public handle
        #[arg(short, long)]
        username: String,
        /// Password
        #[arg(short, long)]
        password: String,
        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },
    /// List all accounts
    ListUsers,
    /// Recompute every album's rating summary from its reviews
    RepairRatings,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spindle_server=info,spindle_storage=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config = ServerConfig::load_from(&cli.config)?;

    match cli.command {
        Commands::Serve => serve(config).await?,
        Commands::AddUser {
            name,
            email,
            username,
            password,
            admin,
        } => {
            let role = if admin { Role::Admin } else { Role::User };
            add_user(config, name, email, username, &password, role).await?;
        }
        Commands::ListUsers => list_users(config).await?,
        Commands::RepairRatings => repair_ratings(config).await?,
    }

    Ok(())
}

async fn open_database(config: &ServerConfig) -> anyhow::Result<SqlitePool> {
    let pool = spindle_storage::create_pool(&config.storage.database_url).await?;
    spindle_storage::run_migrations(&pool).await?;
    Ok(pool)
}

fn auth_service(config: &ServerConfig) -> AuthService {
    AuthService::new(config.auth.jwt_secret.clone(), config.auth.jwt_expiration_hours)
        .with_secure_cookie(config.auth.cookie_secure)
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    config.validate()?;

    tracing::info!("Starting Spindle Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);

    let pool = open_database(&config).await?;
    tracing::info!("Database connected");

    let app_state = AppState::new(pool, Arc::new(auth_service(&config)));
    let app = create_router(app_state);

    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn add_user(
    config: ServerConfig,
    name: String,
    email: String,
    username: String,
    password: &str,
    role: Role,
) -> anyhow::Result<()> {
    validate_new_password(password, password)?;
    let pool = open_database(&config).await?;
    let password_hash = auth_service(&config).hash_password(password)?;

    let user = spindle_storage::users::create(
        &pool,
        CreateUser {
            name,
            email,
            username,
            password_hash,
            role,
            location: None,
            fav_genres: Vec::new(),
            fav_artists: Vec::new(),
        },
    )
    .await?;

    println!("Created {} {} ({})", user.role, user.username, user.id);
    Ok(())
}

async fn list_users(config: ServerConfig) -> anyhow::Result<()> {
    let pool = open_database(&config).await?;
    let users = spindle_storage::users::get_all(&pool).await?;

    println!("Users:");
    for user in users {
        let state = if user.active { "" } else { " (inactive)" };
        println!("  {} - {} <{}> [{}]{}", user.id, user.username, user.email, user.role, state);
    }

    Ok(())
}

async fn repair_ratings(config: ServerConfig) -> anyhow::Result<()> {
    let pool = open_database(&config).await?;
    let report = spindle_storage::ratings::repair_all(&pool).await?;

    for drift in &report.repaired {
        println!(
            "  {}: ({}, {}) -> ({}, {})",
            drift.album,
            drift.stored.ratings_quantity,
            drift.stored.ratings_average,
            drift.expected.ratings_quantity,
            drift.expected.ratings_average
        );
    }
    println!(
        "Checked {} albums, repaired {}",
        report.albums_checked,
        report.repaired.len()
    );

    Ok(())
}
