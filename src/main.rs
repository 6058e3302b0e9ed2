//! melodeck - a self-hosted music catalog and playlist server
//!
//! Users sign up, upload audio, and curate playlists and personal track lists
//! over a JSON API secured with rotating JWT sessions.

mod api;
mod config;
mod core;
mod db;
mod models;
mod utils;

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::{Paths, Settings};
use crate::core::{CatalogService, TokenService};
use crate::db::{CatalogStore, MemoryStore, SqliteStore};
use crate::utils::audio::AudioStorage;
use crate::utils::auth::PasswordHasher;

/// melodeck - self-hosted music catalog server
#[derive(Parser, Debug)]
#[command(name = "melodeck")]
#[command(version)]
#[command(about = "A self-hosted music catalog and playlist server")]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 1970)]
    port: u16,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,

    /// Path to config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep everything in memory instead of the sqlite database
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::new(format!("{},sqlx=warn", log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("melodeck v{} starting...", env!("CARGO_PKG_VERSION"));

    let paths = Paths::new(args.config)?;
    info!("Config directory: {:?}", paths.config_dir());

    let mut settings = Settings::load(&paths.settings_path())?;
    settings.apply_env_overrides();

    let store = open_store(&paths, &settings, args.memory).await?;

    let service = CatalogService::new(
        store,
        TokenService::new(
            &settings.jwt_secret,
            settings.access_token_ttl_secs,
            settings.refresh_token_ttl_secs,
        ),
        PasswordHasher::new(settings.hash_iterations),
        settings.default_role,
    );
    let audio = AudioStorage::new(paths.audio_dir());
    info!("Audio directory: {:?}", audio.dir());

    start_server(args.host, args.port, service, audio).await
}

/// Open the configured backend and insert any seed artists
async fn open_store(
    paths: &Paths,
    settings: &Settings,
    in_memory: bool,
) -> Result<Arc<dyn CatalogStore>> {
    if in_memory {
        info!("Using in-memory store; nothing will be persisted");
        let store = MemoryStore::new();
        for name in &settings.seed_artists {
            let id = store.ensure_artist(name);
            info!("Artist {:?} has id {}", name, id);
        }
        return Ok(Arc::new(store));
    }

    let db_path = paths.db_path();
    info!("Opening database at {:?}", db_path);
    let store = SqliteStore::open(&db_path).await?;
    for name in &settings.seed_artists {
        let id = store.ensure_artist(name).await?;
        info!("Artist {:?} has id {}", name, id);
    }
    Ok(Arc::new(store))
}

async fn start_server(
    host: String,
    port: u16,
    service: CatalogService,
    audio: AudioStorage,
) -> Result<()> {
    use actix_cors::Cors;
    use actix_web::{middleware, web, App, HttpServer};

    let service = web::Data::new(service);
    let audio = web::Data::new(audio);

    let addr = format!("{}:{}", host, port);
    info!("Server listening on http://{}", addr);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .app_data(service.clone())
            .app_data(audio.clone())
            .configure(api::configure)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
