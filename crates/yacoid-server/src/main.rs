//! yacoid server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store and serves the JSON API under `/api`. The remaining subcommands are
//! administrative helpers that work directly on the store.
//!
//! # Bootstrapping an admin
//!
//! ```text
//! yacoid add-user --name alice --admin
//! ```

mod settings;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use yacoid_api::AppState;
use yacoid_core::{
  lifecycle::Moderation,
  source::{NewAuthor, NewSource},
};
use yacoid_store_sqlite::SqliteStore;

use crate::settings::ServerConfig;

#[derive(Parser)]
#[command(author, version, about = "yacoid definition moderation server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (the default).
  Serve,
  /// Register a user and print their auth token.
  AddUser {
    #[arg(long)]
    name:  String,
    #[arg(long)]
    admin: bool,
  },
  /// Create an author on behalf of the user holding `--token`.
  AddAuthor {
    #[arg(long)]
    token:      String,
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name:  String,
  },
  /// Create a source from existing authors on behalf of the user holding
  /// `--token`.
  AddSource {
    #[arg(long)]
    token:  String,
    #[arg(long = "author", required = true)]
    authors: Vec<Uuid>,
  },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let server_cfg = ServerConfig::load(&cli.config)?;

  let store_path = server_cfg.store_path();
  if let Some(dir) = store_path.parent().filter(|d| !d.as_os_str().is_empty()) {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {dir:?}"))?;
  }
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(store, &server_cfg).await,
    Command::AddUser { name, admin } => {
      let (user, token) = store.add_user(&name, admin).await.context("failed to add user")?;
      tracing::info!(user_id = %user.user_id, "registered {}", user.name);
      println!("{token}");
      Ok(())
    }
    Command::AddAuthor { token, first_name, last_name } => {
      let moderation = Moderation::new(store.clone(), store);
      let identity = moderation.resolve(&token).await?;
      let author = moderation
        .create_author(NewAuthor { first_name, last_name }, &identity)
        .await?;
      println!("{}", author.author_id);
      Ok(())
    }
    Command::AddSource { token, authors } => {
      let moderation = Moderation::new(store.clone(), store);
      let identity = moderation.resolve(&token).await?;
      let source = moderation
        .create_source(NewSource { authors }, &identity)
        .await?;
      println!("{}", source.source_id);
      Ok(())
    }
  }
}

async fn serve(store: Arc<SqliteStore>, cfg: &ServerConfig) -> anyhow::Result<()> {
  let state = AppState::new(store.clone(), store, cfg.api());
  let app = Router::new()
    .nest("/api", yacoid_api::api_router(state))
    .layer(TraceLayer::new_for_http());

  let address = cfg.address();
  tracing::info!("Listening on http://{address}/api");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}
