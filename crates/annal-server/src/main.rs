//! annal server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite document store and the filesystem blob store, performs the one
//! full archive fetch, and serves the JSON API plus the stored PDFs.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash` in config.toml:
//!
//! ```
//! cargo run -p annal-server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use annal_api::{api_router, AppState, AuthConfig};
use annal_blob_fs::FsBlobStore;
use annal_core::{catalog::Catalog, store::ArchiveStore as _};
use annal_store_sqlite::SqliteStore;

/// Public URL prefix under which the blob root is served. Part of every
/// issued retrieval URL, so changing it orphans stored references.
const FILES_PREFIX: &str = "/files";

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised once at startup from
/// `config.toml` plus `ANNAL_*` environment overrides.
#[derive(Deserialize, Clone)]
struct ServerConfig {
  host:               String,
  port:               u16,
  store_path:         PathBuf,
  blob_dir:           PathBuf,
  auth_password_hash: String,
}

#[derive(Parser)]
#[command(author, version, about = "annal pastpaper archive server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password_from_stdin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("ANNAL"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let blob_dir = expand_tilde(&server_cfg.blob_dir);

  // Open the stores.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;
  let blobs = FsBlobStore::new(&blob_dir, FILES_PREFIX);

  // The one full fetch. A failure is logged and leaves the list empty; the
  // refresh route can be used once the backend recovers.
  let mut catalog = Catalog::new();
  match store.list_archives().await {
    Ok(records) => {
      tracing::info!(count = records.len(), "loaded archive records");
      catalog.replace_all(records);
    }
    Err(e) => {
      tracing::error!(error = %e, "initial archive fetch failed; starting empty");
    }
  }

  // Build application state.
  let state = AppState {
    store:   Arc::new(store),
    blobs:   Arc::new(blobs),
    catalog: Arc::new(RwLock::new(catalog)),
    auth:    Arc::new(AuthConfig {
      password_hash: server_cfg.auth_password_hash.clone(),
    }),
  };

  let app = axum::Router::new()
    .nest("/api", api_router(state))
    .nest_service(FILES_PREFIX, ServeDir::new(&blob_dir))
    .layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin.
fn read_password_from_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
