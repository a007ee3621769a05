// zahroshop/src/main.rs

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web as actix_data, App, HttpServer};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

use zahroshop::config::{AppConfig, LogFormat, StorageBackend};
use zahroshop::errors::{AppError, Result as AppResult};
use zahroshop::repo::{MemoryStore, PgStore, Repositories};
use zahroshop::services::push_mock::MockPushSink;
use zahroshop::services::seed;
use zahroshop::state::AppState;
use zahroshop::web::configure_app_routes;

fn init_tracing(format: LogFormat) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_span_events(FmtSpan::CLOSE);
  match format {
    LogFormat::Json => builder.json().init(),
    LogFormat::Pretty => builder.init(),
  }
}

async fn build_repositories(config: &AppConfig) -> AppResult<Repositories> {
  match config.storage_backend {
    StorageBackend::Postgres => {
      let url = config
        .database_url
        .as_deref()
        .ok_or_else(|| AppError::Config("DATABASE_URL is not set.".to_string()))?;
      let store = PgStore::connect(url, config.db_max_connections).await?;
      tracing::info!("Connected to PostgreSQL.");
      Ok(Repositories::from_store(Arc::new(store)))
    }
    StorageBackend::Memory => {
      let store = Arc::new(MemoryStore::new());
      seed::seed_admin(&store, &config.seed_admin_token);
      tracing::warn!("Using the in-memory store; data is lost on shutdown.");
      Ok(Repositories::from_store(store))
    }
  }
}

async fn bootstrap(config: Arc<AppConfig>) -> AppResult<AppState> {
  let repos = build_repositories(&config).await?;
  if config.seed_db {
    seed::seed_catalog(repos.products.as_ref()).await?;
  }
  let notifier = Arc::new(MockPushSink::new(
    repos.devices.clone(),
    Duration::from_millis(config.push_simulated_latency_ms),
  ));
  let state = AppState::new(repos, config, notifier)?;
  tracing::info!(flows = ?state.flows.flow_names(), "Flows registered.");
  Ok(state)
}

fn to_io_error(err: AppError) -> std::io::Error {
  std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
  let app_config = match AppConfig::from_env() {
    Ok(cfg) => Arc::new(cfg),
    Err(e) => {
      // The subscriber is not installed yet.
      eprintln!("Failed to load application configuration: {}", e);
      return Err(to_io_error(e));
    }
  };
  init_tracing(app_config.log_format);
  tracing::info!("Starting zahroshop server...");

  let app_state = bootstrap(app_config.clone()).await.map_err(|e| {
    tracing::error!(error = %e, "Startup failed.");
    to_io_error(e)
  })?;

  let server_address = app_config.bind_address();
  tracing::info!("Binding server to {}...", server_address);

  HttpServer::new(move || {
    App::new()
      .app_data(actix_data::Data::new(app_state.clone()))
      .wrap(tracing_actix_web::TracingLogger::default())
      .configure(configure_app_routes)
  })
  .bind(&server_address)?
  .run()
  .await
}
