use actix_web::middleware::NormalizePath;
use actix_web::web::Data;
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use anyhow::Context;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod directory;
mod docs;
mod engine;
mod ledger;
mod model;
mod models;
mod routes;
mod utils;

use config::{Config, LedgerBackend};
use db::init_db;

use crate::directory::{EmployeeDirectory, MySqlDirectory, StaticDirectory};
use crate::docs::ApiDoc;
use crate::engine::LeaveEngine;
use crate::engine::clock::SystemClock;
use crate::ledger::Ledger;
use crate::ledger::memory::MemoryLedger;
use crate::ledger::mysql::MySqlLedger;
use serde_json::json;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

/// Wires the ledger and directory for the configured backend.
async fn build_engine(config: &Config) -> anyhow::Result<LeaveEngine> {
    let (ledger, directory): (Arc<dyn Ledger>, Arc<dyn EmployeeDirectory>) = match &config.backend {
        LedgerBackend::MySql { database_url } => {
            let pool = init_db(database_url).await?;
            (
                Arc::new(MySqlLedger::new(pool.clone(), config.lock_timeout)),
                Arc::new(MySqlDirectory::new(pool, config.employee_cache_ttl)),
            )
        }
        LedgerBackend::Memory { employee_seed_file } => {
            warn!("in-memory ledger selected; requests are lost on restart");
            let directory = StaticDirectory::from_json_file(employee_seed_file)?;
            (
                Arc::new(MemoryLedger::new(config.lock_timeout)),
                Arc::new(directory),
            )
        }
    };

    Ok(LeaveEngine::new(
        ledger,
        directory,
        config.policy.clone(),
        Arc::new(SystemClock::new(config.business_offset)),
    ))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let engine = Data::new(build_engine(&config).await?);
    info!(
        today = %engine.today(),
        daily_cap = engine.policy().capacity.daily_cap,
        "engine ready"
    );

    // Clone values for the closure (avoid move issues)
    let server_addr = config.server_addr.clone();
    let config_data = config.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← important: wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(engine.clone())
            .app_data(Data::new(config.clone()))
            .service(health)
            // Configure the request API with auth and rate limiting
            .configure(|cfg| routes::configure(cfg, config_data.clone()))
    })
    .bind(&server_addr)
    .with_context(|| format!("cannot bind {}", server_addr))?
    .run()
    .await?;

    Ok(())
}
