//! CRM server entry point: configuration, migrations, state wiring and the
//! HTTP listener.

mod server;

use std::sync::Arc;

use actix_web::web;
use color_eyre::eyre::{Result, WrapErr};
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use crm_backend::inbound::http::health::HealthState;
use crm_backend::inbound::http::session_config::{
    BuildMode, key_fingerprint, session_settings_from_env,
};
use crm_backend::middleware::trace::in_trace_scope;
use crm_backend::outbound::persistence::{DbPool, PoolConfig, run_migrations};
use ortho_config::OrthoConfig;
use server::{ServerConfig, ServerSettings, build_http_state, create_server};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .wrap_err("failed to load server settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("invalid session configuration")?;
    info!(key = %key_fingerprint(&session.key), "session signing key loaded");

    let database_url = settings.database_url()?;
    in_trace_scope(run_migrations(database_url))
        .await
        .wrap_err("database migrations failed")?;
    let pool = DbPool::new(PoolConfig::new(database_url).with_max_size(settings.db_pool_size()))
        .await
        .wrap_err("failed to create database pool")?;

    let http_state = build_http_state(&pool, &settings)?;
    let health_state = web::Data::new(HealthState::new().with_probe(Arc::new(pool)));

    let bind_addr = settings.bind_addr()?;
    let config = ServerConfig::new(session, bind_addr);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(if settings.metrics_enabled {
        server::crm_metrics()
    } else {
        None
    });

    info!(%bind_addr, "starting CRM server");
    create_server(health_state, http_state, config)?.await?;
    Ok(())
}
