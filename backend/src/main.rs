//! Backend entry-point: loads settings, wires adapters and serves the API.

use actix_web::web;
use color_eyre::eyre::Context;
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use orgreviews::inbound::http::health::HealthState;
use orgreviews::inbound::http::session_config::{BuildMode, session_settings_from_env};
#[cfg(feature = "metrics")]
use orgreviews::server::make_metrics;
use orgreviews::server::{ServerConfig, build_http_state, create_server};
use orgreviews::settings::AppSettings;

/// Application bootstrap.
#[actix_web::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("load settings")?;
    info!(?settings, "settings loaded");
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .wrap_err("session configuration")?;
    let bind_addr = settings.bind_addr()?;

    let wired = build_http_state(&settings)
        .await
        .wrap_err("build application state")?;

    let config = ServerConfig::new(session, bind_addr);
    #[cfg(feature = "metrics")]
    let config = config.with_metrics(make_metrics());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config, wired.http_state)
        .wrap_err_with(|| format!("bind {bind_addr}"))?;

    wired.reference.ensure_loaded().await;
    health_state.mark_ready();
    info!(%bind_addr, "serving");

    let result = server.await;
    health_state.mark_draining();
    result.wrap_err("server terminated")
}
