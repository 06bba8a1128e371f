#![forbid(unsafe_code)]

use std::net::SocketAddr;

use ensemble_server::{build_router, init_tracing, AppConfig};
use tokio::net::TcpListener;

fn env_or_default<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    std::env::var(name).map_or_else(
        |_| Ok(default),
        |value| {
            value
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("invalid {name} value {value:?}: {e}"))
        },
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let defaults = AppConfig::default();
    let app_config = AppConfig {
        default_team_max_members: env_or_default(
            "ENSEMBLE_DEFAULT_TEAM_MAX_MEMBERS",
            defaults.default_team_max_members,
        )?,
        default_project_max_members: env_or_default(
            "ENSEMBLE_DEFAULT_PROJECT_MAX_MEMBERS",
            defaults.default_project_max_members,
        )?,
        list_limit_max: env_or_default("ENSEMBLE_LIST_LIMIT_MAX", defaults.list_limit_max)?,
        locale: std::env::var("ENSEMBLE_LOCALE").unwrap_or_else(|_| defaults.locale.clone()),
        ..defaults
    };
    let app = build_router(&app_config)?;
    let addr = std::env::var("ENSEMBLE_BIND_ADDR")
        .unwrap_or_else(|_| String::from("0.0.0.0:3000"))
        .parse::<SocketAddr>()
        .map_err(|e| anyhow::anyhow!("invalid ENSEMBLE_BIND_ADDR: {e}"))?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, project = ensemble_core::project_name(), "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
