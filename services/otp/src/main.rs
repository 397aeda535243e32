use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use vigil_core::tracing::init_tracing;
use vigil_otp::config::OtpConfig;
use vigil_otp::router::build_router;
use vigil_otp::state::AppState;
use vigil_otp::sweeper::spawn_periodic;
use vigil_otp::usecase::sweep::SweepOtpsUseCase;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = OtpConfig::from_env()?;
    config.validate()?;
    info!(?config, "otp service configured");

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let state = AppState::new(db, &config)?;

    if config.sweep_interval_secs > 0 {
        let sweep_state = state.clone();
        spawn_periodic(
            "otp-sweep",
            std::time::Duration::from_secs(config.sweep_interval_secs),
            move || {
                let state = sweep_state.clone();
                async move {
                    let usecase = SweepOtpsUseCase {
                        store: state.otp_store(),
                        clock: state.clock(),
                    };
                    usecase.execute(state.retention).await
                }
            },
        );
    }

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!("otp service listening on {addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
