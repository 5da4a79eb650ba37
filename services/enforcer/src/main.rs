//! EMI enforcement HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, session verification, and the HTTP router,
//! then serves the API alongside the Prometheus metrics endpoint.
//!
//! # Notes
//! The `build_state` helper keeps wiring testable and minimizes main setup logic.
use anyhow::Context;
use enforcer::app::{AppState, build_router};
use enforcer::auth::{SessionVerifier, TenantIdentityResolver};
use enforcer::config::{EnforcerConfig, StorageBackend};
use enforcer::observability;
use enforcer::overlay;
use enforcer::provisioning::ProvisioningBuilder;
use enforcer::store::{EnforcementStore, memory::InMemoryStore, postgres::PostgresStore};
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EnforcerConfig::from_env_or_yaml().context("enforcer config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: EnforcerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability(observability::SERVICE_NAME)?;
    let state = build_state(&config).await?;
    tracing::info!(
        backend = state.store.backend_name(),
        durable = state.store.is_durable(),
        "enforcement store ready"
    );
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);
    let addr = config.bind_addr;
    tracing::info!(%addr, "enforcer listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: &EnforcerConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn EnforcementStore> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(
                PostgresStore::connect(pg)
                    .await
                    .context("connect postgres store")?,
            )
        }
    };
    let composer = overlay::composer_from_config(&config.overlay).context("overlay composer")?;

    Ok(AppState::new(
        store,
        SessionVerifier::from_config(&config.session),
        TenantIdentityResolver::from_config(&config.owners),
        ProvisioningBuilder::from_config(&config.provisioning),
        Arc::from(composer),
        &config.owners.default_country_code,
    ))
}
