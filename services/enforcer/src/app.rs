//! Enforcement HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! Every collaborator (store, session verifier, identity resolver, manifest
//! builder, overlay composer) is constructed once by the caller and shared
//! through [`AppState`].
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::auth::{SessionVerifier, TenantIdentityResolver};
use crate::observability;
use crate::overlay::OverlayComposer;
use crate::provisioning::ProvisioningBuilder;
use crate::registry::DeviceRegistry;
use crate::store::EnforcementStore;
use crate::vendors::VendorOnboarding;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub api_version: String,
    pub store: Arc<dyn EnforcementStore>,
    pub sessions: Arc<SessionVerifier>,
    pub resolver: Arc<TenantIdentityResolver>,
    pub registry: DeviceRegistry,
    pub vendors: VendorOnboarding,
    pub provisioning: Arc<ProvisioningBuilder>,
    pub overlay: Arc<dyn OverlayComposer>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn EnforcementStore>,
        sessions: SessionVerifier,
        resolver: TenantIdentityResolver,
        provisioning: ProvisioningBuilder,
        overlay: Arc<dyn OverlayComposer>,
        default_country_code: &str,
    ) -> Self {
        Self {
            api_version: "v1".to_string(),
            registry: DeviceRegistry::new(store.clone()),
            vendors: VendorOnboarding::new(store.clone(), default_country_code),
            store,
            sessions: Arc::new(sessions),
            resolver: Arc::new(resolver),
            provisioning: Arc::new(provisioning),
            overlay,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/v1/system/info",
            axum::routing::get(api::system::system_info),
        )
        .route(
            "/v1/system/health",
            axum::routing::get(api::system::system_health),
        )
        .route("/v1/me", axum::routing::get(api::dashboard::me))
        .route(
            "/v1/dashboard/stats",
            axum::routing::get(api::dashboard::dashboard_stats),
        )
        .route(
            "/v1/vendors",
            axum::routing::get(api::vendors::list_vendors).post(api::vendors::register_vendor),
        )
        .route(
            "/v1/vendors/:vendor_id",
            axum::routing::get(api::vendors::get_vendor),
        )
        .route(
            "/v1/vendors/:vendor_id/status",
            axum::routing::post(api::vendors::set_vendor_status),
        )
        .route(
            "/v1/devices",
            axum::routing::get(api::devices::list_devices).post(api::devices::enroll_device),
        )
        .route(
            "/v1/devices/:device_id",
            axum::routing::get(api::devices::get_device),
        )
        .route(
            "/v1/devices/:device_id/lock",
            axum::routing::post(api::devices::lock_device),
        )
        .route(
            "/v1/devices/:device_id/unlock",
            axum::routing::post(api::devices::unlock_device),
        )
        .route(
            "/v1/devices/:device_id/overlay-message",
            axum::routing::post(api::devices::overlay_message),
        )
        .route(
            "/v1/devices/:device_id/provisioning",
            axum::routing::get(api::devices::provisioning_manifest),
        )
        .route(
            "/v1/agent/devices/:device_id/state",
            axum::routing::get(api::agent::device_state),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/v1/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
