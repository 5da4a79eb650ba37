//! Observability wiring for the enforcement service.
//!
//! # Purpose
//! Installs the tracing subscriber (with OTLP export when an endpoint is
//! configured), extracts W3C trace context from inbound requests, and serves
//! the Prometheus recorder that carries the `emilock_*` metrics.
//!
//! # Notes
//! Every installer runs at most once per process so tests can call
//! [`init_observability`] freely.
use anyhow::{Context, Result};
use axum::http::HeaderMap;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::propagation::Extractor;
use opentelemetry::trace::TracerProvider;
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const SERVICE_NAME: &str = "emilock-enforcer";

/// Environment attributes copied onto the OTLP resource when present.
const RESOURCE_ENV: [(&str, &str); 2] = [
    ("CLOUD_REGION", "cloud.region"),
    ("DEPLOYMENT_ENVIRONMENT", "deployment.environment"),
];

static SUBSCRIBER: OnceLock<()> = OnceLock::new();
static PROPAGATOR: OnceLock<()> = OnceLock::new();
static RECORDER: OnceLock<PrometheusHandle> = OnceLock::new();

pub fn init_observability(service_name: &str) -> Result<PrometheusHandle> {
    install_propagator();
    SUBSCRIBER.get_or_init(|| install_subscriber(service_name));
    metrics_handle()
}

fn install_propagator() {
    PROPAGATOR.get_or_init(|| global::set_text_map_propagator(TraceContextPropagator::new()));
}

fn install_subscriber(service_name: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let base = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer());
    let installed = match otlp_provider(service_name) {
        Some(provider) => base
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer(SERVICE_NAME)))
            .try_init(),
        None => base.try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// OTLP export is enabled only when an endpoint is configured.
fn otlp_provider(service_name: &str) -> Option<SdkTracerProvider> {
    std::env::var_os("OTEL_EXPORTER_OTLP_ENDPOINT")?;
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .build()
        .ok()?;
    let resource = Resource::builder_empty()
        .with_attributes(resource_attributes(service_name))
        .build();
    Some(
        SdkTracerProvider::builder()
            .with_batch_exporter(exporter)
            .with_resource(resource)
            .build(),
    )
}

fn resource_attributes(service_name: &str) -> Vec<KeyValue> {
    let instance = std::env::var("EMILOCK_SERVICE_INSTANCE_ID")
        .or_else(|_| std::env::var("HOSTNAME"))
        .ok()
        .map(|value| KeyValue::new("service.instance.id", value));
    let from_env = RESOURCE_ENV.iter().filter_map(|(env_key, attr_key)| {
        std::env::var(env_key)
            .ok()
            .map(|value| KeyValue::new(*attr_key, value))
    });
    std::iter::once(KeyValue::new("service.name", service_name.to_string()))
        .chain(instance)
        .chain(from_env)
        .collect()
}

/// Parent context for a request span, from `traceparent`/`tracestate`.
pub fn trace_context_from_headers(headers: &HeaderMap) -> opentelemetry::Context {
    install_propagator();
    global::get_text_map_propagator(|propagator| propagator.extract(&RequestHeaders(headers)))
}

struct RequestHeaders<'a>(&'a HeaderMap);

impl Extractor for RequestHeaders<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key)?.to_str().ok()
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(|name| name.as_str()).collect()
    }
}

pub async fn serve_metrics(handle: PrometheusHandle, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "metrics listening");
    serve_metrics_on(handle, listener, std::future::pending()).await
}

async fn serve_metrics_on<F>(
    handle: PrometheusHandle,
    listener: tokio::net::TcpListener,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let router = axum::Router::new().route(
        "/metrics",
        axum::routing::get(move || std::future::ready(handle.render())),
    );
    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
}

fn metrics_handle() -> Result<PrometheusHandle> {
    if let Some(handle) = RECORDER.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("install prometheus recorder")?;
    describe_metrics();
    Ok(RECORDER.get_or_init(|| handle).clone())
}

fn describe_metrics() {
    metrics::describe_counter!(
        "emilock_devices_enrolled_total",
        "Devices enrolled by vendors"
    );
    metrics::describe_counter!(
        "emilock_lock_commands_total",
        "Lock and unlock commands that changed device state"
    );
    metrics::describe_counter!(
        "emilock_scope_denials_total",
        "Requests refused for lack of tenant scope"
    );
    metrics::describe_counter!(
        "emilock_overlay_fallbacks_total",
        "Overlay messages served from the local template"
    );
    metrics::describe_gauge!("emilock_devices_total", "Devices held by the store");
    metrics::describe_gauge!("emilock_vendors_total", "Vendors held by the store");
}
