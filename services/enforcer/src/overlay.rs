//! Lock-screen message composition.
//!
//! # Purpose
//! Suggests the text shown on a locked device. An external text-generation
//! service can write it; when that service is missing, slow, or returns
//! nothing useful, a fixed template embedding the same fields is used, so a
//! suggestion is never empty.
//!
//! Composing a message never locks a device. Callers pass the result to a
//! lock command if they want it applied.
use crate::config::OverlayConfig;
use crate::model::{Device, Vendor};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverlayRequest {
    pub device_name: String,
    pub shop_name: String,
    pub owner_name: String,
    pub emi_amount: f64,
    pub due_date: NaiveDate,
}

impl OverlayRequest {
    pub fn for_device(device: &Device, vendor: &Vendor) -> Self {
        Self {
            device_name: device.model.clone(),
            shop_name: vendor.shop_name.clone(),
            owner_name: vendor.owner_name.clone(),
            emi_amount: device.emi_amount,
            due_date: device.due_date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OverlayResponse {
    overlay_message: String,
}

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error("overlay request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("overlay service returned an empty message")]
    Empty,
}

#[async_trait]
pub trait OverlayComposer: Send + Sync {
    async fn compose(&self, request: &OverlayRequest) -> Result<String, OverlayError>;
}

/// Calls the text-generation service over HTTP.
pub struct HttpOverlayComposer {
    client: reqwest::Client,
    url: String,
}

impl HttpOverlayComposer {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, OverlayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl OverlayComposer for HttpOverlayComposer {
    async fn compose(&self, request: &OverlayRequest) -> Result<String, OverlayError> {
        let response: OverlayResponse = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let message = response.overlay_message.trim();
        if message.is_empty() {
            return Err(OverlayError::Empty);
        }
        Ok(message.to_string())
    }
}

/// Deterministic composer used when no service is configured.
pub struct TemplateOverlayComposer;

#[async_trait]
impl OverlayComposer for TemplateOverlayComposer {
    async fn compose(&self, request: &OverlayRequest) -> Result<String, OverlayError> {
        Ok(template_message(request))
    }
}

pub fn template_message(request: &OverlayRequest) -> String {
    format!(
        "PAYMENT OVERDUE: Your EMI of ₹{} for {} was due on {}. Please visit {} ({}) immediately to avoid permanent lock.",
        request.emi_amount,
        request.device_name,
        request.due_date,
        request.shop_name,
        request.owner_name
    )
}

/// Pick the composer for this configuration.
pub fn composer_from_config(config: &OverlayConfig) -> Result<Box<dyn OverlayComposer>, OverlayError> {
    match config.url.as_deref() {
        Some(url) => Ok(Box::new(HttpOverlayComposer::new(
            url,
            Duration::from_millis(config.timeout_ms),
        )?)),
        None => Ok(Box::new(TemplateOverlayComposer)),
    }
}

/// The composer's message, or the template when it fails.
pub async fn compose_or_fallback(composer: &dyn OverlayComposer, request: &OverlayRequest) -> String {
    match composer.compose(request).await {
        Ok(message) if !message.trim().is_empty() => message,
        Ok(_) => {
            metrics::counter!("emilock_overlay_fallbacks_total").increment(1);
            template_message(request)
        }
        Err(err) => {
            metrics::counter!("emilock_overlay_fallbacks_total").increment(1);
            tracing::warn!(error = %err, "overlay composer failed, using template");
            template_message(request)
        }
    }
}
