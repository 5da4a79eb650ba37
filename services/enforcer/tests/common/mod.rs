#![allow(dead_code)]

use axum::http::StatusCode;
use enforcer::app::{AppState, build_router};
use enforcer::auth::{SessionClaims, SessionVerifier, TenantIdentityResolver};
use enforcer::config::{OwnerConfig, ProvisioningConfig};
use enforcer::overlay::{OverlayComposer, TemplateOverlayComposer};
use enforcer::provisioning::ProvisioningBuilder;
use enforcer::store::EnforcementStore;
use enforcer::store::memory::InMemoryStore;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

pub const SESSION_SECRET: &[u8] = b"integration-session-secret";
pub const ISSUER: &str = "emilock-auth";
pub const OWNER_PHONE: &str = "9000000001";
pub const SERVER_ORIGIN: &str = "https://enforcer.test";

/// Valid Luhn IMEIs.
pub const IMEI_A: &str = "490154203237518";
pub const IMEI_B: &str = "530000000000009";
pub const IMEI_C: &str = "991000000000001";
pub const IMEI_D: &str = "123000000000002";

pub type TestService = axum::routing::RouterIntoService<axum::body::Body, ()>;

pub struct TestApp {
    pub service: TestService,
    pub sessions: SessionVerifier,
    pub store: Arc<dyn EnforcementStore>,
}

pub fn owner_config() -> OwnerConfig {
    OwnerConfig {
        phones: vec![OWNER_PHONE.to_string()],
        emails: vec!["owner@emilock.test".to_string()],
        allow_anonymous_admin: false,
        default_country_code: "+91".to_string(),
    }
}

pub fn provisioning_config() -> ProvisioningConfig {
    ProvisioningConfig {
        server_origin: SERVER_ORIGIN.to_string(),
        project_id: "emilocker-a9f98".to_string(),
        admin_component: "com.emilocker.mdm/.receiver.DeviceAdminReceiver".to_string(),
        package_url: "https://assets.test/agent.apk".to_string(),
        signature_checksum: "c2lnbmF0dXJl".to_string(),
    }
}

pub fn test_app() -> TestApp {
    test_app_with(
        Arc::new(InMemoryStore::new()),
        Arc::new(TemplateOverlayComposer),
        owner_config(),
    )
}

pub fn test_app_with(
    store: Arc<dyn EnforcementStore>,
    overlay: Arc<dyn OverlayComposer>,
    owners: OwnerConfig,
) -> TestApp {
    let sessions = SessionVerifier::new(SESSION_SECRET, ISSUER, 0);
    let state = AppState::new(
        store.clone(),
        sessions.clone(),
        TenantIdentityResolver::from_config(&owners),
        ProvisioningBuilder::from_config(&provisioning_config()),
        overlay,
        &owners.default_country_code,
    );
    TestApp {
        service: build_router(state).into_service(),
        sessions,
        store,
    }
}

impl TestApp {
    pub fn token(&self, claims: SessionClaims) -> String {
        self.sessions
            .mint_session(claims, Duration::from_secs(300))
            .expect("mint session")
    }

    pub fn owner_token(&self) -> String {
        self.token(SessionClaims::phone(OWNER_PHONE))
    }

    pub fn phone_token(&self, phone: &str) -> String {
        self.token(SessionClaims::phone(phone))
    }

    pub async fn send(
        &self,
        request: axum::http::Request<axum::body::Body>,
    ) -> (StatusCode, serde_json::Value) {
        let response = self
            .service
            .clone()
            .oneshot(request)
            .await
            .expect("response");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json")
        };
        (status, body)
    }
}

/// A registered shop the owner has approved.
pub struct ActiveVendor {
    pub id: String,
    pub mobile: String,
    pub token: String,
}

impl TestApp {
    pub async fn register_vendor(&self, shop: &str, mobile: &str) -> String {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/vendors")
            .header("content-type", "application/json")
            .body(axum::body::Body::from(
                serde_json::json!({
                    "shopName": shop,
                    "ownerName": format!("{shop} Owner"),
                    "mobile": mobile,
                })
                .to_string(),
            ))
            .expect("request");
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().expect("vendor id").to_string()
    }

    pub async fn set_vendor_status(&self, vendor_id: &str, status: &str) -> StatusCode {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri(format!("/v1/vendors/{vendor_id}/status"))
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", self.owner_token()))
            .body(axum::body::Body::from(
                serde_json::json!({ "status": status }).to_string(),
            ))
            .expect("request");
        self.send(request).await.0
    }

    pub async fn active_vendor(&self, shop: &str, mobile: &str) -> ActiveVendor {
        let id = self.register_vendor(shop, mobile).await;
        assert_eq!(self.set_vendor_status(&id, "active").await, StatusCode::OK);
        ActiveVendor {
            id,
            mobile: mobile.to_string(),
            token: self.phone_token(mobile),
        }
    }

    /// Enroll a device as `vendor` and return the created record.
    pub async fn enroll(
        &self,
        vendor: &ActiveVendor,
        customer: &str,
        imei1: &str,
        imei2: &str,
    ) -> serde_json::Value {
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/v1/devices")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", vendor.token))
            .body(axum::body::Body::from(
                enrollment_body(customer, imei1, imei2).to_string(),
            ))
            .expect("request");
        let (status, body) = self.send(request).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

pub fn enrollment_body(customer: &str, imei1: &str, imei2: &str) -> serde_json::Value {
    serde_json::json!({
        "customerName": customer,
        "mobile": "9811122233",
        "email": "customer@mail.test",
        "model": "Galaxy A15",
        "imei1": imei1,
        "imei2": imei2,
        "emiAmount": 2499.0,
        "emiMonths": 6,
        "dueDate": "2026-11-05"
    })
}

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}
