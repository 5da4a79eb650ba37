mod common;

use axum::http::StatusCode;
use common::{OWNER_PHONE, test_app};
use http_helpers::{get_request, json_request};

#[tokio::test]
async fn registration_starts_pending_and_normalizes_mobile() {
    let app = test_app();
    let (status, body) = app
        .send(json_request(
            "POST",
            "/v1/vendors",
            None,
            serde_json::json!({
                "shopName": "Sharma Mobiles",
                "ownerName": "R. Sharma",
                "mobile": "98765 43210",
                "email": " shop@sharma.test ",
                "kycAssets": { "idFront": "kyc/front.jpg", "idBack": null }
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["mobile"], "+919876543210");
    assert_eq!(body["email"], "shop@sharma.test");
    assert_eq!(body["kycAssets"]["idFront"], "kyc/front.jpg");
}

#[tokio::test]
async fn registration_rejects_missing_fields_and_duplicate_mobile() {
    let app = test_app();
    let (status, body) = app
        .send(json_request(
            "POST",
            "/v1/vendors",
            None,
            serde_json::json!({ "shopName": " ", "ownerName": "Owner", "mobile": "9876543210" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    app.register_vendor("First Shop", "9876543210").await;
    let (status, body) = app
        .send(json_request(
            "POST",
            "/v1/vendors",
            None,
            serde_json::json!({
                "shopName": "Second Shop",
                "ownerName": "Owner",
                "mobile": "+91 98765 43210"
            }),
        ))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[tokio::test]
async fn registration_rejects_mobiles_that_are_not_e164() {
    let app = test_app();
    for mobile in ["12345", "+0987654321"] {
        let (status, body) = app
            .send(json_request(
                "POST",
                "/v1/vendors",
                None,
                serde_json::json!({
                    "shopName": "Short Code Shop",
                    "ownerName": "Owner",
                    "mobile": mobile
                }),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{mobile}");
        assert_eq!(body["code"], "validation_error");
    }

    let (_, body) = app
        .send(get_request("/v1/vendors", Some(&app.owner_token())))
        .await;
    assert!(body["items"].as_array().expect("items").is_empty());
}

#[tokio::test]
async fn pending_vendor_sees_itself_but_has_no_scope() {
    let app = test_app();
    let vendor_id = app.register_vendor("Pending Shop", "9123456780").await;
    let token = app.phone_token("9123456780");

    let (status, me) = app.send(get_request("/v1/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "vendor");
    assert_eq!(me["vendor"]["id"], vendor_id.as_str());
    assert_eq!(me["vendor"]["status"], "pending");

    let (status, body) = app.send(get_request("/v1/devices", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");

    let (status, _) = app
        .send(get_request("/v1/dashboard/stats", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn owner_reviews_and_activates_vendors() {
    let app = test_app();
    let owner = app.owner_token();
    let first = app.register_vendor("Alpha Phones", "9111111111").await;
    let second = app.register_vendor("Beta Phones", "9222222222").await;

    let (status, me) = app.send(get_request("/v1/me", Some(&owner))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["role"], "super_admin");
    assert!(me["vendor"].is_null());

    let (status, body) = app
        .send(get_request("/v1/vendors?status=pending", Some(&owner)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().expect("items").len(), 2);

    assert_eq!(app.set_vendor_status(&first, "active").await, StatusCode::OK);

    let (_, body) = app
        .send(get_request("/v1/vendors?status=active", Some(&owner)))
        .await;
    let items = body["items"].as_array().expect("items");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"], first.as_str());

    let (status, body) = app
        .send(get_request(&format!("/v1/vendors/{second}"), Some(&owner)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["shopName"], "Beta Phones");

    let (status, body) = app
        .send(get_request("/v1/vendors?status=archived", Some(&owner)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn owner_searches_vendors_by_name_and_mobile() {
    let app = test_app();
    let owner = app.owner_token();
    let alpha = app.register_vendor("Alpha Phones", "9111111111").await;
    let beta = app.register_vendor("Beta Phones", "9222222222").await;
    app.set_vendor_status(&beta, "active").await;

    let ids = |body: &serde_json::Value| -> Vec<String> {
        body["items"]
            .as_array()
            .expect("items")
            .iter()
            .map(|item| item["id"].as_str().expect("id").to_string())
            .collect()
    };

    let (status, body) = app
        .send(get_request("/v1/vendors?search=alpha", Some(&owner)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(ids(&body), vec![alpha.clone()]);

    let (_, body) = app
        .send(get_request("/v1/vendors?search=BETA%20PHONES%20OWNER", Some(&owner)))
        .await;
    assert_eq!(ids(&body), vec![beta.clone()]);

    let (_, body) = app
        .send(get_request("/v1/vendors?search=2222", Some(&owner)))
        .await;
    assert_eq!(ids(&body), vec![beta.clone()]);

    let (_, body) = app
        .send(get_request("/v1/vendors?search=phones&status=pending", Some(&owner)))
        .await;
    assert_eq!(ids(&body), vec![alpha]);

    let (_, body) = app
        .send(get_request("/v1/vendors?search=nokia", Some(&owner)))
        .await;
    assert!(ids(&body).is_empty());
}

#[tokio::test]
async fn status_changes_are_owner_only_and_never_back_to_pending() {
    let app = test_app();
    let vendor = app.active_vendor("Gamma Mobiles", "9333333333").await;

    let (status, _) = app
        .send(json_request(
            "POST",
            &format!("/v1/vendors/{}/status", vendor.id),
            Some(&vendor.token),
            serde_json::json!({ "status": "suspended" }),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(get_request("/v1/vendors", Some(&vendor.token)))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    assert_eq!(
        app.set_vendor_status(&vendor.id, "pending").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        app.set_vendor_status("00000000-0000-0000-0000-000000000000", "active")
            .await,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        app.set_vendor_status("not-an-id", "active").await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn vendor_reads_only_its_own_record() {
    let app = test_app();
    let alpha = app.active_vendor("Alpha", "9444444444").await;
    let beta = app.active_vendor("Beta", "9555555555").await;

    let (status, body) = app
        .send(get_request(&format!("/v1/vendors/{}", alpha.id), Some(&alpha.token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");

    let (status, _) = app
        .send(get_request(&format!("/v1/vendors/{}", beta.id), Some(&alpha.token)))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn owner_phone_never_needs_a_vendor_record() {
    let app = test_app();
    let token = app.phone_token(&format!("+91{OWNER_PHONE}"));
    let (status, body) = app
        .send(get_request("/v1/dashboard/stats", Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["vendors"], 0);
}
