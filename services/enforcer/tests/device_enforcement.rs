mod common;

use axum::http::StatusCode;
use common::{IMEI_A, IMEI_B, IMEI_C, IMEI_D, enrollment_body, test_app};
use http_helpers::{get_request, json_request};

#[tokio::test]
async fn enrollment_creates_active_device_bound_to_vendor() {
    let app = test_app();
    let vendor = app.active_vendor("Sharma Mobiles", "9876543210").await;

    let device = app.enroll(&vendor, "Asha Verma", IMEI_B, IMEI_A).await;
    assert_eq!(device["status"], "active");
    assert_eq!(device["isLocked"], false);
    assert_eq!(device["lockMessage"], "");
    assert_eq!(device["vendorId"], vendor.id.as_str());
    assert_eq!(device["vendorMobile"], "+919876543210");
    assert_eq!(device["imei1"], IMEI_A);
    assert_eq!(device["imei2"], IMEI_B);
    assert_eq!(device["emiMonths"], 6);
    assert_eq!(device["dueDate"], "2026-11-05");
    let customer_id = device["customerId"].as_str().expect("customer id");
    assert!(customer_id.starts_with("EMI-"));
    assert_eq!(customer_id.len(), 13);
}

#[tokio::test]
async fn enrollment_ignores_vendor_fields_in_body() {
    let app = test_app();
    let alpha = app.active_vendor("Alpha", "9111111111").await;
    let beta = app.active_vendor("Beta", "9222222222").await;

    let mut body = enrollment_body("Spoofed", IMEI_A, "");
    body["vendorId"] = serde_json::json!(beta.id);
    body["vendorMobile"] = serde_json::json!("+919222222222");
    let (status, device) = app
        .send(json_request("POST", "/v1/devices", Some(&alpha.token), body))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(device["vendorId"], alpha.id.as_str());
    assert_eq!(device["vendorMobile"], "+919111111111");
}

#[tokio::test]
async fn enrollment_normalizes_and_validates_imeis() {
    let app = test_app();
    let vendor = app.active_vendor("Shop", "9333333333").await;

    let spaced = format!("{} {}-{}", &IMEI_C[..5], &IMEI_C[5..10], &IMEI_C[10..]);
    let device = app.enroll(&vendor, "Spacing", &spaced, "").await;
    assert_eq!(device["imei1"], IMEI_C);
    assert_eq!(device["imei2"], "");

    let cases = [
        ("490154203237519", "", "invalid_hardware_id"),
        ("", "", "invalid_hardware_id"),
        (IMEI_D, "12345", "invalid_hardware_id"),
        (IMEI_D, IMEI_D, "duplicate_hardware_id"),
    ];
    for (imei1, imei2, code) in cases {
        let (status, body) = app
            .send(json_request(
                "POST",
                "/v1/devices",
                Some(&vendor.token),
                enrollment_body("Bad", imei1, imei2),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{imei1}/{imei2}");
        assert_eq!(body["code"], code, "{imei1}/{imei2}");
    }

    let mut body = enrollment_body("Negative", IMEI_D, "");
    body["emiAmount"] = serde_json::json!(-10.0);
    let (status, body) = app
        .send(json_request("POST", "/v1/devices", Some(&vendor.token), body))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
}

#[tokio::test]
async fn enrollment_rejects_imei_text_without_digits() {
    let app = test_app();
    let vendor = app.active_vendor("Placeholder Shop", "9888888888").await;

    let cases = [(IMEI_A, "N/A", "imei2"), ("none", IMEI_A, "imei1"), (IMEI_A, " - ", "imei2")];
    for (imei1, imei2, slot) in cases {
        let (status, body) = app
            .send(json_request(
                "POST",
                "/v1/devices",
                Some(&vendor.token),
                enrollment_body("Placeholder", imei1, imei2),
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{imei1}/{imei2}");
        assert_eq!(body["code"], "invalid_hardware_id", "{imei1}/{imei2}");
        assert!(
            body["message"].as_str().expect("message").contains(slot),
            "{body}"
        );
    }

    let (_, listed) = app.send(get_request("/v1/devices", Some(&vendor.token))).await;
    assert!(listed["items"].as_array().expect("items").is_empty());

    let device = app.enroll(&vendor, "Blank Slot", IMEI_A, "   ").await;
    assert_eq!(device["imei2"], "");
}

#[tokio::test]
async fn enrollment_rejects_out_of_range_emi_months() {
    let app = test_app();
    let vendor = app.active_vendor("Tenure Shop", "9898989898").await;
    for months in [0u64, 361, 4_294_967_295] {
        let mut body = enrollment_body("Tenure", IMEI_B, "");
        body["emiMonths"] = serde_json::json!(months);
        let (status, body) = app
            .send(json_request("POST", "/v1/devices", Some(&vendor.token), body))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{months}");
        assert_eq!(body["code"], "validation_error", "{months}");
    }
    let mut body = enrollment_body("Tenure", IMEI_B, "");
    body["emiMonths"] = serde_json::json!(360);
    let (status, _) = app
        .send(json_request("POST", "/v1/devices", Some(&vendor.token), body))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn owner_cannot_enroll_devices() {
    let app = test_app();
    let owner = app.owner_token();
    let (status, body) = app
        .send(json_request(
            "POST",
            "/v1/devices",
            Some(&owner),
            enrollment_body("Owner", IMEI_A, ""),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "forbidden");
}

#[tokio::test]
async fn lock_and_unlock_flow_updates_agent_view() {
    let app = test_app();
    let vendor = app.active_vendor("Lock Shop", "9444444444").await;
    let device = app.enroll(&vendor, "Ravi Kumar", IMEI_A, "").await;
    let id = device["id"].as_str().expect("id").to_string();
    let lock_uri = format!("/v1/devices/{id}/lock");
    let agent_uri = format!("/v1/agent/devices/{id}/state");

    let (status, body) = app
        .send(json_request(
            "POST",
            &lock_uri,
            Some(&vendor.token),
            serde_json::json!({ "message": "   " }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "missing_lock_message");

    let (status, locked) = app
        .send(json_request(
            "POST",
            &lock_uri,
            Some(&vendor.token),
            serde_json::json!({ "message": "  EMI overdue. Visit Lock Shop.  " }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(locked["isLocked"], true);
    assert_eq!(locked["status"], "locked");
    assert_eq!(locked["lockMessage"], "EMI overdue. Visit Lock Shop.");
    assert!(locked["lockedAt"].is_string());

    let (status, agent) = app.send(get_request(&agent_uri, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        agent,
        serde_json::json!({
            "deviceId": id,
            "isLocked": true,
            "status": "locked",
            "lockMessage": "EMI overdue. Visit Lock Shop."
        })
    );

    let (status, unlocked) = app
        .send(json_request(
            "POST",
            &format!("/v1/devices/{id}/unlock"),
            Some(&vendor.token),
            serde_json::json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unlocked["isLocked"], false);
    assert_eq!(unlocked["status"], "active");
    assert_eq!(unlocked["lockMessage"], "");
    assert!(unlocked["lockedAt"].is_null());

    let (_, agent) = app.send(get_request(&agent_uri, None)).await;
    assert_eq!(agent["isLocked"], false);
    assert_eq!(agent["status"], "active");
}

#[tokio::test]
async fn repeated_unlock_is_a_no_op() {
    let app = test_app();
    let vendor = app.active_vendor("Idempotent", "9555555555").await;
    let device = app.enroll(&vendor, "Meera", IMEI_B, "").await;
    let id = device["id"].as_str().expect("id");

    let (status, body) = app
        .send(json_request(
            "POST",
            &format!("/v1/devices/{id}/unlock"),
            Some(&vendor.token),
            serde_json::json!({}),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedAt"], device["updatedAt"]);
}

#[tokio::test]
async fn owner_can_lock_any_device() {
    let app = test_app();
    let vendor = app.active_vendor("Owned", "9666666666").await;
    let device = app.enroll(&vendor, "Kiran", IMEI_C, "").await;
    let id = device["id"].as_str().expect("id");

    let (status, body) = app
        .send(json_request(
            "POST",
            &format!("/v1/devices/{id}/lock"),
            Some(&app.owner_token()),
            serde_json::json!({ "message": "Contact the platform" }),
        ))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isLocked"], true);
}

#[tokio::test]
async fn listing_filters_by_status_and_search() {
    let app = test_app();
    let vendor = app.active_vendor("Filter Shop", "9777777777").await;
    let first = app.enroll(&vendor, "Asha Verma", IMEI_A, "").await;
    app.enroll(&vendor, "Vikram Singh", IMEI_B, IMEI_C).await;
    let id = first["id"].as_str().expect("id");
    app.send(json_request(
        "POST",
        &format!("/v1/devices/{id}/lock"),
        Some(&vendor.token),
        serde_json::json!({ "message": "Pay now" }),
    ))
    .await;

    let names = |body: &serde_json::Value| -> Vec<String> {
        body["items"]
            .as_array()
            .expect("items")
            .iter()
            .map(|d| d["customerName"].as_str().expect("name").to_string())
            .collect()
    };

    let (_, body) = app
        .send(get_request("/v1/devices?status=locked", Some(&vendor.token)))
        .await;
    assert_eq!(names(&body), vec!["Asha Verma"]);

    let (_, body) = app
        .send(get_request("/v1/devices?search=VIKRAM", Some(&vendor.token)))
        .await;
    assert_eq!(names(&body), vec!["Vikram Singh"]);

    let (_, body) = app
        .send(get_request(
            &format!("/v1/devices?search={}", &IMEI_C[..6]),
            Some(&vendor.token),
        ))
        .await;
    assert_eq!(names(&body), vec!["Vikram Singh"]);

    let (status, body) = app
        .send(get_request("/v1/devices?status=bricked", Some(&vendor.token)))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");

    let (status, stats) = app
        .send(get_request("/v1/dashboard/stats", Some(&vendor.token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        stats,
        serde_json::json!({ "total": 2, "locked": 1, "active": 1 })
    );
}

#[tokio::test]
async fn agent_state_for_unknown_device_is_not_found() {
    let app = test_app();
    let (status, body) = app
        .send(get_request(
            "/v1/agent/devices/6f1c1d7e-3a55-4c1e-9a4e-1b2c3d4e5f60/state",
            None,
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");

    let (status, _) = app
        .send(get_request("/v1/agent/devices/garbage/state", None))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
