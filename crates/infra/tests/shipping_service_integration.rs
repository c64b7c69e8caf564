//! Typed carrier operations: payload mapping, error context and recorded
//! side effects

#![allow(dead_code)]

#[path = "support.rs"]
mod support;

use serde_json::json;
use shipgate_domain::{
    Address, CourierAssignment, OrderItem, OrderRequest, PickupLocation, RateQuery,
    ReturnOrderRequest,
};
use shipgate_infra::carrier::{GatewayError, OperationKind};
use support::service;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn address() -> Address {
    Address {
        first_name: "Asha".into(),
        last_name: "Rao".into(),
        address: "12 MG Road".into(),
        address_2: String::new(),
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        country: None,
        pincode: "560001".into(),
        email: "asha@example.com".into(),
        phone: "9999999999".into(),
        alternate_phone: String::new(),
    }
}

fn order() -> OrderRequest {
    OrderRequest {
        order_id: "1001".into(),
        order_date: "2024-06-01 10:00".into(),
        pickup_location: "Primary".into(),
        pickup_location_id: Some("PL-7".into()),
        billing: address(),
        shipping_is_billing: true,
        items: vec![OrderItem {
            name: "Mug".into(),
            sku: "MUG-1".into(),
            units: 1,
            selling_price: 250.0,
            discount: 0.0,
            tax: 0.0,
            hsn: None,
        }],
        payment_method: "Prepaid".into(),
        sub_total: 250.0,
        dimensions: None,
        weight: None,
    }
}

#[tokio::test]
async fn create_order_records_carrier_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/orders/create/adhoc"))
        .and(body_partial_json(json!({
            "order_id": "1001",
            "billing_customer_name": "Asha",
            "billing_country": "India",
            "length": 10.0
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "order_id": 445_566, "shipment_id": 778_899 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (service, _, recorder) = service(&server.uri());
    let created = service.create_order(&order()).await.expect("order created");

    assert_eq!(created.carrier_order_id.as_deref(), Some("445566"));
    assert_eq!(created.shipment_id.as_deref(), Some("778899"));

    let (order_id, update) = recorder.last().expect("update recorded");
    assert_eq!(order_id, "1001");
    assert_eq!(update.carrier_order_id.as_deref(), Some("445566"));
    assert_eq!(update.pickup_location_id.as_deref(), Some("PL-7"));
}

#[tokio::test]
async fn failed_operation_carries_context_and_records_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "Invalid billing phone" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (service, _, recorder) = service(&server.uri());
    let err = service.create_order(&order()).await.unwrap_err();

    assert_eq!(err.to_string(), "Order creation failed: Invalid billing phone");
    assert_eq!(err.operation(), Some(OperationKind::OrderCreation));
    assert_eq!(err.status_code(), 500);
    assert!(recorder.updates().is_empty());
}

#[tokio::test]
async fn rate_calculation_failures_map_to_400() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/external/courier/serviceability/"))
        .and(query_param("delivery_postcode", "999999"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "message": "Delivery postcode not serviceable" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (service, tokens, _) = service(&server.uri());
    let query = RateQuery {
        pickup_postcode: "110001".into(),
        delivery_postcode: "999999".into(),
        weight: 0.5,
        cod: true,
        declared_value: 100.0,
    };

    let err = service.calculate_rate(&query).await.unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.error_code(), "CARRIER_RATE_ERROR");
    assert_eq!(tokens.forced_refreshes(), 0);
}

#[tokio::test]
async fn assign_courier_reads_nested_awb() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/courier/assign/awb"))
        .and(body_partial_json(json!({ "shipment_id": "778899", "courier_id": "12" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "awb_assign_status": 1,
            "response": { "data": { "awb_code": "AWB123", "courier_name": "Express", "courier_company_id": 12 } }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (service, _, recorder) = service(&server.uri());
    let assignment = CourierAssignment {
        order_id: "1001".into(),
        shipment_id: "778899".into(),
        courier_id: Some("12".into()),
        shipping_cost: Some(85.5),
        estimated_delivery_days: Some("3".into()),
    };

    let assigned = service.assign_courier(&assignment).await.expect("assigned");
    assert_eq!(assigned.awb_code.as_deref(), Some("AWB123"));

    let (_, update) = recorder.last().expect("update recorded");
    assert_eq!(update.awb_code.as_deref(), Some("AWB123"));
    assert_eq!(update.courier_name.as_deref(), Some("Express"));
    assert_eq!(update.courier_company_id.as_deref(), Some("12"));
    assert_eq!(update.shipping_cost, Some(85.5));
}

#[tokio::test]
async fn tracking_records_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/external/courier/track"))
        .and(query_param("order_id", "445566"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "tracking_data": { "track_url": "https://track.example/AWB123", "shipment_status": 6 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (service, _, recorder) = service(&server.uri());
    let tracking = service.track_shipment("1001", "445566").await.expect("tracking");

    assert_eq!(tracking.tracking_url.as_deref(), Some("https://track.example/AWB123"));
    assert_eq!(tracking.tracking_data["shipment_status"], 6);
    let (order_id, update) = recorder.last().expect("update recorded");
    assert_eq!(order_id, "1001");
    assert_eq!(update.tracking_url.as_deref(), Some("https://track.example/AWB123"));
}

#[tokio::test]
async fn cancel_marks_order_cancelled_even_if_recorder_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/orders/cancel"))
        .and(body_partial_json(json!({ "ids": ["445566"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": 200 })))
        .expect(1)
        .mount(&server)
        .await;

    let (service, _, recorder) = service(&server.uri());
    recorder.set_failing(true);

    let response = service.cancel_shipment("1001", &["445566".to_string()]).await;

    assert!(response.is_ok());
    let (_, update) = recorder.last().expect("update attempted");
    assert_eq!(update.delivery_status.as_deref(), Some("cancelled"));
}

#[tokio::test]
async fn documents_record_their_urls() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/orders/print/label"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "label_url": "https://cdn.example/l.pdf" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/external/manifests/generate"))
        .and(body_partial_json(json!({ "shipment_id": ["778899"] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(
            json!({ "manifest_url": "https://cdn.example/m.pdf", "manifest_id": 31 }),
        ))
        .mount(&server)
        .await;

    let (service, _, recorder) = service(&server.uri());
    let ids = vec!["778899".to_string()];

    let label = service.download_label("1001", &ids).await.expect("label");
    let manifest = service.generate_manifest("1001", &ids).await.expect("manifest");

    assert_eq!(label.url.as_deref(), Some("https://cdn.example/l.pdf"));
    assert_eq!(manifest.manifest_id.as_deref(), Some("31"));

    let updates = recorder.updates();
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].1.label_url.as_deref(), Some("https://cdn.example/l.pdf"));
    assert_eq!(updates[1].1.manifest_url.as_deref(), Some("https://cdn.example/m.pdf"));
}

#[tokio::test]
async fn return_order_records_ids_and_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/orders/create/return"))
        .and(body_partial_json(json!({
            "order_id": "R-1001",
            "pickup_customer_name": "Asha",
            "payment_method": "Prepaid"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "order_id": 901, "shipment_id": 902 })),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (service, _, recorder) = service(&server.uri());
    let request = ReturnOrderRequest {
        return_id: "R-1001".into(),
        order_date: None,
        channel_id: None,
        pickup: address(),
        shipping: address(),
        items: order().items,
        payment_method: None,
        sub_total: 250.0,
        dimensions: None,
        weight: 0.5,
    };

    let created = service.create_return_order("1001", &request, "damaged").await.expect("return");

    assert_eq!(created.return_order_id.as_deref(), Some("901"));
    let (order_id, update) = recorder.last().expect("update recorded");
    assert_eq!(order_id, "1001");
    assert_eq!(update.return_shipment_id.as_deref(), Some("902"));
    assert_eq!(update.return_reason.as_deref(), Some("damaged"));
}

#[tokio::test]
async fn pickup_location_update_uses_existing_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/external/settings/company/updatepickup"))
        .and(body_partial_json(json!({ "pickup_location": "Primary", "pin_code": "560001" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/external/settings/company/removepickup"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream failure"))
        .expect(1)
        .mount(&server)
        .await;

    let (service, _, _) = service(&server.uri());
    let location = PickupLocation {
        location_name: "Renamed".into(),
        contact_person: "Ravi".into(),
        email: "ravi@example.com".into(),
        phone: "8888888888".into(),
        address: "Plot 4".into(),
        address_2: String::new(),
        city: "Bengaluru".into(),
        state: "Karnataka".into(),
        country: None,
        pincode: "560001".into(),
    };

    service.update_pickup_location("Primary", &location).await.expect("updated");

    let err = service.remove_pickup_location("Primary").await.unwrap_err();
    assert!(matches!(err.root(), GatewayError::Carrier { status: 500, .. }));
    assert_eq!(err.to_string(), "Pickup location deletion failed: upstream failure");
}
