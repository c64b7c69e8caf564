//! Carrier request payloads
//!
//! Maps typed shipping inputs onto the carrier's field names.

use serde_json::{json, Value};
use shipgate_domain::constants::DEFAULT_RETURN_PAYMENT_METHOD;
use shipgate_domain::{
    Address, CourierAssignment, Dimensions, OrderItem, OrderRequest, PickupLocation, RateQuery,
    ReturnOrderRequest,
};

pub fn rate_query(query: &RateQuery) -> Value {
    json!({
        "pickup_postcode": query.pickup_postcode,
        "delivery_postcode": query.delivery_postcode,
        "weight": query.weight,
        "cod": u8::from(query.cod),
        "declared_value": query.declared_value,
    })
}

pub fn order(request: &OrderRequest) -> Value {
    let billing = &request.billing;
    let mut payload = json!({
        "order_id": request.order_id,
        "order_date": request.order_date,
        "pickup_location": request.pickup_location,
        "billing_customer_name": billing.first_name,
        "billing_last_name": billing.last_name,
        "billing_address": billing.address,
        "billing_address_2": billing.address_2,
        "billing_city": billing.city,
        "billing_pincode": billing.pincode,
        "billing_state": billing.state,
        "billing_country": billing.country_or_default(),
        "billing_email": billing.email,
        "billing_phone": billing.phone,
        "billing_alternate_phone": billing.alternate_phone,
        "shipping_is_billing": request.shipping_is_billing,
        "order_items": request.items.iter().map(|item| order_item(item, false)).collect::<Vec<_>>(),
        "payment_method": request.payment_method,
        "sub_total": request.sub_total,
        "weight": request.weight_or_default(),
    });
    merge_dimensions(&mut payload, request.dimensions_or_default());
    payload
}

pub fn courier_assignment(assignment: &CourierAssignment) -> Value {
    let mut payload = json!({ "shipment_id": assignment.shipment_id });
    if let Some(courier_id) = &assignment.courier_id {
        payload["courier_id"] = json!(courier_id);
    }
    payload
}

pub fn shipment_ids(ids: &[String]) -> Value {
    json!({ "shipment_id": ids })
}

pub fn ids(ids: &[String]) -> Value {
    json!({ "ids": ids })
}

pub fn tracking(carrier_order_id: &str) -> Value {
    json!({ "order_id": carrier_order_id })
}

pub fn return_order(request: &ReturnOrderRequest, order_date: &str) -> Value {
    let mut payload = json!({
        "order_id": request.return_id,
        "order_date": order_date,
        "channel_id": request.channel_id.as_deref().unwrap_or_default(),
        "order_items": request.items.iter().map(|item| order_item(item, true)).collect::<Vec<_>>(),
        "payment_method": request
            .payment_method
            .as_deref()
            .unwrap_or(DEFAULT_RETURN_PAYMENT_METHOD),
        "sub_total": request.sub_total,
        "weight": request.weight,
    });
    merge_party(&mut payload, "pickup", &request.pickup);
    merge_party(&mut payload, "shipping", &request.shipping);
    merge_dimensions(&mut payload, request.dimensions.unwrap_or_default());
    payload
}

pub fn pickup_location(location: &PickupLocation) -> Value {
    json!({
        "pickup_location": location.location_name,
        "name": location.contact_person,
        "email": location.email,
        "phone": location.phone,
        "address": location.address,
        "address_2": location.address_2,
        "city": location.city,
        "state": location.state,
        "country": location.country_or_default(),
        "pin_code": location.pincode,
    })
}

pub fn pickup_location_name(location_name: &str) -> Value {
    json!({ "pickup_location": location_name })
}

fn order_item(item: &OrderItem, with_discount: bool) -> Value {
    let mut value = json!({
        "name": item.name,
        "sku": item.sku,
        "units": item.units,
        "selling_price": item.selling_price,
        "tax": item.tax,
        "hsn": item.hsn.as_deref().unwrap_or_default(),
    });
    if with_discount {
        value["discount"] = json!(item.discount);
    }
    value
}

fn merge_party(payload: &mut Value, prefix: &str, address: &Address) {
    let fields = [
        ("customer_name", json!(address.first_name)),
        ("last_name", json!(address.last_name)),
        ("address", json!(address.address)),
        ("city", json!(address.city)),
        ("state", json!(address.state)),
        ("country", json!(address.country_or_default())),
        ("pincode", json!(address.pincode)),
        ("email", json!(address.email)),
        ("phone", json!(address.phone)),
    ];
    for (field, value) in fields {
        payload[format!("{prefix}_{field}")] = value;
    }
}

fn merge_dimensions(payload: &mut Value, dimensions: Dimensions) {
    payload["length"] = json!(dimensions.length);
    payload["breadth"] = json!(dimensions.breadth);
    payload["height"] = json!(dimensions.height);
}
