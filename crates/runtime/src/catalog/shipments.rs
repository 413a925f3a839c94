//! Shipment tracking tools (`/v1/shipping`).

use serde_json::{Map, Value, json};

use crate::definition::{Body, ToolDefinition};
use crate::schema::{DefaultValue, Field};
use crate::validate::Violation;

const STATUSES: &[&str] = &["ON_HOLD", "SHIPPED", "DELIVERED", "CANCELLED"];

const CREATE: &[Field] = &[
    Field::string("transaction_id", "PayPal capture ID the shipment is for").required(),
    Field::string("tracking_number", "Carrier tracking number").required(),
    Field::one_of("status", STATUSES, "Shipment status").default(DefaultValue::Str("SHIPPED")),
    Field::string("carrier", "Carrier code, e.g. FEDEX or USPS"),
];

const GET: &[Field] = &[
    Field::string("transaction_id", "PayPal capture ID to look up trackers for")
        .required()
        .in_query(),
    Field::string("tracking_number", "Only return this tracker").in_query(),
];

/// Wraps one tracker into a batch request.
fn tracker_batch(args: &Map<String, Value>) -> Result<Value, Vec<Violation>> {
    Ok(json!({ "trackers": [Value::Object(args.clone())] }))
}

pub(crate) const TOOLS: &[ToolDefinition] = &[
    ToolDefinition::post("shipment.create", "create_shipment", "/v1/shipping/trackers-batch")
        .titled("Create Shipment")
        .describe("Add tracking information to a captured PayPal transaction.")
        .params(CREATE)
        .body(Body::Build(tracker_batch)),
    ToolDefinition::get("shipment.get", "get_shipment_tracking", "/v1/shipping/trackers")
        .titled("Get Shipment Tracking")
        .describe("Show tracking information for a PayPal transaction.")
        .params(GET),
];
