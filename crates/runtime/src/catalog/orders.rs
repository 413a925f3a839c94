//! Checkout order tools (`/v2/checkout/orders`).
//!
//! `orders.create` accepts a flat cart (item costs, tax percentages, discount,
//! shipping) and builds the v2 order body. Amounts are summed in minor units
//! so the breakdown always adds up to the total PayPal checks it against.

use serde_json::{Map, Value, json};

use crate::definition::{Body, ToolDefinition};
use crate::schema::{DefaultValue, Field, Kind};
use crate::validate::Violation;

const CURRENCIES: &[&str] = &[
    "AUD", "BRL", "CAD", "CHF", "CNY", "CZK", "DKK", "EUR", "GBP", "HKD", "HUF", "ILS", "JPY",
    "MXN", "MYR", "NOK", "NZD", "PHP", "PLN", "SEK", "SGD", "THB", "TWD", "USD",
];

/// PayPal rejects decimals for these.
const ZERO_DECIMAL_CURRENCIES: &[&str] = &["HUF", "JPY", "TWD"];

const MAX_ITEMS: usize = 50;
const MAX_QUANTITY: f64 = 1_000_000.0;
const MAX_AMOUNT: f64 = 1_000_000_000.0;

const ITEM: &[Field] = &[
    Field::string("name", "Item name").required(),
    Field::integer("quantity", "Whole-number quantity")
        .min(1.0)
        .max(MAX_QUANTITY)
        .default(DefaultValue::Int(1)),
    Field::string("description", "Item description"),
    Field::number("itemCost", "Price of one unit, up to two decimal places")
        .required()
        .min(0.0)
        .max(MAX_AMOUNT),
    Field::number("taxPercent", "Tax percentage applied to the item")
        .min(0.0)
        .max(100.0)
        .default(DefaultValue::Num(0.0)),
    Field::number("itemTotal", "Line total as shown to the buyer; informational").min(0.0),
];
const ITEM_KIND: Kind = Kind::Object(ITEM);

const SHIPPING_ADDRESS: &[Field] = &[
    Field::string("address_line_1", "Street address, e.g. 173 Drury Lane"),
    Field::string("address_line_2", "Suite or apartment"),
    Field::string("admin_area_2", "City, town, or village"),
    Field::string("admin_area_1", "State, province, or ISO-3166-2 subdivision"),
    Field::string("postal_code", "ZIP or postal code"),
    Field::string("country_code", "Two-letter ISO-3166-1 country code (GB, not UK)"),
];

const CREATE: &[Field] = &[
    Field::one_of("currencyCode", CURRENCIES, "Currency of every amount").required(),
    Field::array("items", &ITEM_KIND, "Items in the order")
        .required()
        .max_items(MAX_ITEMS),
    Field::number("discount", "Discount on the whole order")
        .min(0.0)
        .max(MAX_AMOUNT)
        .default(DefaultValue::Num(0.0)),
    Field::number("shippingCost", "Shipping charge")
        .min(0.0)
        .max(MAX_AMOUNT)
        .default(DefaultValue::Num(0.0)),
    Field::object("shippingAddress", SHIPPING_ADDRESS, "Where to ship the order"),
    Field::string("notes", "Order description shown to the buyer"),
    Field::string("returnUrl", "Where the buyer goes after approving")
        .default(DefaultValue::Str("https://example.com/returnUrl")),
    Field::string("cancelUrl", "Where the buyer goes after cancelling")
        .default(DefaultValue::Str("https://example.com/cancelUrl")),
];

const ORDER_ID: &[Field] = &[Field::string("id", "Order ID returned by create_order").in_path()];

/// Amount formatting for one currency.
struct Currency<'a> {
    code: &'a str,
    decimals: u32,
}

impl<'a> Currency<'a> {
    fn new(code: &'a str) -> Self {
        let decimals = if ZERO_DECIMAL_CURRENCIES.contains(&code) {
            0
        } else {
            2
        };
        Self { code, decimals }
    }

    fn scale(&self) -> f64 {
        10f64.powi(self.decimals as i32)
    }

    /// `None` when the amount does not fit in minor units.
    fn to_minor(&self, amount: f64) -> Option<i64> {
        let minor = (amount * self.scale()).round();
        (minor.is_finite() && minor.abs() < i64::MAX as f64).then_some(minor as i64)
    }

    fn format(&self, minor: i64) -> String {
        if self.decimals == 0 {
            return minor.to_string();
        }
        let sign = if minor < 0 { "-" } else { "" };
        let minor = minor.unsigned_abs();
        let scale = 10u64.pow(self.decimals);
        format!(
            "{sign}{}.{:0width$}",
            minor / scale,
            minor % scale,
            width = self.decimals as usize
        )
    }

    fn money(&self, minor: i64) -> Value {
        json!({ "currency_code": self.code, "value": self.format(minor) })
    }
}

fn number(value: Option<&Value>) -> f64 {
    value.and_then(Value::as_f64).unwrap_or(0.0)
}

fn too_large(field: &str) -> Vec<Violation> {
    vec![Violation::new(field, "amount too large")]
}

/// Builds a v2 order from the simplified cart arguments.
fn build_order(args: &Map<String, Value>) -> Result<Value, Vec<Violation>> {
    let code = args.get("currencyCode").and_then(Value::as_str).unwrap_or("USD");
    let currency = Currency::new(code);

    let items = args
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if items.is_empty() {
        return Err(vec![Violation::new("items", "must contain at least one item")]);
    }

    let mut item_total = 0i64;
    let mut tax_total = 0i64;
    let mut lines = Vec::with_capacity(items.len());

    for item in items {
        let quantity = item.get("quantity").and_then(Value::as_i64).unwrap_or(1);
        let unit_cost = currency
            .to_minor(number(item.get("itemCost")))
            .ok_or_else(|| too_large("items"))?;
        let tax_percent = number(item.get("taxPercent"));
        // PayPal checks tax_total against the sum of per-unit tax times quantity.
        let unit_tax = (unit_cost as f64 * tax_percent / 100.0).round() as i64;

        item_total = unit_cost
            .checked_mul(quantity)
            .and_then(|line| item_total.checked_add(line))
            .ok_or_else(|| too_large("items"))?;
        tax_total = unit_tax
            .checked_mul(quantity)
            .and_then(|line| tax_total.checked_add(line))
            .ok_or_else(|| too_large("items"))?;

        let mut line = json!({
            "name": item.get("name").cloned().unwrap_or(Value::Null),
            "quantity": quantity.to_string(),
            "unit_amount": currency.money(unit_cost),
            "tax": currency.money(unit_tax),
        });
        if let Some(description) = item.get("description") {
            line["description"] = description.clone();
        }
        lines.push(line);
    }

    let shipping = currency
        .to_minor(number(args.get("shippingCost")))
        .ok_or_else(|| too_large("shippingCost"))?;
    let discount = currency
        .to_minor(number(args.get("discount")))
        .ok_or_else(|| too_large("discount"))?;
    let gross = item_total
        .checked_add(tax_total)
        .and_then(|sum| sum.checked_add(shipping))
        .ok_or_else(|| too_large("items"))?;
    if discount > gross {
        return Err(vec![Violation::new(
            "discount",
            format!("exceeds the order total of {}", currency.format(gross)),
        )]);
    }
    let total = gross - discount;

    let mut purchase_unit = json!({
        "amount": {
            "currency_code": currency.code,
            "value": currency.format(total),
            "breakdown": {
                "item_total": currency.money(item_total),
                "tax_total": currency.money(tax_total),
                "shipping": currency.money(shipping),
                "discount": currency.money(discount),
            },
        },
        "items": lines,
    });
    if let Some(notes) = args.get("notes") {
        purchase_unit["description"] = notes.clone();
    }
    match args.get("shippingAddress") {
        Some(Value::Object(address)) if !address.is_empty() => {
            purchase_unit["shipping"] = json!({ "address": address });
        }
        _ => {}
    }

    Ok(json!({
        "intent": "CAPTURE",
        "purchase_units": [purchase_unit],
        "payment_source": {
            "paypal": {
                "experience_context": {
                    "return_url": args.get("returnUrl").cloned().unwrap_or(Value::Null),
                    "cancel_url": args.get("cancelUrl").cloned().unwrap_or(Value::Null),
                },
            },
        },
    }))
}

pub(crate) const TOOLS: &[ToolDefinition] = &[
    ToolDefinition::post("orders.create", "create_order", "/v2/checkout/orders")
        .titled("Create Order")
        .describe(
            "Create a checkout order from a list of items. Totals, tax and the amount \
             breakdown are computed for you. The response contains the approval link \
             the buyer must follow before the order can be captured.",
        )
        .params(CREATE)
        .body(Body::Build(build_order)),
    ToolDefinition::get("orders.get", "get_order", "/v2/checkout/orders/{id}")
        .titled("Get Order")
        .describe("Show the details and status of an order.")
        .params(ORDER_ID),
    ToolDefinition::post("orders.capture", "capture_order", "/v2/checkout/orders/{id}/capture")
        .titled("Capture Order")
        .describe("Capture payment for an order the buyer has approved.")
        .params(ORDER_ID)
        .body(Body::Empty),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate;

    fn order(args: Value) -> Value {
        let args = validate(CREATE, args).unwrap();
        build_order(&args).unwrap()
    }

    #[test]
    fn breakdown_adds_up_in_cents() {
        let body = order(json!({
            "currencyCode": "USD",
            "items": [
                {"name": "Widget", "quantity": 3, "itemCost": 19.99, "taxPercent": 8.25, "itemTotal": 59.97},
                {"name": "Cable", "itemCost": "0.10", "itemTotal": 0.10},
            ],
            "shippingCost": 5,
            "discount": 2.5,
        }));

        let amount = &body["purchase_units"][0]["amount"];
        let breakdown = &amount["breakdown"];
        // 3 x 19.99 + 0.10; per-unit tax round(1999 * 8.25%) = 165 cents.
        assert_eq!(breakdown["item_total"]["value"], "60.07");
        assert_eq!(breakdown["tax_total"]["value"], "4.95");
        assert_eq!(breakdown["shipping"]["value"], "5.00");
        assert_eq!(breakdown["discount"]["value"], "2.50");
        assert_eq!(amount["value"], "67.52");
        assert_eq!(amount["currency_code"], "USD");

        let items = &body["purchase_units"][0]["items"];
        assert_eq!(items[0]["quantity"], "3");
        assert_eq!(items[0]["unit_amount"]["value"], "19.99");
        assert_eq!(items[0]["tax"]["value"], "1.65");
        assert_eq!(items[1]["quantity"], "1");
        assert_eq!(items[1]["tax"]["value"], "0.00");
    }

    #[test]
    fn defaults_and_intent() {
        let body = order(json!({
            "currencyCode": "USD",
            "items": [{"name": "Widget", "itemCost": 10, "itemTotal": 10}],
        }));

        assert_eq!(body["intent"], "CAPTURE");
        let context = &body["payment_source"]["paypal"]["experience_context"];
        assert_eq!(context["return_url"], "https://example.com/returnUrl");
        assert_eq!(context["cancel_url"], "https://example.com/cancelUrl");
        assert!(body["purchase_units"][0].get("shipping").is_none());
        assert_eq!(body["purchase_units"][0]["amount"]["value"], "10.00");
    }

    #[test]
    fn zero_decimal_currency() {
        let body = order(json!({
            "currencyCode": "JPY",
            "items": [{"name": "Tea", "quantity": 2, "itemCost": 500, "taxPercent": 10}],
        }));
        let amount = &body["purchase_units"][0]["amount"];
        assert_eq!(amount["value"], "1100");
        assert_eq!(amount["breakdown"]["tax_total"]["value"], "100");
    }

    #[test]
    fn shipping_address_and_notes_are_carried() {
        let body = order(json!({
            "currencyCode": "USD",
            "items": [{"name": "Widget", "itemCost": 1}],
            "notes": "Gift wrap",
            "shippingAddress": {"address_line_1": "173 Drury Lane", "country_code": "US"},
        }));
        let unit = &body["purchase_units"][0];
        assert_eq!(unit["description"], "Gift wrap");
        assert_eq!(unit["shipping"]["address"]["address_line_1"], "173 Drury Lane");
    }

    #[test]
    fn discount_larger_than_total_is_rejected() {
        let args = validate(
            CREATE,
            json!({"currencyCode": "USD", "items": [{"name": "W", "itemCost": 1}], "discount": 5}),
        )
        .unwrap();
        let err = build_order(&args).unwrap_err();
        assert_eq!(err[0].path, "discount");
    }

    #[test]
    fn empty_cart_is_rejected() {
        let args = validate(CREATE, json!({"currencyCode": "USD", "items": []})).unwrap();
        let err = build_order(&args).unwrap_err();
        assert_eq!(err[0].to_string(), "items: must contain at least one item");
    }

    #[test]
    fn more_than_fifty_items_fail_validation() {
        let items: Vec<Value> = (0..51).map(|i| json!({"name": format!("i{i}"), "itemCost": 1})).collect();
        let err = validate(CREATE, json!({"currencyCode": "USD", "items": items})).unwrap_err();
        assert_eq!(err[0].path, "items");
    }

    #[test]
    fn oversized_amounts_fail_validation() {
        let err = validate(
            CREATE,
            json!({
                "currencyCode": "USD",
                "items": [{"name": "a", "itemCost": 1e16, "quantity": 1000}],
            }),
        )
        .unwrap_err();
        let paths: Vec<&str> = err.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, ["items[0].itemCost"]);

        let err = validate(
            CREATE,
            json!({"currencyCode": "USD", "items": [{"name": "a", "itemCost": 1, "quantity": 10_000_000}]}),
        )
        .unwrap_err();
        assert_eq!(err[0].path, "items[0].quantity");
    }

    #[test]
    fn overflowing_totals_are_rejected_not_wrapped() {
        // Every line within limits, but the sum with full tax exceeds i64 cents.
        let items: Vec<Value> = (0..50)
            .map(|i| json!({"name": format!("i{i}"), "itemCost": 1e9, "quantity": 1_000_000, "taxPercent": 100}))
            .collect();
        let args = validate(CREATE, json!({"currencyCode": "USD", "items": items})).unwrap();
        let err = build_order(&args).unwrap_err();
        assert_eq!(err, vec![Violation::new("items", "amount too large")]);
    }

    #[test]
    fn unvalidated_huge_cost_is_rejected() {
        let args = match json!({"currencyCode": "USD", "items": [{"name": "a", "itemCost": 1e300, "quantity": 2}]}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        let err = build_order(&args).unwrap_err();
        assert_eq!(err[0].to_string(), "items: amount too large");
    }
}
