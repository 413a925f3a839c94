//! Subscription plan and subscription tools (`/v1/billing`).

use crate::definition::{Body, ToolDefinition};
use crate::schema::{Field, Kind};

const INTERVAL_UNITS: &[&str] = &["DAY", "WEEK", "MONTH", "YEAR"];
const TENURE_TYPES: &[&str] = &["REGULAR", "TRIAL"];
const SETUP_FEE_FAILURE_ACTIONS: &[&str] = &["CONTINUE", "CANCEL"];
const SHIPPING_PREFERENCES: &[&str] = &["SET_PROVIDED_ADDRESS", "GET_FROM_FILE", "NO_SHIPPING"];
const USER_ACTIONS: &[&str] = &["SUBSCRIBE_NOW", "CONTINUE"];
const PAYER_SELECTED: &[&str] = &["PAYPAL", "CREDIT_CARD"];
const PAYEE_PREFERRED: &[&str] = &["IMMEDIATE_PAYMENT_REQUIRED", "UNRESTRICTED"];

const MONEY: &[Field] = &[
    Field::string("currency_code", "Three-letter ISO-4217 currency code").required(),
    Field::string("value", "Amount, e.g. \"9.99\"").required(),
];

const FREQUENCY: &[Field] = &[
    Field::one_of("interval_unit", INTERVAL_UNITS, "Unit of the billing interval").required(),
    Field::integer("interval_count", "Number of units per interval")
        .required()
        .min(1.0),
];

const PRICING_SCHEME: &[Field] = &[
    Field::object("fixed_price", MONEY, "Fixed amount charged each cycle"),
    Field::integer("version", "Pricing scheme version"),
];

const BILLING_CYCLE: &[Field] = &[
    Field::object("frequency", FREQUENCY, "How often the cycle bills").required(),
    Field::one_of("tenure_type", TENURE_TYPES, "Trial or regular cycle").required(),
    Field::integer("sequence", "Order in which this cycle runs, starting at 1")
        .required()
        .min(1.0)
        .max(99.0),
    Field::integer("total_cycles", "Times the cycle runs; 0 means until cancelled")
        .min(0.0)
        .max(999.0),
    Field::object("pricing_scheme", PRICING_SCHEME, "Price of the cycle").required(),
];
const BILLING_CYCLE_KIND: Kind = Kind::Object(BILLING_CYCLE);

const PAYMENT_PREFERENCES: &[Field] = &[
    Field::boolean("auto_bill_outstanding", "Bill the outstanding amount in the next cycle"),
    Field::object("setup_fee", MONEY, "One-time fee charged at signup"),
    Field::one_of(
        "setup_fee_failure_action",
        SETUP_FEE_FAILURE_ACTIONS,
        "What to do when the setup fee fails",
    ),
    Field::integer("payment_failure_threshold", "Failed payments before suspension")
        .min(0.0)
        .max(999.0),
];

const TAXES: &[Field] = &[
    Field::string("percentage", "Tax percentage, e.g. \"10\"").required(),
    Field::boolean("inclusive", "Whether the tax is already included in the price"),
];

const CREATE_PLAN: &[Field] = &[
    Field::string("product_id", "Product the plan bills for").required(),
    Field::string("name", "Plan name").required(),
    Field::string("description", "Plan description"),
    Field::array("billing_cycles", &BILLING_CYCLE_KIND, "Trial and regular billing cycles")
        .required()
        .max_items(12),
    Field::object("payment_preferences", PAYMENT_PREFERENCES, "Billing preferences"),
    Field::object("taxes", TAXES, "Tax details"),
];

const LIST_PLANS: &[Field] = &[
    Field::string("product_id", "Only list plans for this product").in_query(),
    Field::integer("page", "Page number, starting at 1").in_query().min(1.0),
    Field::integer("page_size", "Plans per page")
        .in_query()
        .min(1.0)
        .max(20.0),
    Field::boolean("total_required", "Include the total plan count").in_query(),
];

const SHOW_PLAN: &[Field] = &[Field::string("plan_id", "ID of the plan").in_path()];

const NAME: &[Field] = &[
    Field::string("given_name", "First name").required(),
    Field::string("surname", "Last name"),
];

const FULL_NAME: &[Field] = &[Field::string("full_name", "Recipient's full name").required()];

const ADDRESS: &[Field] = &[
    Field::string("address_line_1", "Street address").required(),
    Field::string("address_line_2", "Suite or apartment"),
    Field::string("admin_area_2", "City or town").required(),
    Field::string("admin_area_1", "State or province").required(),
    Field::string("postal_code", "Postal code").required(),
    Field::string("country_code", "Two-letter ISO-3166 country code").required(),
];

const SHIPPING_ADDRESS: &[Field] = &[
    Field::object("name", FULL_NAME, "Name on the package").required(),
    Field::object("address", ADDRESS, "Shipping address").required(),
];

const SUBSCRIBER: &[Field] = &[
    Field::object("name", NAME, "Subscriber name").required(),
    Field::string("email_address", "Subscriber email address").required(),
    Field::object("shipping_address", SHIPPING_ADDRESS, "Where to ship the product"),
];

const PAYMENT_METHOD: &[Field] = &[
    Field::one_of("payer_selected", PAYER_SELECTED, "Funding source picked by the payer"),
    Field::one_of("payee_preferred", PAYEE_PREFERRED, "Payee's funding preference"),
];

const APPLICATION_CONTEXT: &[Field] = &[
    Field::string("brand_name", "Brand shown on the PayPal approval page"),
    Field::string("locale", "BCP-47 locale of the approval page, e.g. en-US"),
    Field::one_of("shipping_preference", SHIPPING_PREFERENCES, "Where the shipping address comes from"),
    Field::one_of("user_action", USER_ACTIONS, "Label of the approval button"),
    Field::object("payment_method", PAYMENT_METHOD, "Payment method preferences"),
    Field::string("return_url", "Where the payer goes after approving").required(),
    Field::string("cancel_url", "Where the payer goes after cancelling").required(),
];

const CREATE_SUBSCRIPTION: &[Field] = &[
    Field::string("plan_id", "Plan to subscribe to").required(),
    Field::string("quantity", "Quantity of the product"),
    Field::object("shipping_amount", MONEY, "Shipping charge"),
    Field::object("subscriber", SUBSCRIBER, "Who is subscribing").required(),
    Field::object("application_context", APPLICATION_CONTEXT, "Approval flow settings"),
];

const SUBSCRIPTION_ID: Field = Field::string("subscription_id", "ID of the subscription").in_path();

const SHOW_SUBSCRIPTION: &[Field] = &[SUBSCRIPTION_ID];

const CANCELLATION: &[Field] = &[Field::string("reason", "Why the subscription is cancelled").required()];

const CANCEL_SUBSCRIPTION: &[Field] = &[
    SUBSCRIPTION_ID,
    Field::object("payload", CANCELLATION, "Cancellation details").required(),
];

pub(crate) const TOOLS: &[ToolDefinition] = &[
    ToolDefinition::post("subscriptionPlans.create", "create_subscription_plan", "/v1/billing/plans")
        .titled("Create Subscription Plan")
        .describe("Create a billing plan with trial and regular cycles for an existing product.")
        .params(CREATE_PLAN),
    ToolDefinition::get("subscriptionPlans.list", "list_subscription_plans", "/v1/billing/plans")
        .titled("List Subscription Plans")
        .describe("List billing plans, optionally for one product.")
        .params(LIST_PLANS),
    ToolDefinition::get(
        "subscriptionPlans.show",
        "show_subscription_plan_details",
        "/v1/billing/plans/{plan_id}",
    )
    .titled("Show Subscription Plan Details")
    .describe("Show the details of one billing plan.")
    .params(SHOW_PLAN),
    ToolDefinition::post("subscriptions.create", "create_subscription", "/v1/billing/subscriptions")
        .titled("Create Subscription")
        .describe(
            "Subscribe a customer to a plan. The response links to the approval page the \
             subscriber must visit.",
        )
        .params(CREATE_SUBSCRIPTION),
    ToolDefinition::get(
        "subscriptions.show",
        "show_subscription_details",
        "/v1/billing/subscriptions/{subscription_id}",
    )
    .titled("Show Subscription Details")
    .describe("Show the details of one subscription.")
    .params(SHOW_SUBSCRIPTION),
    ToolDefinition::post(
        "subscriptions.cancel",
        "cancel_subscription",
        "/v1/billing/subscriptions/{subscription_id}/cancel",
    )
    .titled("Cancel Subscription")
    .describe("Cancel an active subscription.")
    .params(CANCEL_SUBSCRIPTION)
    .body(Body::Field("payload")),
];
