//! Invoicing tools (`/v2/invoicing`).

use crate::definition::ToolDefinition;
use crate::schema::{DefaultValue, Field, Kind};

const UNITS_OF_MEASURE: &[&str] = &["QUANTITY", "HOURS", "AMOUNT"];

const MONEY: &[Field] = &[
    Field::string("currency_code", "Three-letter ISO-4217 currency code").required(),
    Field::string("value", "Amount with up to two decimal places, e.g. \"10.00\"").required(),
];

const TAX: &[Field] = &[
    Field::string("name", "Name of the tax"),
    Field::string("percent", "Tax rate as a percentage, e.g. \"7.25\""),
];

const ITEM: &[Field] = &[
    Field::string("name", "Item name").required(),
    Field::string("quantity", "Quantity, up to five decimal places").required(),
    Field::object("unit_amount", MONEY, "Price of one unit").required(),
    Field::object("tax", TAX, "Tax applied to the item"),
    Field::string("description", "Item description"),
    Field::one_of("unit_of_measure", UNITS_OF_MEASURE, "Unit the quantity is measured in"),
];
const ITEM_KIND: Kind = Kind::Object(ITEM);

const DETAIL: &[Field] = &[
    Field::string("currency_code", "Currency of every amount on the invoice").required(),
    Field::string("invoice_number", "Invoice number; PayPal generates one if absent"),
    Field::string("invoice_date", "Invoice date, YYYY-MM-DD"),
    Field::string("note", "Note to the recipient"),
    Field::string("terms_and_conditions", "Terms shown on the invoice"),
    Field::string("memo", "Private memo visible only to the invoicer"),
];

const NAME: &[Field] = &[
    Field::string("given_name", "First name"),
    Field::string("surname", "Last name"),
];

const INVOICER: &[Field] = &[
    Field::string("business_name", "Business name of the invoicer"),
    Field::object("name", NAME, "Name of the invoicer"),
    Field::string("email_address", "Email address of the invoicer"),
];

const BILLING_INFO: &[Field] = &[
    Field::object("name", NAME, "Name of the recipient"),
    Field::string("email_address", "Email address the invoice is sent to"),
];

const RECIPIENT: &[Field] = &[Field::object("billing_info", BILLING_INFO, "Billing details").required()];
const RECIPIENT_KIND: Kind = Kind::Object(RECIPIENT);
const EMAIL_KIND: Kind = Kind::String;

const INVOICE_ID: Field = Field::string("invoice_id", "ID of the invoice").in_path();

const CREATE: &[Field] = &[
    Field::object("detail", DETAIL, "Invoice details").required(),
    Field::object("invoicer", INVOICER, "Who the invoice is from"),
    Field::array("primary_recipients", &RECIPIENT_KIND, "Who the invoice is billed to"),
    Field::array("items", &ITEM_KIND, "Line items").max_items(100),
];

const LIST: &[Field] = &[
    Field::integer("page", "Page number, starting at 1")
        .in_query()
        .min(1.0)
        .default(DefaultValue::Int(1)),
    Field::integer("page_size", "Invoices per page")
        .in_query()
        .min(1.0)
        .max(100.0)
        .default(DefaultValue::Int(100)),
    Field::boolean("total_required", "Include the total invoice count").in_query(),
];

const GET: &[Field] = &[INVOICE_ID];

const SEND: &[Field] = &[
    INVOICE_ID,
    Field::string("subject", "Subject of the notification email"),
    Field::string("note", "Note included in the notification"),
    Field::boolean("send_to_invoicer", "Send a copy to the invoicer"),
    Field::boolean("send_to_recipient", "Email the recipient"),
    Field::array("additional_recipients", &EMAIL_KIND, "Extra email addresses to notify"),
];

const REMIND: &[Field] = &[
    INVOICE_ID,
    Field::string("subject", "Subject of the reminder email"),
    Field::string("note", "Note included in the reminder"),
    Field::array("additional_recipients", &EMAIL_KIND, "Extra email addresses to notify"),
];

const CANCEL: &[Field] = &[
    INVOICE_ID,
    Field::string("subject", "Subject of the cancellation email"),
    Field::string("note", "Reason for cancelling"),
    Field::boolean("send_to_invoicer", "Send a copy to the invoicer"),
    Field::boolean("send_to_recipient", "Email the recipient"),
    Field::array("additional_recipients", &EMAIL_KIND, "Extra email addresses to notify"),
];

const QR_CODE: &[Field] = &[
    INVOICE_ID,
    Field::integer("width", "Image width in pixels")
        .required()
        .min(150.0)
        .max(500.0),
    Field::integer("height", "Image height in pixels")
        .required()
        .min(150.0)
        .max(500.0),
];

pub(crate) const TOOLS: &[ToolDefinition] = &[
    ToolDefinition::post("invoices.create", "create_invoice", "/v2/invoicing/invoices")
        .titled("Create Invoice")
        .describe("Create a draft invoice. Send it with send_invoice to deliver it to the recipient.")
        .params(CREATE),
    ToolDefinition::get("invoices.list", "list_invoices", "/v2/invoicing/invoices")
        .titled("List Invoices")
        .describe("List invoices, newest first, one page at a time.")
        .params(LIST),
    ToolDefinition::get("invoices.get", "get_invoice", "/v2/invoicing/invoices/{invoice_id}")
        .titled("Get Invoice")
        .describe("Show the details of one invoice.")
        .params(GET),
    ToolDefinition::post("invoices.send", "send_invoice", "/v2/invoicing/invoices/{invoice_id}/send")
        .titled("Send Invoice")
        .describe("Send a draft invoice to its recipients.")
        .params(SEND),
    ToolDefinition::post(
        "invoices.sendReminder",
        "send_invoice_reminder",
        "/v2/invoicing/invoices/{invoice_id}/remind",
    )
    .titled("Send Invoice Reminder")
    .describe("Remind the recipient about an unpaid invoice.")
    .params(REMIND),
    ToolDefinition::post(
        "invoices.cancel",
        "cancel_sent_invoice",
        "/v2/invoicing/invoices/{invoice_id}/cancel",
    )
    .titled("Cancel Sent Invoice")
    .describe("Cancel an invoice that has already been sent.")
    .params(CANCEL),
    ToolDefinition::post(
        "invoices.generateQRC",
        "generate_invoice_qr_code",
        "/v2/invoicing/invoices/{invoice_id}/generate-qr-code",
    )
    .titled("Generate Invoice QR Code")
    .describe("Generate a QR code image that opens the invoice's payment page.")
    .params(QR_CODE),
];
