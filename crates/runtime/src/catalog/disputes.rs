//! Dispute tools (`/v1/customer/disputes`).

use crate::definition::ToolDefinition;
use crate::schema::{DefaultValue, Field};

const STATES: &[&str] = &[
    "REQUIRED_ACTION",
    "REQUIRED_OTHER_PARTY_ACTION",
    "UNDER_PAYPAL_REVIEW",
    "RESOLVED",
    "OPEN_INQUIRIES",
    "APPEALABLE",
];

const DISPUTE_ID: Field = Field::string("dispute_id", "ID of the dispute").in_path();

const LIST: &[Field] = &[
    Field::string("disputed_transaction_id", "Only disputes for this transaction").in_query(),
    Field::one_of("dispute_state", STATES, "Only disputes in this state").in_query(),
    Field::integer("page_size", "Disputes per page")
        .in_query()
        .min(1.0)
        .max(50.0)
        .default(DefaultValue::Int(10)),
    Field::integer("page", "Page number, starting at 1")
        .in_query()
        .min(1.0)
        .default(DefaultValue::Int(1)),
];

const GET: &[Field] = &[DISPUTE_ID];

const ACCEPT: &[Field] = &[
    DISPUTE_ID,
    Field::string("note", "Why the merchant is accepting the claim").required(),
];

pub(crate) const TOOLS: &[ToolDefinition] = &[
    ToolDefinition::get("disputes.list", "list_disputes", "/v1/customer/disputes")
        .titled("List Disputes")
        .describe("List disputes, optionally filtered by transaction or state.")
        .params(LIST),
    ToolDefinition::get("disputes.get", "get_dispute", "/v1/customer/disputes/{dispute_id}")
        .titled("Get Dispute")
        .describe("Show the details of one dispute.")
        .params(GET),
    ToolDefinition::post(
        "disputes.accept",
        "accept_dispute_claim",
        "/v1/customer/disputes/{dispute_id}/accept-claim",
    )
    .titled("Accept Dispute Claim")
    .describe("Accept the buyer's claim and close the dispute in their favour.")
    .params(ACCEPT),
];
