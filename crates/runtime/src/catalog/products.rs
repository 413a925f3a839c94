//! Catalog product tools (`/v1/catalogs/products`).

use crate::definition::{Body, ToolDefinition};
use crate::schema::{Field, Kind};

const PRODUCT_TYPES: &[&str] = &["PHYSICAL", "DIGITAL", "SERVICE"];
const PATCH_OPS: &[&str] = &["add", "remove", "replace", "move", "copy", "test"];

const PRODUCT_ID: Field = Field::string("product_id", "ID of the product").in_path();

const CREATE: &[Field] = &[
    Field::string("name", "Product name").required(),
    Field::one_of("type", PRODUCT_TYPES, "Product type").required(),
    Field::string("description", "Product description"),
    Field::string("category", "Product category, e.g. SOFTWARE"),
    Field::string("image_url", "Image URL for the product"),
    Field::string("home_url", "Home page URL for the product"),
];

const LIST: &[Field] = &[
    Field::integer("page", "Page number, starting at 1").in_query().min(1.0),
    Field::integer("page_size", "Products per page")
        .in_query()
        .min(1.0)
        .max(100.0),
    Field::boolean("total_required", "Include the total product count").in_query(),
];

const SHOW: &[Field] = &[PRODUCT_ID];

const PATCH_OPERATION: &[Field] = &[
    Field::one_of("op", PATCH_OPS, "JSON Patch operation").required(),
    Field::string("path", "JSON Pointer to the field, e.g. /description").required(),
    Field::any("value", "New value for add and replace"),
    Field::string("from", "Source pointer for move and copy"),
];
const PATCH_OPERATION_KIND: Kind = Kind::Object(PATCH_OPERATION);

const UPDATE: &[Field] = &[
    PRODUCT_ID,
    Field::array("operations", &PATCH_OPERATION_KIND, "JSON Patch operations to apply").required(),
];

pub(crate) const TOOLS: &[ToolDefinition] = &[
    ToolDefinition::post("products.create", "create_product", "/v1/catalogs/products")
        .titled("Create Product")
        .describe("Create a catalog product that subscription plans can be attached to.")
        .params(CREATE),
    ToolDefinition::get("products.list", "list_products", "/v1/catalogs/products")
        .titled("List Products")
        .describe("List catalog products.")
        .params(LIST),
    ToolDefinition::get("products.show", "show_product_details", "/v1/catalogs/products/{product_id}")
        .titled("Show Product Details")
        .describe("Show the details of one catalog product.")
        .params(SHOW),
    ToolDefinition::patch("products.update", "update_product", "/v1/catalogs/products/{product_id}")
        .titled("Update Product")
        .describe("Update a catalog product with JSON Patch operations.")
        .params(UPDATE)
        .body(Body::Field("operations")),
];
