use std::path::Path;

/// Schema notes used when no external schema document is configured.
pub const DEFAULT_SCHEMA_DOC: &str = "\
### Table `jeans`
| column | type | notes |
|---|---|---|
| id | INTEGER | primary key |
| product_id | TEXT | unique hash |
| product_name | TEXT | |
| brand | TEXT | upper-case brand name, e.g. 'RALPH LAUREN' |
| sku | TEXT | |
| selling_price | JSON | `{\"USD\": 285.99}` |
| mrp | JSON | list price, same shape as selling_price |
| discount | REAL | fraction, 0.25 = 25% off |
| category_id, department_id, channel_id | INTEGER | |
| meta_info, description | TEXT | free text |
| pdp_url | TEXT | retailer product page |
| feature_image_s3 | TEXT | main image URL |
| feature_list | JSON | array of feature strings |
| style_attributes | JSON | object of style facets (fit, rise, wash, ...) |
| pdp_images_s3 | JSON | array of image URLs |
| launch_on, last_seen_date | DATE | `YYYY-MM-DD` |
";

/// Reads the schema document at `path`, falling back to the built-in notes.
pub fn load_schema_doc(path: Option<&Path>) -> String {
    let Some(path) = path else {
        return DEFAULT_SCHEMA_DOC.to_string();
    };
    match std::fs::read_to_string(path) {
        Ok(doc) => {
            tracing::info!(path = %path.display(), "loaded database schema documentation");
            doc
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "schema documentation unavailable, using built-in notes");
            DEFAULT_SCHEMA_DOC.to_string()
        }
    }
}

pub fn system_instruction(schema_doc: &str) -> String {
    format!(
        "You are acting as an AI assistant for a jeans e-commerce database.
You answer questions about jeans products in the database, including product information, brands, prices, and specifications.

Your responsibility is to help users query and understand the jeans product data.
Be professional, accurate, and helpful in your responses.

If you need specific data from the database, use the generate_query_sql tool.
When it helps the user navigate, call show_navigation_buttons with links to relevant products or listings, and still answer in text.
Messages may start with the page the user is currently viewing; use it as context.

IMPORTANT DATABASE QUERY GUIDELINES:
- You can ONLY use a single SELECT statement to read data
- NO INSERT, UPDATE, DELETE, or any data modification operations are allowed
- The main table is 'jeans' - always query from this table
- The database is SQLite; use SQLite syntax
- Use a LIMIT clause to avoid retrieving too many rows (e.g., LIMIT 10 or LIMIT 100)
- When querying JSON fields like selling_price or mrp, use SQLite JSON functions:
  * json_extract(selling_price, '$.USD') to get the USD value as a number
  * selling_price ->> '$.USD' is equivalent
- Common queries include filtering by brand, price range, discount, dates, etc.
- When showing prices, always format them nicely with currency symbols

## Database Schema:
{schema_doc}

With this context, please help users explore and query the jeans product database."
    )
}
