use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One row of the `jeans` table as the catalog routes see it.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub brand: Option<String>,
    pub selling_price: Option<Value>,
    pub mrp: Option<Value>,
    pub discount: Option<f64>,
    pub feature_image_s3: Option<String>,
    pub pdp_url: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
    pub meta_info: Option<String>,
    pub feature_list: Option<Value>,
    pub pdp_images_s3: Option<Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub product_id: String,
    pub product_name: String,
    pub brand: String,
    pub sku: Option<String>,
    pub pdp_url: Option<String>,
    pub selling_price: Option<Value>,
    pub mrp: Option<Value>,
    pub discount: f64,
    pub category_id: Option<i64>,
    pub description: Option<String>,
    pub launch_on: Option<String>,
    pub feature_list: Option<Value>,
    pub pdp_images_s3: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductItem {
    pub id: i64,
    pub product_id: Option<String>,
    pub product_name: String,
    pub brand: String,
    pub price_usd: Option<f64>,
    pub selling_price: Option<Value>,
    pub discount: f64,
    pub feature_image_s3: Option<String>,
    pub pdp_url: Option<String>,
    pub sku: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub item: ProductItem,
    pub description: Option<String>,
    pub meta_info: Option<String>,
    pub feature_list: Option<Value>,
    pub pdp_images_s3: Option<Value>,
    pub mrp: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductPage {
    pub items: Vec<ProductItem>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl From<&Product> for ProductItem {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            product_id: product.product_id.clone(),
            product_name: product.product_name.clone().unwrap_or_default(),
            brand: product.brand.clone().unwrap_or_default(),
            price_usd: product.selling_price.as_ref().and_then(extract_usd_price),
            selling_price: product.selling_price.clone(),
            discount: product.discount.unwrap_or(0.0),
            feature_image_s3: product.feature_image_s3.clone(),
            pdp_url: product.pdp_url.clone(),
            sku: product.sku.clone(),
        }
    }
}

impl From<Product> for ProductDetail {
    fn from(product: Product) -> Self {
        Self {
            item: ProductItem::from(&product),
            description: product.description,
            meta_info: product.meta_info,
            feature_list: product.feature_list,
            pdp_images_s3: product.pdp_images_s3,
            mrp: product.mrp,
        }
    }
}

/// Pulls the `USD` amount out of a price column.
///
/// Accepts a JSON object, a JSON-encoded string, or the single-quoted
/// Python-literal form (`{'USD': 285.99}`) that older CSV imports left behind.
pub fn extract_usd_price(raw: &Value) -> Option<f64> {
    match raw {
        Value::Object(map) => map.get("USD").and_then(Value::as_f64),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                return None;
            }
            let parsed = serde_json::from_str::<Value>(s)
                .or_else(|_| serde_json::from_str::<Value>(&python_literal_to_json(s)))
                .ok()?;
            match parsed {
                Value::Object(_) => extract_usd_price(&parsed),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Rewrites a Python dict/list literal as JSON. Only quotes that delimit
/// strings are rewritten, and `None`/`True`/`False` only outside strings.
fn python_literal_to_json(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' => {
                out.push('"');
                while let Some(c) = chars.next() {
                    match c {
                        '\\' => match chars.next() {
                            Some('\'') => out.push('\''),
                            Some(escaped) => {
                                out.push('\\');
                                out.push(escaped);
                            }
                            None => out.push_str("\\\\"),
                        },
                        c if c == ch => break,
                        '"' => out.push_str("\\\""),
                        c => out.push(c),
                    }
                }
                out.push('"');
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if !next.is_ascii_alphanumeric() && next != '_' {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                out.push_str(match word.as_str() {
                    "None" => "null",
                    "True" => "true",
                    "False" => "false",
                    other => other,
                });
            }
            c => out.push(c),
        }
    }
    out
}

/// Decodes a JSON-typed text column, keeping undecodable text as a string.
pub(crate) fn parse_json_column(raw: Option<String>) -> Option<Value> {
    raw.map(|text| serde_json::from_str(&text).unwrap_or(Value::String(text)))
}
