pub mod models;

use models::{parse_json_column, NewProduct, Product, ProductDetail, ProductItem, ProductPage};
use rusqlite::{params, Connection, OptionalExtension, Result, Row};
use std::path::{Path, PathBuf};
use std::time::Duration;

const PRODUCT_COLUMNS: &str = "id, product_id, product_name, brand, selling_price, mrp, discount, \
     feature_image_s3, pdp_url, sku, description, meta_info, feature_list, pdp_images_s3";

/// Handle on the catalog database file. Connections are opened per use and
/// never shared between requests.
#[derive(Debug, Clone)]
pub struct Database {
    path: PathBuf,
}

impl Database {
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Self {
            path: path.to_path_buf(),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Opens a fresh connection to the catalog.
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(conn)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.connect()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS jeans (
                id INTEGER PRIMARY KEY,
                selling_price JSON,
                discount REAL DEFAULT 0.0,
                category_id INTEGER,
                meta_info TEXT,
                product_id TEXT UNIQUE,
                pdp_url TEXT,
                sku TEXT,
                brand TEXT,
                department_id INTEGER,
                last_seen_date DATE,
                launch_on DATE,
                mrp JSON,
                product_name TEXT,
                feature_image_s3 TEXT,
                channel_id INTEGER,
                feature_list JSON,
                description TEXT,
                style_attributes JSON,
                pdp_images_s3 JSON,
                images_minio JSON
            );

            CREATE INDEX IF NOT EXISTS ix_jeans_brand ON jeans (brand);
            CREATE INDEX IF NOT EXISTS ix_jeans_sku ON jeans (sku);
            CREATE INDEX IF NOT EXISTS ix_jeans_product_name ON jeans (product_name);
            CREATE INDEX IF NOT EXISTS ix_jeans_category_id ON jeans (category_id);
            ",
        )?;
        Ok(())
    }

    // ── Products ──

    pub fn insert_product(&self, product: &NewProduct) -> Result<i64> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO jeans (product_id, product_name, brand, sku, pdp_url, selling_price, mrp, \
             discount, category_id, description, launch_on, feature_list, pdp_images_s3) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                product.product_id,
                product.product_name,
                product.brand,
                product.sku,
                product.pdp_url,
                product.selling_price.as_ref().map(|v| v.to_string()),
                product.mrp.as_ref().map(|v| v.to_string()),
                product.discount,
                product.category_id,
                product.description,
                product.launch_on,
                product.feature_list.as_ref().map(|v| v.to_string()),
                product.pdp_images_s3.as_ref().map(|v| v.to_string()),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Lists products matching `search` against name or brand, ordered by id.
    pub fn list_products(&self, search: &str, page: i64, per_page: i64) -> Result<ProductPage> {
        let conn = self.connect()?;
        let term = search.trim();
        let pattern = format!("%{}%", term);
        let filter = if term.is_empty() {
            ""
        } else {
            "WHERE product_name LIKE ?1 OR brand LIKE ?1"
        };

        let total: i64 = if term.is_empty() {
            conn.query_row("SELECT COUNT(*) FROM jeans", [], |row| row.get(0))?
        } else {
            conn.query_row(
                &format!("SELECT COUNT(*) FROM jeans {}", filter),
                params![pattern],
                |row| row.get(0),
            )?
        };

        let offset = (page - 1).saturating_mul(per_page);
        let items = if term.is_empty() {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM jeans ORDER BY id LIMIT ?1 OFFSET ?2",
                PRODUCT_COLUMNS
            ))?;
            let rows = stmt.query_map(params![per_page, offset], product_from_row)?;
            rows.collect::<Result<Vec<_>>>()?
        } else {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM jeans {} ORDER BY id LIMIT ?2 OFFSET ?3",
                PRODUCT_COLUMNS, filter
            ))?;
            let rows = stmt.query_map(params![pattern, per_page, offset], product_from_row)?;
            rows.collect::<Result<Vec<_>>>()?
        };

        let total_pages = if total > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Ok(ProductPage {
            items: items.iter().map(ProductItem::from).collect(),
            total,
            page,
            per_page,
            total_pages,
        })
    }

    pub fn get_product(&self, id: i64) -> Result<Option<ProductDetail>> {
        let conn = self.connect()?;
        let product = conn
            .query_row(
                &format!("SELECT {} FROM jeans WHERE id = ?1", PRODUCT_COLUMNS),
                params![id],
                product_from_row,
            )
            .optional()?;
        Ok(product.map(ProductDetail::from))
    }
}

fn product_from_row(row: &Row<'_>) -> Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        product_id: row.get(1)?,
        product_name: row.get(2)?,
        brand: row.get(3)?,
        selling_price: parse_json_column(row.get(4)?),
        mrp: parse_json_column(row.get(5)?),
        discount: row.get(6)?,
        feature_image_s3: row.get(7)?,
        pdp_url: row.get(8)?,
        sku: row.get(9)?,
        description: row.get(10)?,
        meta_info: row.get(11)?,
        feature_list: parse_json_column(row.get(12)?),
        pdp_images_s3: parse_json_column(row.get(13)?),
    })
}
