use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tienda_model::{Product, ProductDraft, ProductId};
use tracing::info;

use crate::rows::{product_from_row, PRODUCT_COLUMNS};
use crate::{Store, StoreError};

pub(crate) fn find_product(conn: &Connection, id: ProductId) -> Result<Option<Product>, StoreError> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1");
    Ok(conn
        .query_row(&sql, params![id.get()], product_from_row)
        .optional()?)
}

impl Store {
    pub fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let conn = self.connect()?;
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], product_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        find_product(&self.connect()?, id)
    }

    pub fn create_product(&self, draft: &ProductDraft) -> Result<Product, StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO products (name, description, price_cents, stock, image_url, size, category)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                draft.name,
                draft.description,
                draft.price.cents(),
                draft.stock,
                draft.image_url,
                draft.size,
                draft.category,
            ],
        )?;
        let id = ProductId(conn.last_insert_rowid());
        info!(product_id = %id, "product created");
        find_product(&conn, id)?.ok_or_else(|| StoreError::not_found("product"))
    }

    /// Replaces every field of an existing product.
    pub fn update_product(&self, id: ProductId, draft: &ProductDraft) -> Result<Product, StoreError> {
        let conn = self.connect()?;
        let changed = conn.execute(
            "UPDATE products SET name = ?1, description = ?2, price_cents = ?3, stock = ?4,
             image_url = ?5, size = ?6, category = ?7 WHERE id = ?8",
            params![
                draft.name,
                draft.description,
                draft.price.cents(),
                draft.stock,
                draft.image_url,
                draft.size,
                draft.category,
                id.get(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::not_found("product"));
        }
        find_product(&conn, id)?.ok_or_else(|| StoreError::not_found("product"))
    }

    /// Deletes a product and any cart lines holding it. Products that appear
    /// in sales history are kept.
    pub fn delete_product(&self, id: ProductId) -> Result<(), StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if find_product(&tx, id)?.is_none() {
            return Err(StoreError::not_found("product"));
        }
        let sold: i64 = tx.query_row(
            "SELECT COUNT(*) FROM sale_items WHERE product_id = ?1",
            params![id.get()],
            |row| row.get(0),
        )?;
        if sold > 0 {
            return Err(StoreError::Conflict(
                "product appears in recorded sales and cannot be deleted".to_string(),
            ));
        }
        tx.execute("DELETE FROM cart_items WHERE product_id = ?1", params![id.get()])?;
        tx.execute("DELETE FROM products WHERE id = ?1", params![id.get()])?;
        tx.commit()?;
        info!(product_id = %id, "product deleted");
        Ok(())
    }
}
