use chrono::{SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::collections::BTreeMap;
use tienda_model::{
    ClientId, Money, ProductId, Quantity, Sale, SaleId, SaleItem, SaleItemId, SaleLine,
    SaleLineRequest, UserId,
};
use tracing::{info, warn};

use crate::catalog::find_product;
use crate::clients::find_client;
use crate::rows::{money_col, quantity_col, timestamp_col};
use crate::{Store, StoreError};

#[derive(Debug, Clone, Copy)]
enum SaleOwner {
    User(UserId),
    Client(ClientId),
}

#[derive(Debug, Clone, Copy)]
struct PricedLine {
    product_id: ProductId,
    quantity: Quantity,
    unit_price: Money,
}

const SALE_COLUMNS: &str = "id, created_at, total_cents, user_id, client_id";

/// Checks every product exists and has enough stock for the summed quantity
/// requested across all lines. Nothing is written.
fn validate_stock(conn: &Connection, lines: &[PricedLine]) -> Result<(), StoreError> {
    let mut wanted: BTreeMap<ProductId, u64> = BTreeMap::new();
    for line in lines {
        *wanted.entry(line.product_id).or_insert(0) += u64::from(line.quantity.get());
    }
    for (product_id, qty) in wanted {
        let product = find_product(conn, product_id)?
            .ok_or_else(|| StoreError::NotFound(format!("product {product_id} not found")))?;
        if u64::from(product.stock) < qty {
            return Err(StoreError::InsufficientStock(format!(
                "not enough stock for {}",
                product.name
            )));
        }
    }
    Ok(())
}

fn write_sale(conn: &Connection, owner: SaleOwner, lines: &[PricedLine]) -> Result<Sale, StoreError> {
    validate_stock(conn, lines)?;

    let mut total = Money::ZERO;
    for line in lines {
        total = line
            .unit_price
            .checked_mul(line.quantity)
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or_else(|| StoreError::Invalid("sale total overflows".to_string()))?;
    }
    let created_at = Utc::now().trunc_subsecs(6);
    let (user_id, client_id) = match owner {
        SaleOwner::User(id) => (Some(id), None),
        SaleOwner::Client(id) => (None, Some(id)),
    };
    conn.execute(
        "INSERT INTO sales (created_at, total_cents, user_id, client_id) VALUES (?1, ?2, ?3, ?4)",
        params![
            created_at.to_rfc3339_opts(SecondsFormat::Micros, true),
            total.cents(),
            user_id.map(UserId::get),
            client_id.map(ClientId::get),
        ],
    )?;
    let sale_id = SaleId(conn.last_insert_rowid());

    let mut items = Vec::with_capacity(lines.len());
    {
        let mut insert_item = conn.prepare(
            "INSERT INTO sale_items (sale_id, product_id, quantity, unit_price_cents) VALUES (?1, ?2, ?3, ?4)",
        )?;
        let mut decrement = conn.prepare(
            "UPDATE products SET stock = stock - ?1 WHERE id = ?2 AND stock >= ?1",
        )?;
        for line in lines {
            insert_item.execute(params![
                sale_id.get(),
                line.product_id.get(),
                line.quantity.get(),
                line.unit_price.cents(),
            ])?;
            items.push(SaleItem {
                id: SaleItemId(conn.last_insert_rowid()),
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
            });
            let changed = decrement.execute(params![line.quantity.get(), line.product_id.get()])?;
            if changed != 1 {
                return Err(StoreError::InsufficientStock(format!(
                    "not enough stock for product {}",
                    line.product_id
                )));
            }
        }
    }

    Ok(Sale {
        id: sale_id,
        created_at,
        total,
        user_id,
        client_id,
        items,
    })
}

fn items_for_sales(conn: &Connection) -> Result<BTreeMap<SaleId, Vec<SaleItem>>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, sale_id, product_id, quantity, unit_price_cents FROM sale_items ORDER BY sale_id, id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok((
            SaleId(row.get(1)?),
            SaleItem {
                id: SaleItemId(row.get(0)?),
                product_id: ProductId(row.get(2)?),
                quantity: quantity_col(row, 3)?,
                unit_price: money_col(row, 4)?,
            },
        ))
    })?;
    let mut grouped: BTreeMap<SaleId, Vec<SaleItem>> = BTreeMap::new();
    for row in rows {
        let (sale_id, item) = row?;
        grouped.entry(sale_id).or_default().push(item);
    }
    Ok(grouped)
}

fn sale_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sale> {
    Ok(Sale {
        id: SaleId(row.get(0)?),
        created_at: timestamp_col(row, 1)?,
        total: money_col(row, 2)?,
        user_id: row.get::<_, Option<i64>>(3)?.map(UserId),
        client_id: row.get::<_, Option<i64>>(4)?.map(ClientId),
        items: Vec::new(),
    })
}

impl Store {
    /// Turns the user's cart into a sale in one write transaction: validates
    /// stock for every line, records the sale and its lines at the prices
    /// captured in the cart, decrements stock and empties the cart. Any
    /// failure leaves cart, stock and sales untouched.
    pub fn checkout(&self, user: UserId) -> Result<Sale, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let lines = {
            let mut stmt = tx.prepare(
                "SELECT product_id, quantity, unit_price_cents FROM cart_items WHERE user_id = ?1 ORDER BY id",
            )?;
            let rows = stmt.query_map(params![user.get()], |row| {
                Ok(PricedLine {
                    product_id: ProductId(row.get(0)?),
                    quantity: quantity_col(row, 1)?,
                    unit_price: money_col(row, 2)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        if lines.is_empty() {
            return Err(StoreError::EmptyCart);
        }

        let sale = match write_sale(&tx, SaleOwner::User(user), &lines) {
            Ok(sale) => sale,
            Err(e) => {
                warn!(user_id = %user, error = %e, "checkout rejected");
                return Err(e);
            }
        };
        tx.execute("DELETE FROM cart_items WHERE user_id = ?1", params![user.get()])?;
        tx.commit()?;
        info!(user_id = %user, sale_id = %sale.id, total = %sale.total, "checkout completed");
        Ok(sale)
    }

    /// Records a counter sale for a client. The total is computed from the
    /// lines; lines without a unit price are charged the current price.
    pub fn record_sale(
        &self,
        client: ClientId,
        requested: &[SaleLineRequest],
    ) -> Result<Sale, StoreError> {
        if requested.is_empty() {
            return Err(StoreError::Invalid(
                "sale must contain at least one line".to_string(),
            ));
        }
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        if find_client(&tx, client)?.is_none() {
            return Err(StoreError::not_found("client"));
        }
        let mut lines = Vec::with_capacity(requested.len());
        for req in requested {
            let unit_price = match req.unit_price {
                Some(price) => price,
                None => {
                    find_product(&tx, req.product_id)?
                        .ok_or_else(|| {
                            StoreError::NotFound(format!("product {} not found", req.product_id))
                        })?
                        .price
                }
            };
            lines.push(PricedLine {
                product_id: req.product_id,
                quantity: req.quantity,
                unit_price,
            });
        }
        let sale = write_sale(&tx, SaleOwner::Client(client), &lines)?;
        tx.commit()?;
        info!(client_id = %client, sale_id = %sale.id, total = %sale.total, "counter sale recorded");
        Ok(sale)
    }

    /// All sales, newest first, each with its items.
    pub fn list_sales(&self) -> Result<Vec<Sale>, StoreError> {
        let conn = self.connect()?;
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY created_at DESC, id DESC");
        let mut sales = {
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map([], sale_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()?
        };
        let mut items = items_for_sales(&conn)?;
        for sale in &mut sales {
            sale.items = items.remove(&sale.id).unwrap_or_default();
        }
        Ok(sales)
    }

    pub fn sale_by_id(&self, id: SaleId) -> Result<Option<Sale>, StoreError> {
        let conn = self.connect()?;
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let Some(mut sale) = conn
            .query_row(&sql, params![id.get()], sale_from_row)
            .optional()?
        else {
            return Ok(None);
        };
        let mut stmt = conn.prepare(
            "SELECT id, product_id, quantity, unit_price_cents FROM sale_items WHERE sale_id = ?1 ORDER BY id",
        )?;
        sale.items = stmt
            .query_map(params![id.get()], |row| {
                Ok(SaleItem {
                    id: SaleItemId(row.get(0)?),
                    product_id: ProductId(row.get(1)?),
                    quantity: quantity_col(row, 2)?,
                    unit_price: money_col(row, 3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(sale))
    }

    /// Detail lines of one sale joined with product names.
    pub fn sale_lines(&self, id: SaleId) -> Result<Vec<SaleLine>, StoreError> {
        let conn = self.connect()?;
        let exists: Option<i64> = conn
            .query_row("SELECT id FROM sales WHERE id = ?1", params![id.get()], |row| {
                row.get(0)
            })
            .optional()?;
        if exists.is_none() {
            return Err(StoreError::not_found("sale"));
        }
        let mut stmt = conn.prepare(
            "SELECT p.name, si.quantity, si.unit_price_cents
             FROM sale_items si
             JOIN products p ON p.id = si.product_id
             WHERE si.sale_id = ?1
             ORDER BY si.id",
        )?;
        let rows = stmt
            .query_map(params![id.get()], |row| {
                Ok((row.get::<_, String>(0)?, quantity_col(row, 1)?, money_col(row, 2)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|(product_name, quantity, unit_price)| {
                let subtotal = unit_price.checked_mul(quantity).ok_or_else(|| {
                    StoreError::Invalid(format!("subtotal of {product_name} overflows"))
                })?;
                Ok(SaleLine {
                    product_name,
                    quantity,
                    unit_price,
                    subtotal,
                })
            })
            .collect()
    }
}
