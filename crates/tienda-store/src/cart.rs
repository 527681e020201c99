use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tienda_model::{Cart, CartItemId, CartLine, ProductId, Quantity, UserId};
use tracing::debug;

use crate::catalog::find_product;
use crate::rows::{money_col, quantity_col};
use crate::{Store, StoreError};

pub(crate) fn load_cart(conn: &Connection, user: UserId) -> Result<Cart, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT ci.id, ci.product_id, ci.quantity, ci.unit_price_cents, p.name, p.image_url, p.stock
         FROM cart_items ci
         LEFT JOIN products p ON p.id = ci.product_id
         WHERE ci.user_id = ?1
         ORDER BY ci.id",
    )?;
    let lines = stmt
        .query_map(params![user.get()], |row| {
            Ok(CartLine {
                id: CartItemId(row.get(0)?),
                product_id: ProductId(row.get(1)?),
                quantity: quantity_col(row, 2)?,
                unit_price: money_col(row, 3)?,
                name: row.get(4)?,
                image_url: row.get(5)?,
                stock: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Cart::from_lines(lines).map_err(|e| StoreError::Invalid(e.0))
}

fn existing_quantity(
    conn: &Connection,
    user: UserId,
    product: ProductId,
) -> Result<Option<u32>, StoreError> {
    Ok(conn
        .query_row(
            "SELECT quantity FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
            params![user.get(), product.get()],
            |row| row.get(0),
        )
        .optional()?)
}

impl Store {
    pub fn cart_for_user(&self, user: UserId) -> Result<Cart, StoreError> {
        load_cart(&self.connect()?, user)
    }

    /// Adds units of a product to the cart, merging with an existing line.
    /// A new line captures the product's current price. Refused when the
    /// resulting cart total would overflow.
    pub fn add_to_cart(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let product = find_product(&tx, product_id)?.ok_or_else(|| StoreError::not_found("product"))?;
        if product.stock < quantity.get() {
            return Err(StoreError::InsufficientStock("not enough stock".to_string()));
        }
        match existing_quantity(&tx, user, product_id)? {
            Some(current) => {
                let combined = current.saturating_add(quantity.get());
                if combined > product.stock {
                    return Err(StoreError::InsufficientStock(
                        "combined quantity exceeds available stock".to_string(),
                    ));
                }
                tx.execute(
                    "UPDATE cart_items SET quantity = ?1 WHERE user_id = ?2 AND product_id = ?3",
                    params![combined, user.get(), product_id.get()],
                )?;
            }
            None => {
                tx.execute(
                    "INSERT INTO cart_items (user_id, product_id, quantity, unit_price_cents)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        user.get(),
                        product_id.get(),
                        quantity.get(),
                        product.price.cents()
                    ],
                )?;
            }
        }
        let cart = load_cart(&tx, user)?;
        tx.commit()?;
        debug!(user_id = %user, product_id = %product_id, "cart line added");
        Ok(cart)
    }

    /// Replaces the quantity of an existing cart line. Refused when the
    /// resulting cart total would overflow.
    pub fn update_cart_item(
        &self,
        user: UserId,
        product_id: ProductId,
        quantity: Quantity,
    ) -> Result<Cart, StoreError> {
        let mut conn = self.connect()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let product = find_product(&tx, product_id)?.ok_or_else(|| StoreError::not_found("product"))?;
        if product.stock < quantity.get() {
            return Err(StoreError::InsufficientStock("not enough stock".to_string()));
        }
        if existing_quantity(&tx, user, product_id)?.is_none() {
            return Err(StoreError::not_found("cart item"));
        }
        tx.execute(
            "UPDATE cart_items SET quantity = ?1 WHERE user_id = ?2 AND product_id = ?3",
            params![quantity.get(), user.get(), product_id.get()],
        )?;
        let cart = load_cart(&tx, user)?;
        tx.commit()?;
        Ok(cart)
    }

    /// Removes a cart line; removing an absent line is not an error.
    pub fn remove_cart_item(&self, user: UserId, product_id: ProductId) -> Result<Cart, StoreError> {
        let conn = self.connect()?;
        conn.execute(
            "DELETE FROM cart_items WHERE user_id = ?1 AND product_id = ?2",
            params![user.get(), product_id.get()],
        )?;
        load_cart(&conn, user)
    }
}
