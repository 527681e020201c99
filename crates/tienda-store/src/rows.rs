use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use tienda_model::{
    Address, Client, ClientId, Email, Money, PersonName, Phone, PostalCode, Product, ProductId,
    Quantity, User, UserId, ValidationError,
};

pub(crate) const USER_COLUMNS: &str =
    "id, full_name, email, is_admin, address, city, state, postal_code, country, phone";
pub(crate) const PRODUCT_COLUMNS: &str =
    "id, name, description, price_cents, stock, image_url, size, category";
pub(crate) const CLIENT_COLUMNS: &str = "id, name, email, phone, address";

fn invalid_column(idx: usize, err: ValidationError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

pub(crate) fn parse_col<T>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, ValidationError>,
) -> rusqlite::Result<T> {
    let raw: String = row.get(idx)?;
    parse(&raw).map_err(|e| invalid_column(idx, e))
}

pub(crate) fn parse_opt_col<T>(
    row: &Row<'_>,
    idx: usize,
    parse: impl FnOnce(&str) -> Result<T, ValidationError>,
) -> rusqlite::Result<Option<T>> {
    let raw: Option<String> = row.get(idx)?;
    raw.as_deref()
        .map(parse)
        .transpose()
        .map_err(|e| invalid_column(idx, e))
}

pub(crate) fn quantity_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Quantity> {
    let raw: i64 = row.get(idx)?;
    Quantity::new(raw).map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

pub(crate) fn money_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Money> {
    row.get::<_, i64>(idx).map(Money::from_cents)
}

pub(crate) fn timestamp_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: UserId(row.get(0)?),
        full_name: parse_col(row, 1, PersonName::parse)?,
        email: parse_col(row, 2, Email::parse)?,
        is_admin: row.get(3)?,
        address: Address {
            address: row.get(4)?,
            city: row.get(5)?,
            state: row.get(6)?,
            postal_code: parse_opt_col(row, 7, PostalCode::parse)?,
            country: row.get(8)?,
            phone: parse_opt_col(row, 9, Phone::parse)?,
        },
    })
}

pub(crate) fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: ProductId(row.get(0)?),
        name: row.get(1)?,
        description: row.get(2)?,
        price: money_col(row, 3)?,
        stock: row.get(4)?,
        image_url: row.get(5)?,
        size: row.get(6)?,
        category: row.get(7)?,
    })
}

pub(crate) fn client_from_row(row: &Row<'_>) -> rusqlite::Result<Client> {
    Ok(Client {
        id: ClientId(row.get(0)?),
        name: parse_col(row, 1, PersonName::parse)?,
        email: parse_col(row, 2, Email::parse)?,
        phone: parse_col(row, 3, Phone::parse)?,
        address: row.get(4)?,
    })
}
