#![forbid(unsafe_code)]
//! Domain vocabulary of the storefront: validated fields, money, and the
//! records the store persists and the API returns.

mod fields;
mod money;
mod records;

pub use fields::{
    normalize_optional_text, Email, PersonName, Phone, PostalCode, Quantity, ValidationError,
    EMAIL_MAX_LEN, NAME_MAX_LEN, NAME_MIN_LEN, PHONE_MAX_LEN, PHONE_MIN_LEN, POSTAL_CODE_MAX_LEN,
    POSTAL_CODE_MIN_LEN,
};
pub use money::Money;
pub use records::{
    Address, AddressField, Cart, CartItemId, CartLine, Client, ClientDraft, ClientId, NewUser,
    Product, ProductDraft, ProductId, ProfileChanges, Sale, SaleId, SaleItem, SaleItemId,
    SaleLine, SaleLineRequest, User, UserId,
};

pub const CRATE_NAME: &str = "tienda-model";
