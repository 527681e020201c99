use crate::fields::{Email, PersonName, Phone, PostalCode, Quantity, ValidationError};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

macro_rules! row_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

row_id!(UserId);
row_id!(ProductId);
row_id!(ClientId);
row_id!(SaleId);
row_id!(CartItemId);
row_id!(SaleItemId);

/// Shipping and contact details a user may keep on their profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<PostalCode>,
    pub country: Option<String>,
    pub phone: Option<Phone>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub full_name: PersonName,
    pub email: Email,
    pub is_admin: bool,
    #[serde(flatten)]
    pub address: Address,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub full_name: PersonName,
    pub email: Email,
    pub password_hash: String,
    pub address: Address,
}

/// Free-text address fields a profile update may blank out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressField {
    Address,
    City,
    State,
    Country,
}

/// Partial profile update; `None` leaves the stored value untouched and
/// fields listed in `cleared` are reset to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub full_name: Option<PersonName>,
    pub email: Option<Email>,
    pub address: Address,
    pub cleared: Vec<AddressField>,
}

impl ProfileChanges {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none()
            && self.email.is_none()
            && self.address == Address::default()
            && self.cleared.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub image_url: Option<String>,
    pub size: Option<String>,
    pub category: Option<String>,
}

/// Field set used for both create and full-replace update of a product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub image_url: Option<String>,
    pub size: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: PersonName,
    pub email: Email,
    pub phone: Phone,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientDraft {
    pub name: PersonName,
    pub email: Email,
    pub phone: Phone,
    pub address: String,
}

/// One cart line as shown to its owner. Product details are `None` only when
/// the product row has vanished underneath the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub stock: Option<u32>,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Option<Money> {
        self.unit_price.checked_mul(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartLine>,
    pub total: Money,
}

impl Cart {
    /// Builds a cart view, totalling quantity times the captured unit price.
    /// Fails when a line or the total does not fit in `Money`.
    pub fn from_lines(items: Vec<CartLine>) -> Result<Self, ValidationError> {
        let mut total = Money::ZERO;
        for line in &items {
            total = line
                .line_total()
                .and_then(|subtotal| total.checked_add(subtotal))
                .ok_or_else(|| ValidationError("cart total overflows".to_string()))?;
        }
        Ok(Self { items, total })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: SaleItemId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Money,
}

/// A completed order. Storefront checkouts carry `user_id`; back-office sales
/// recorded for a walk-in client carry `client_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub created_at: DateTime<Utc>,
    pub total: Money,
    pub user_id: Option<UserId>,
    pub client_id: Option<ClientId>,
    pub items: Vec<SaleItem>,
}

/// Requested line of a back-office sale. Without an explicit unit price the
/// product's current price is charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleLineRequest {
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Option<Money>,
}

/// Detail row of a sale, joined with the product name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleLine {
    pub product_name: String,
    pub quantity: Quantity,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(price_cents: i64, qty: i64) -> CartLine {
        CartLine {
            id: CartItemId(1),
            product_id: ProductId(7),
            quantity: Quantity::new(qty).expect("qty"),
            unit_price: Money::from_cents(price_cents),
            name: Some("Camisa".to_string()),
            image_url: None,
            stock: Some(10),
        }
    }

    #[test]
    fn cart_total_uses_captured_unit_price() {
        let cart = Cart::from_lines(vec![line(1999, 2), line(500, 1)]).expect("cart");
        assert_eq!(cart.total.cents(), 4498);
        assert!(!cart.is_empty());
    }

    #[test]
    fn cart_total_overflow_is_an_error() {
        let err = Cart::from_lines(vec![line(1000, 1), line(i64::MAX / 2, 3)])
            .expect_err("line total overflows");
        assert_eq!(err.0, "cart total overflows");
        let sum_wraps = vec![line(i64::MAX / 2, 1), line(i64::MAX / 2, 1), line(2, 1)];
        assert!(Cart::from_lines(sum_wraps).is_err());
    }

    #[test]
    fn empty_profile_changes_are_detected() {
        assert!(ProfileChanges::default().is_empty());
        let clear_city = ProfileChanges {
            cleared: vec![AddressField::City],
            ..ProfileChanges::default()
        };
        assert!(!clear_city.is_empty());
        let changes = ProfileChanges {
            address: Address {
                city: Some("Puebla".to_string()),
                ..Address::default()
            },
            ..ProfileChanges::default()
        };
        assert!(!changes.is_empty());
    }

    #[test]
    fn user_serializes_address_fields_flat() {
        let user = User {
            id: UserId(3),
            full_name: PersonName::parse("Ana Perez").expect("name"),
            email: Email::parse("ana@tienda.mx").expect("email"),
            is_admin: false,
            address: Address {
                city: Some("Puebla".to_string()),
                ..Address::default()
            },
        };
        let value = serde_json::to_value(&user).expect("json");
        assert_eq!(value["city"], "Puebla");
        assert_eq!(value["email"], "ana@tienda.mx");
        assert_eq!(value["id"], 3);
    }
}
