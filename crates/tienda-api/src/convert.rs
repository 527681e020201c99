// SPDX-License-Identifier: Apache-2.0

//! Request validation: raw wire DTOs become model values, or a single
//! `ValidationFailed` error listing every offending field.

use tienda_model::{
    normalize_optional_text, Address, AddressField, ClientDraft, ClientId, Email, Money,
    PersonName, Phone, PostalCode, ProductDraft, ProductId, ProfileChanges, Quantity,
    SaleLineRequest, ValidationError,
};

use crate::dto::{
    AddressFields, ClientRequest, ProductRequest, ProfileUpdateRequest, RegisterRequest,
    SaleRequest,
};
use crate::{ApiError, FieldError};

pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 128;
pub const PRODUCT_NAME_MAX_LEN: usize = 200;

#[derive(Debug, Default)]
struct FieldErrors(Vec<FieldError>);

impl FieldErrors {
    fn check<T>(&mut self, field: &str, result: Result<T, ValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.0.push(FieldError::new(field, e.0));
                None
            }
        }
    }

    fn push(&mut self, field: &str, reason: impl Into<String>) {
        self.0.push(FieldError::new(field, reason));
    }

    fn finish(self) -> Result<(), ApiError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation_failed(self.0))
        }
    }
}

/// A provided value must parse, blank included; only an absent field is
/// skipped.
fn optional<T>(
    errors: &mut FieldErrors,
    field: &str,
    raw: Option<String>,
    parse: fn(&str) -> Result<T, ValidationError>,
) -> Option<T> {
    errors.check(field, parse(&raw?))
}

fn text(
    raw: Option<String>,
    field: AddressField,
    cleared: &mut Vec<AddressField>,
) -> Option<String> {
    let value = normalize_optional_text(Some(raw?));
    if value.is_none() {
        cleared.push(field);
    }
    value
}

/// Address fields plus the free-text ones sent blank.
fn address(errors: &mut FieldErrors, fields: AddressFields) -> (Address, Vec<AddressField>) {
    let mut cleared = Vec::new();
    let address = Address {
        address: text(fields.address, AddressField::Address, &mut cleared),
        city: text(fields.city, AddressField::City, &mut cleared),
        state: text(fields.state, AddressField::State, &mut cleared),
        postal_code: optional(errors, "postal_code", fields.postal_code, PostalCode::parse),
        country: text(fields.country, AddressField::Country, &mut cleared),
        phone: optional(errors, "phone", fields.phone, Phone::parse),
    };
    (address, cleared)
}

fn password(errors: &mut FieldErrors, raw: &str) {
    let len = raw.chars().count();
    if len < PASSWORD_MIN_LEN {
        errors.push(
            "password",
            format!("password must be at least {PASSWORD_MIN_LEN} characters"),
        );
    } else if len > PASSWORD_MAX_LEN {
        errors.push(
            "password",
            format!("password must be at most {PASSWORD_MAX_LEN} characters"),
        );
    }
}

/// A registration that passed validation; the password is still plain text
/// and must be hashed before it reaches the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub full_name: PersonName,
    pub email: Email,
    pub password: String,
    pub address: Address,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, ApiError> {
        let mut errors = FieldErrors::default();
        let full_name = errors.check("full_name", PersonName::parse(&self.full_name));
        let email = errors.check("email", Email::parse(&self.email));
        password(&mut errors, &self.password);
        let (address, _) = address(&mut errors, self.address);
        errors.finish()?;
        match (full_name, email) {
            (Some(full_name), Some(email)) => Ok(Registration {
                full_name,
                email,
                password: self.password,
                address,
            }),
            _ => Err(ApiError::validation_failed(Vec::new())),
        }
    }
}

impl ProfileUpdateRequest {
    pub fn validate(self) -> Result<ProfileChanges, ApiError> {
        let mut errors = FieldErrors::default();
        let full_name = match self.full_name {
            Some(raw) => errors.check("full_name", PersonName::parse(&raw)),
            None => None,
        };
        let email = match self.email {
            Some(raw) => errors.check("email", Email::parse(&raw)),
            None => None,
        };
        let (address, cleared) = address(&mut errors, self.address);
        errors.finish()?;
        Ok(ProfileChanges {
            full_name,
            email,
            address,
            cleared,
        })
    }
}

impl ProductRequest {
    pub fn validate(self) -> Result<ProductDraft, ApiError> {
        let mut errors = FieldErrors::default();
        let name = self.name.trim().to_string();
        if name.is_empty() {
            errors.push("name", "name must not be empty");
        } else if name.chars().count() > PRODUCT_NAME_MAX_LEN {
            errors.push(
                "name",
                format!("name exceeds max length {PRODUCT_NAME_MAX_LEN}"),
            );
        }
        let price = errors.check("price", Money::unit_price(self.price));
        let stock = match u32::try_from(self.stock) {
            Ok(stock) => Some(stock),
            Err(_) => {
                errors.push("stock", "stock must be between 0 and 4294967295");
                None
            }
        };
        errors.finish()?;
        match (price, stock) {
            (Some(price), Some(stock)) => Ok(ProductDraft {
                name,
                description: normalize_optional_text(self.description),
                price,
                stock,
                image_url: normalize_optional_text(self.image_url),
                size: normalize_optional_text(self.size),
                category: normalize_optional_text(self.category),
            }),
            _ => Err(ApiError::validation_failed(Vec::new())),
        }
    }
}

impl ClientRequest {
    pub fn validate(self) -> Result<ClientDraft, ApiError> {
        let mut errors = FieldErrors::default();
        let name = errors.check("name", PersonName::parse(&self.name));
        let email = errors.check("email", Email::parse(&self.email));
        let phone = errors.check("phone", Phone::parse(&self.phone));
        let address = self.address.trim().to_string();
        if address.is_empty() {
            errors.push("address", "address must not be empty");
        }
        errors.finish()?;
        match (name, email, phone) {
            (Some(name), Some(email), Some(phone)) => Ok(ClientDraft {
                name,
                email,
                phone,
                address,
            }),
            _ => Err(ApiError::validation_failed(Vec::new())),
        }
    }
}

impl SaleRequest {
    pub fn validate(self) -> Result<(ClientId, Vec<SaleLineRequest>), ApiError> {
        let mut errors = FieldErrors::default();
        if self.items.is_empty() {
            errors.push("items", "sale must contain at least one line");
        }
        let mut lines = Vec::with_capacity(self.items.len());
        for (i, item) in self.items.iter().enumerate() {
            let quantity = errors.check(&format!("items[{i}].quantity"), Quantity::new(item.quantity));
            let unit_price = match item.unit_price {
                Some(raw) => errors
                    .check(&format!("items[{i}].unit_price"), Money::unit_price(raw))
                    .map(Some),
                None => Some(None),
            };
            if let (Some(quantity), Some(unit_price)) = (quantity, unit_price) {
                lines.push(SaleLineRequest {
                    product_id: ProductId(item.product_id),
                    quantity,
                    unit_price,
                });
            }
        }
        errors.finish()?;
        Ok((ClientId(self.client_id), lines))
    }
}

/// Cart quantities outside `1..` are a plain bad request rather than a
/// field validation failure.
pub fn cart_quantity(raw: i64) -> Result<Quantity, ApiError> {
    Quantity::new(raw).map_err(|e| ApiError::invalid_request(e.0))
}
