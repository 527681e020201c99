#![allow(dead_code)]

use tempfile::TempDir;
use tienda_model::{
    Address, ClientDraft, Email, Money, NewUser, PersonName, Phone, Product, ProductDraft,
    Quantity, User,
};
use tienda_store::{Store, StoreConfig};

pub fn open_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Store::open(StoreConfig {
        path: dir.path().join("tienda.sqlite"),
        ..StoreConfig::default()
    })
    .expect("open store");
    (dir, store)
}

pub fn new_user(email: &str) -> NewUser {
    NewUser {
        full_name: PersonName::parse("Ana Perez").expect("name"),
        email: Email::parse(email).expect("email"),
        password_hash: "not-a-real-hash".to_string(),
        address: Address::default(),
    }
}

pub fn register(store: &Store, email: &str) -> User {
    store.create_user(&new_user(email)).expect("create user")
}

pub fn draft(name: &str, price_cents: i64, stock: u32) -> ProductDraft {
    ProductDraft {
        name: name.to_string(),
        description: Some(format!("{name} de algodon")),
        price: Money::from_cents(price_cents),
        stock,
        image_url: None,
        size: Some("M".to_string()),
        category: Some("camisas".to_string()),
    }
}

pub fn product(store: &Store, name: &str, price_cents: i64, stock: u32) -> Product {
    store
        .create_product(&draft(name, price_cents, stock))
        .expect("create product")
}

pub fn client_draft(email: &str) -> ClientDraft {
    ClientDraft {
        name: PersonName::parse("Luis Gomez").expect("name"),
        email: Email::parse(email).expect("email"),
        phone: Phone::parse("+52 222 555 0101").expect("phone"),
        address: "Av. Reforma 10".to_string(),
    }
}

pub fn qty(n: i64) -> Quantity {
    Quantity::new(n).expect("quantity")
}
